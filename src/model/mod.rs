//! Domain types for token key operations
//!
//! These wrap primitives so that invariants (PIN length, tag values, secret
//! redaction and wiping) hold from construction onwards.

mod algorithm;
mod cipher_param;
mod config;
mod key_material;
mod pin;
mod ski;

pub use algorithm::{AlgorithmError, ContainerType, KeyType, KeyUsage, SymmetricAlgorithm};
pub use cipher_param::{BlockCipherParam, CipherParamError, PADDING_PKCS5};
pub use config::TokenConfig;
pub use key_material::{
    PrivateKeyDer, PublicKeyDer, RsaPublicKeyBlob, MAX_RSA_EXPONENT_LEN, MAX_RSA_MODULUS_LEN,
};
pub use pin::{Pin, PinError, UserType};
pub use ski::{KeyRecord, Ski, PUBLIC_KEY_HASH_LEN};
