//! Key identifier derivation
//!
//! A key is known to callers only by its [`Ski`], never by a container
//! handle. Identical (key type, container name, usage, public key) input
//! always yields the identical identifier.

use rsa::pkcs8::EncodePublicKey;
use rsa::{BigUint, RsaPublicKey};
use sha1::{Digest, Sha1};

use crate::error::EncodingError;
use crate::model::{KeyRecord, KeyType, KeyUsage, PublicKeyDer, RsaPublicKeyBlob, Ski};

/// DER encoded SubjectPublicKeyInfo for an RSA modulus and exponent
///
/// Both inputs are read as unsigned big-endian magnitudes, so leading zero
/// padding and a set high bit on the first modulus byte are both fine.
pub fn public_key_der(modulus: &[u8], exponent: &[u8]) -> Result<PublicKeyDer, EncodingError> {
    if modulus.iter().all(|b| *b == 0) {
        return Err(EncodingError::InvalidPublicKey {
            reason: "modulus is zero".to_string(),
        });
    }
    if exponent.iter().all(|b| *b == 0) {
        return Err(EncodingError::InvalidPublicKey {
            reason: "public exponent is zero".to_string(),
        });
    }

    let n = BigUint::from_bytes_be(modulus);
    let e = BigUint::from_bytes_be(exponent);
    let key = RsaPublicKey::new(n, e).map_err(|e| EncodingError::InvalidPublicKey {
        reason: e.to_string(),
    })?;

    let der = key
        .to_public_key_der()
        .map_err(|e| EncodingError::PublicKeyDer {
            reason: e.to_string(),
        })?;
    Ok(PublicKeyDer::new(der.into_vec()))
}

/// SHA-1 of the DER public key
pub fn public_key_hash(der: &PublicKeyDer) -> [u8; 20] {
    Sha1::digest(der.as_bytes()).into()
}

pub fn derive_ski(
    key_type: KeyType,
    container_name: &str,
    usage: KeyUsage,
    der: &PublicKeyDer,
) -> Ski {
    Ski::from_parts(key_type, container_name, usage, &public_key_hash(der))
}

/// DER and identifier of an RSA public key exported from `container_name`
pub fn key_record(
    container_name: &str,
    usage: KeyUsage,
    blob: &RsaPublicKeyBlob,
) -> Result<KeyRecord, EncodingError> {
    let der = public_key_der(&blob.modulus, &blob.public_exponent)?;
    let ski = derive_ski(KeyType::Rsa, container_name, usage, &der);
    Ok(KeyRecord::new(ski, der))
}
