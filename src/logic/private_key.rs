use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;

use crate::error::EncodingError;
use crate::logic::public_key_der;
use crate::model::{PrivateKeyDer, PublicKeyDer};

/// Public key DER matching a PKCS#1 or PKCS#8 RSA private key
///
/// Goes through [`public_key_der`] so the result is byte-comparable with
/// DER computed from a token's exported public key.
pub fn public_der_of_private(der: &PrivateKeyDer) -> Result<PublicKeyDer, EncodingError> {
    let key = RsaPrivateKey::from_pkcs1_der(der.as_bytes())
        .or_else(|_| RsaPrivateKey::from_pkcs8_der(der.as_bytes()))
        .map_err(|e| EncodingError::PrivateKeyDer {
            reason: e.to_string(),
        })?;

    public_key_der(&key.n().to_bytes_be(), &key.e().to_bytes_be())
}
