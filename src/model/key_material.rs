use std::fmt;
use zeroize::Zeroizing;

/// Maximum modulus buffer of an RSA public key blob, in bytes
pub const MAX_RSA_MODULUS_LEN: usize = 256;

/// Exponent buffer of an RSA public key blob, in bytes
pub const MAX_RSA_EXPONENT_LEN: usize = 4;

/// RSA public key exactly as the token hands it out
///
/// `modulus` and `public_exponent` are big-endian unsigned magnitudes and may
/// carry leading zero padding (tokens fill a fixed-size buffer).
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPublicKeyBlob {
    pub bit_len: u32,
    pub modulus: Vec<u8>,
    pub public_exponent: Vec<u8>,
}

impl RsaPublicKeyBlob {
    pub fn new(bit_len: u32, modulus: Vec<u8>, public_exponent: Vec<u8>) -> Self {
        Self {
            bit_len,
            modulus,
            public_exponent,
        }
    }
}

impl fmt::Debug for RsaPublicKeyBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = &self.modulus[..self.modulus.len().min(8)];
        write!(
            f,
            "RsaPublicKeyBlob {{ bits: {}, modulus: {}.., exponent: {} }}",
            self.bit_len,
            hex::encode(head),
            hex::encode(&self.public_exponent)
        )
    }
}

/// DER encoded SubjectPublicKeyInfo of an RSA public key
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKeyDer(Vec<u8>);

impl PublicKeyDer {
    pub fn new(der: Vec<u8>) -> Self {
        Self(der)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for PublicKeyDer {
    fn from(der: Vec<u8>) -> Self {
        Self(der)
    }
}

impl fmt::Debug for PublicKeyDer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKeyDer({} bytes)", self.0.len())
    }
}

/// DER encoded RSA private key (PKCS#1 or PKCS#8), wiped on drop
#[derive(Clone)]
pub struct PrivateKeyDer(Zeroizing<Vec<u8>>);

impl PrivateKeyDer {
    pub fn new(der: Vec<u8>) -> Self {
        Self(Zeroizing::new(der))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for PrivateKeyDer {
    fn from(der: Vec<u8>) -> Self {
        Self::new(der)
    }
}

impl fmt::Debug for PrivateKeyDer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKeyDer([REDACTED])")
    }
}
