//! Key identifiers and the records handed back to callers

use std::fmt;

use crate::error::EncodingError;
use crate::model::{KeyType, KeyUsage, PublicKeyDer};

/// Length of the SHA-1 public key hash at the end of an identifier
pub const PUBLIC_KEY_HASH_LEN: usize = 20;

/// Subject key identifier for a public key held on the token
///
/// Layout: `key_type (1) || container name (UTF-8) || usage (1) || SHA-1(DER) (20)`.
/// The fixed-width head and tail make the name recoverable without a length
/// prefix. Identifiers are persisted by callers, so this layout must not change.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ski(Vec<u8>);

impl Ski {
    const MIN_LEN: usize = 1 + 1 + PUBLIC_KEY_HASH_LEN;

    pub(crate) fn from_parts(
        key_type: KeyType,
        container_name: &str,
        usage: KeyUsage,
        hash: &[u8],
    ) -> Self {
        let mut bytes = Vec::with_capacity(Self::MIN_LEN + container_name.len());
        bytes.push(key_type.tag());
        bytes.extend_from_slice(container_name.as_bytes());
        bytes.push(usage.tag());
        bytes.extend_from_slice(hash);
        Self(bytes)
    }

    /// Wrap identifier bytes previously obtained from [`Ski::as_bytes`]
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, EncodingError> {
        if bytes.len() < Self::MIN_LEN
            || KeyType::from_tag(bytes[0]).is_err()
            || KeyUsage::from_tag(bytes[bytes.len() - PUBLIC_KEY_HASH_LEN - 1]).is_err()
            || std::str::from_utf8(&bytes[1..bytes.len() - PUBLIC_KEY_HASH_LEN - 1]).is_err()
        {
            return Err(EncodingError::MalformedSki { len: bytes.len() });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn key_type(&self) -> KeyType {
        // validated on construction
        KeyType::from_tag(self.0[0]).unwrap_or(KeyType::Rsa)
    }

    pub fn container_name(&self) -> &str {
        let end = self.0.len() - PUBLIC_KEY_HASH_LEN - 1;
        std::str::from_utf8(&self.0[1..end]).unwrap_or_default()
    }

    pub fn usage(&self) -> KeyUsage {
        let tag = self.0[self.0.len() - PUBLIC_KEY_HASH_LEN - 1];
        KeyUsage::from_tag(tag).unwrap_or(KeyUsage::Encrypt)
    }

    pub fn public_key_hash(&self) -> &[u8] {
        &self.0[self.0.len() - PUBLIC_KEY_HASH_LEN..]
    }
}

impl fmt::Display for Ski {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for Ski {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ski({:?}/{}/{:?}/{})",
            self.key_type(),
            self.container_name(),
            self.usage(),
            hex::encode(self.public_key_hash())
        )
    }
}

/// Public half of a token-held key: its identifier and DER encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    pub ski: Ski,
    pub public_der: PublicKeyDer,
}

impl KeyRecord {
    pub fn new(ski: Ski, public_der: PublicKeyDer) -> Self {
        Self { ski, public_der }
    }
}
