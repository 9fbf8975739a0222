use crate::model::{BlockCipherParam, Pin, UserType};

/// Settings shared by every operation of a key manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    /// User the PIN is verified for
    pub user_type: UserType,
    /// PIN presented before generate, import and sign
    pub pin: Pin,
    /// Bytes of device randomness behind each import session key
    pub session_key_len: usize,
    /// Cipher context used to encrypt the private key under the session key
    pub cipher_param: BlockCipherParam,
    /// Modulus size used by [`crate::RsaKeyManager::generate_default`]
    pub default_bits: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            user_type: UserType::User,
            pin: Pin::default(),
            session_key_len: 16,
            cipher_param: BlockCipherParam::default(),
            default_bits: 2048,
        }
    }
}

impl TokenConfig {
    pub fn with_pin(pin: Pin) -> Self {
        Self {
            pin,
            ..Self::default()
        }
    }
}
