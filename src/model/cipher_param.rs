use thiserror::Error;

/// Padding type value selecting PKCS#5 padding
pub const PADDING_PKCS5: u32 = 1;

/// Parameters for a symmetric block cipher context on the token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCipherParam {
    iv: [u8; Self::MAX_IV_LEN],
    iv_len: usize,
    pub padding_type: u32,
    pub feed_bit_len: u32,
}

impl BlockCipherParam {
    pub const MAX_IV_LEN: usize = 32;

    /// Zero IV of `iv_len` bytes
    pub fn new(iv_len: usize, padding_type: u32) -> Result<Self, CipherParamError> {
        Self::with_iv(&vec![0u8; iv_len], padding_type)
    }

    pub fn with_iv(iv: &[u8], padding_type: u32) -> Result<Self, CipherParamError> {
        if iv.len() > Self::MAX_IV_LEN {
            return Err(CipherParamError::IvTooLong { len: iv.len() });
        }
        let mut buf = [0u8; Self::MAX_IV_LEN];
        buf[..iv.len()].copy_from_slice(iv);
        Ok(Self {
            iv: buf,
            iv_len: iv.len(),
            padding_type,
            feed_bit_len: 0,
        })
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv[..self.iv_len]
    }

    pub fn iv_len(&self) -> usize {
        self.iv_len
    }

    pub fn is_padded(&self) -> bool {
        self.padding_type == PADDING_PKCS5
    }
}

impl Default for BlockCipherParam {
    /// PKCS#5 padding with a 16-byte zero IV
    fn default() -> Self {
        Self {
            iv: [0u8; Self::MAX_IV_LEN],
            iv_len: 16,
            padding_type: PADDING_PKCS5,
            feed_bit_len: 0,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherParamError {
    #[error("IV must be at most {max} bytes, got {len}", max = BlockCipherParam::MAX_IV_LEN)]
    IvTooLong { len: usize },
}
