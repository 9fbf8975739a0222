//! Algorithm, container and key tags used on GM/T 0016 tokens

use thiserror::Error;

/// Key type a container reports for the keys it holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerType {
    /// Created, no keypair generated or imported yet
    Empty,
    Rsa,
    Ecc,
}

impl ContainerType {
    pub fn from_tag(tag: u32) -> Result<Self, AlgorithmError> {
        match tag {
            0 => Ok(ContainerType::Empty),
            1 => Ok(ContainerType::Rsa),
            2 => Ok(ContainerType::Ecc),
            _ => Err(AlgorithmError::UnknownContainerType { tag }),
        }
    }

    pub fn tag(self) -> u32 {
        match self {
            ContainerType::Empty => 0,
            ContainerType::Rsa => 1,
            ContainerType::Ecc => 2,
        }
    }
}

/// Key type tag carried as the first byte of a key identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Rsa,
    Ecc,
    Aes,
}

impl KeyType {
    pub fn tag(self) -> u8 {
        match self {
            KeyType::Rsa => 1,
            KeyType::Ecc => 2,
            KeyType::Aes => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, AlgorithmError> {
        match tag {
            1 => Ok(KeyType::Rsa),
            2 => Ok(KeyType::Ecc),
            3 => Ok(KeyType::Aes),
            _ => Err(AlgorithmError::UnknownKeyType { tag }),
        }
    }
}

/// Which of the container's two keypairs a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyUsage {
    Encrypt,
    Sign,
}

impl KeyUsage {
    pub fn tag(self) -> u8 {
        match self {
            KeyUsage::Encrypt => 0,
            KeyUsage::Sign => 1,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, AlgorithmError> {
        match tag {
            0 => Ok(KeyUsage::Encrypt),
            1 => Ok(KeyUsage::Sign),
            _ => Err(AlgorithmError::UnknownKeyUsage { tag }),
        }
    }

    pub fn from_sign_flag(sign: bool) -> Self {
        if sign {
            KeyUsage::Sign
        } else {
            KeyUsage::Encrypt
        }
    }

    pub fn is_sign(self) -> bool {
        self == KeyUsage::Sign
    }
}

/// Symmetric algorithm identifiers (`SGD_*`) accepted for session keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymmetricAlgorithm {
    Sm1Ecb,
    Sm1Cbc,
    Ssf33Ecb,
    Ssf33Cbc,
    Sm4Ecb,
    Sm4Cbc,
}

impl SymmetricAlgorithm {
    pub fn id(self) -> u32 {
        match self {
            SymmetricAlgorithm::Sm1Ecb => 0x0000_0101,
            SymmetricAlgorithm::Sm1Cbc => 0x0000_0102,
            SymmetricAlgorithm::Ssf33Ecb => 0x0000_0201,
            SymmetricAlgorithm::Ssf33Cbc => 0x0000_0202,
            SymmetricAlgorithm::Sm4Ecb => 0x0000_0401,
            SymmetricAlgorithm::Sm4Cbc => 0x0000_0402,
        }
    }

    pub fn from_id(id: u32) -> Result<Self, AlgorithmError> {
        match id {
            0x0000_0101 => Ok(SymmetricAlgorithm::Sm1Ecb),
            0x0000_0102 => Ok(SymmetricAlgorithm::Sm1Cbc),
            0x0000_0201 => Ok(SymmetricAlgorithm::Ssf33Ecb),
            0x0000_0202 => Ok(SymmetricAlgorithm::Ssf33Cbc),
            0x0000_0401 => Ok(SymmetricAlgorithm::Sm4Ecb),
            0x0000_0402 => Ok(SymmetricAlgorithm::Sm4Cbc),
            _ => Err(AlgorithmError::UnsupportedSymmetric { id }),
        }
    }
}

/// Errors that can occur when decoding algorithm tags
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlgorithmError {
    #[error("Unknown container type: {tag}")]
    UnknownContainerType { tag: u32 },

    #[error("Unknown key type tag: {tag}")]
    UnknownKeyType { tag: u8 },

    #[error("Unknown key usage tag: {tag}")]
    UnknownKeyUsage { tag: u8 },

    #[error("Symmetric algorithm not supported: 0x{id:08x}")]
    UnsupportedSymmetric { id: u32 },
}
