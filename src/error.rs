//! Error types for skfkey
//!
//! Two layers live here. [`DriverError`] is what the device boundary reports:
//! a GM/T 0016 status code plus a driver-level kind that singles out the
//! "no container yet" signal. [`KeyError`] is the taxonomy callers of the
//! key manager see; every driver failure is converted into it before it
//! leaves the crate.

use crate::model::ContainerType;
use thiserror::Error;

/// Result type alias for key lifecycle operations
pub type KeyResult<T> = Result<T, KeyError>;

/// Result type alias for calls across the device boundary
pub type DriverResult<T> = Result<T, DriverError>;

/// GM/T 0016 status codes (`SAR_*`) used by this crate
pub mod sar {
    pub const OK: u32 = 0x0000_0000;
    pub const FAIL: u32 = 0x0A00_0001;
    pub const INVALID_HANDLE: u32 = 0x0A00_0005;
    pub const INVALID_PARAM: u32 = 0x0A00_0006;
    pub const NAME_LEN: u32 = 0x0A00_0009;
    pub const MODULUS_LEN: u32 = 0x0A00_000B;
    pub const IN_DATA: u32 = 0x0A00_0011;
    pub const RSA_DEC: u32 = 0x0A00_0019;
    pub const KEY_NOT_FOUND: u32 = 0x0A00_001B;
    pub const PIN_INCORRECT: u32 = 0x0A00_0024;
    pub const PIN_LOCKED: u32 = 0x0A00_0025;
    pub const USER_NOT_LOGGED_IN: u32 = 0x0A00_002D;
    pub const FILE_ALREADY_EXIST: u32 = 0x0A00_002F;
}

/// Driver-level classification of a device failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// The application holds no container at all yet
    NoContainer,
    /// Any other failure; the status code tells which
    Failure,
}

/// Failure reported by the device boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("device status 0x{code:08x}: {message}")]
pub struct DriverError {
    pub code: u32,
    pub kind: DriverErrorKind,
    pub message: String,
}

impl DriverError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: DriverErrorKind::Failure,
            message: message.into(),
        }
    }

    pub fn no_container(message: impl Into<String>) -> Self {
        Self {
            code: sar::OK,
            kind: DriverErrorKind::NoContainer,
            message: message.into(),
        }
    }

    pub fn is_no_container(&self) -> bool {
        self.kind == DriverErrorKind::NoContainer
    }

    /// [`KeyError::Device`] naming the device call that failed
    pub fn into_key_error(self, call: &'static str) -> KeyError {
        KeyError::Device {
            code: self.code,
            reason: format!("{call} failed: {}", self.message),
        }
    }
}

/// Point of the import protocol at which the public key comparison failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    /// Host-side check of the private key against the expected public key
    PreImport,
    /// Re-exported public key after the token accepted the import
    PostImport,
}

/// Top-level error type for all key lifecycle operations
#[derive(Error, Debug)]
pub enum KeyError {
    /// The device reported a failure unrelated to container absence
    #[error("Device error 0x{code:08x}: {reason}")]
    Device { code: u32, reason: String },

    /// The named container does not exist and was not created
    #[error("Container not found: {name}")]
    ContainerNotFound { name: String },

    /// The container holds a different key type than the operation needs
    #[error("Container {name} holds {actual:?} keys, expected {expected:?}")]
    AlgorithmMismatch {
        name: String,
        expected: ContainerType,
        actual: ContainerType,
    },

    /// The imported key does not match the expected public key
    #[error("Imported key for container {name} does not match the expected public key ({stage:?})")]
    ImportVerificationFailed { name: String, stage: ImportStage },

    /// DER construction or decoding failed
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

impl KeyError {
    /// Device status code carried by the error, if it came from the token
    pub fn device_code(&self) -> Option<u32> {
        match self {
            KeyError::Device { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Encoding errors on host-side key material
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Modulus and exponent do not form a usable RSA public key
    #[error("Invalid RSA public key components: {reason}")]
    InvalidPublicKey { reason: String },

    /// Public key could not be DER encoded
    #[error("Failed to encode public key: {reason}")]
    PublicKeyDer { reason: String },

    /// Private key bytes are neither PKCS#1 nor PKCS#8 RSA
    #[error("Invalid private key DER: {reason}")]
    PrivateKeyDer { reason: String },

    /// Identifier bytes are too short to carry the fixed fields
    #[error("Malformed key identifier: {len} bytes")]
    MalformedSki { len: usize },
}

/// Converts driver results into [`KeyResult`], naming the failed call
pub trait DeviceCall<T> {
    fn during(self, call: &'static str) -> KeyResult<T>;
}

impl<T> DeviceCall<T> for DriverResult<T> {
    fn during(self, call: &'static str) -> KeyResult<T> {
        self.map_err(|err| err.into_key_error(call))
    }
}
