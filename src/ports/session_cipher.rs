//! SessionCipher trait - capability to run symmetric encryption on the token

use crate::error::DriverResult;
use crate::model::{BlockCipherParam, SymmetricAlgorithm};

/// Opaque handle of a session key loaded into the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKeyHandle(pub u64);

/// Capability to load a plaintext session key and encrypt under it
pub trait SessionCipher {
    fn set_symm_key(
        &mut self,
        key: &[u8],
        algorithm: SymmetricAlgorithm,
    ) -> DriverResult<SessionKeyHandle>;

    fn encrypt_init(
        &mut self,
        handle: SessionKeyHandle,
        param: &BlockCipherParam,
    ) -> DriverResult<()>;

    fn encrypt(&mut self, handle: SessionKeyHandle, plaintext: &[u8]) -> DriverResult<Vec<u8>>;

    /// Destroy the session key; the handle is invalid afterwards
    fn close_handle(&mut self, handle: SessionKeyHandle) -> DriverResult<()>;
}
