//! Ports (traits) for the token's device session
//!
//! These traits are the boundary this crate consumes: PIN verification,
//! container management, randomness, symmetric and RSA primitives. The core
//! depends on these abstractions, never on a concrete driver. A session is
//! assumed to be bound to one device and one opened application.

mod container_manager;
mod pin_verifier;
mod random_source;
mod rsa_operations;
mod session_cipher;

pub use container_manager::{ContainerHandle, ContainerManager};
pub use pin_verifier::PinVerifier;
pub use random_source::RandomSource;
pub use rsa_operations::RsaOperations;
pub use session_cipher::{SessionCipher, SessionKeyHandle};

/// Combined trait for all device session operations
///
/// A driver session handle typically implements this.
pub trait SkfDevice:
    PinVerifier + ContainerManager + RandomSource + SessionCipher + RsaOperations
{
}

// Blanket implementation for types that implement all operation traits
impl<T> SkfDevice for T where
    T: PinVerifier + ContainerManager + RandomSource + SessionCipher + RsaOperations
{
}
