//! Use cases (orchestration)
//!
//! One function per key manager operation. Each verifies the PIN where the
//! operation needs it, resolves the container through the registry, drives
//! the device and derives the identifier of the key it touched. Container
//! and session key handles are held by guards, so they are released on
//! every exit path.

mod fetch_key;
mod generate_key;
mod import_key;
mod sign;
mod verify;

pub use fetch_key::fetch_key;
pub use generate_key::generate_key;
pub use import_key::import_key;
pub use sign::sign;
pub use verify::verify;
