//! Pure functions over key material: no device access, no I/O

mod key_identifier;
mod private_key;

pub use key_identifier::{derive_ski, key_record, public_key_der, public_key_hash};
pub use private_key::public_der_of_private;
