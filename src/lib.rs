//! RSA key lifecycle on GM/T 0016 (SKF) smart-card tokens
//!
//! The crate drives a token through the [`ports`] traits, which a driver
//! session implements. On top of them it offers:
//!
//! - a container registry that finds or creates named containers and always
//!   closes their handles
//! - key identifiers derived from the public key DER, container name and usage
//! - import of an RSA private key under a token-wrapped session key, checked
//!   against the expected public key before and after the import
//! - [`RsaKeyManager`], exposing generate / import / fetch / sign / verify
//!
//! ```no_run
//! # fn demo<D: skfkey::ports::SkfDevice>(session: D) -> skfkey::KeyResult<()> {
//! use skfkey::{model::TokenConfig, RsaKeyManager};
//!
//! let mut manager = RsaKeyManager::new(session, TokenConfig::default());
//! let record = manager.generate_default("signer")?;
//! let signature = manager.sign("signer", &[0u8; 32])?;
//! assert!(manager.verify("signer", &[0u8; 32], &signature)?);
//! println!("{}", record.ski);
//! # Ok(())
//! # }
//! ```

mod adapters;
pub mod error;
pub mod logic;
mod manager;
pub mod model;
pub mod ports;
pub mod registry;
pub mod transport;
pub mod use_cases;

// Re-export commonly used types
pub use error::{KeyError, KeyResult};
pub use manager::RsaKeyManager;
pub use model::{KeyRecord, Ski};
