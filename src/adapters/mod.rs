//! Adapters - concrete implementations of ports (traits)
//!
//! Real token drivers live outside this crate and implement
//! [`crate::ports::SkfDevice`] themselves.

#[cfg(test)]
pub mod soft_token;
