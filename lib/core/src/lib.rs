//! Core types shared by the palaver crates.
//!
//! This crate provides the strongly-typed identifiers, the identity key used
//! to partition message history, and the rootcause-based `Result` alias.

pub mod error;
pub mod id;
pub mod identity;

pub use error::Result;
pub use id::{MessageId, ParseIdError};
pub use identity::{ANONYMOUS_KEY, IdentityKey};
