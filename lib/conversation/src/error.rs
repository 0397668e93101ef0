//! Error types for the conversation crate.
//!
//! Storage errors never reach the user: the message store logs them and
//! keeps serving its in-memory state.

use std::fmt;

/// Errors from durable storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Reading a key failed.
    ReadFailed { key: String, reason: String },
    /// Writing a key failed.
    WriteFailed { key: String, reason: String },
    /// Removing a key failed.
    RemoveFailed { key: String, reason: String },
    /// The stored value could not be decoded.
    Corrupt { key: String, reason: String },
    /// The in-memory value could not be encoded.
    EncodeFailed { key: String, reason: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { key, reason } => {
                write!(f, "failed to read storage key '{key}': {reason}")
            }
            Self::WriteFailed { key, reason } => {
                write!(f, "failed to write storage key '{key}': {reason}")
            }
            Self::RemoveFailed { key, reason } => {
                write!(f, "failed to remove storage key '{key}': {reason}")
            }
            Self::Corrupt { key, reason } => {
                write!(f, "stored value for '{key}' is corrupt: {reason}")
            }
            Self::EncodeFailed { key, reason } => {
                write!(f, "failed to encode value for '{key}': {reason}")
            }
        }
    }
}

impl std::error::Error for StorageError {}
