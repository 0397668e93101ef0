//! Conversation history for palaver.
//!
//! This crate provides:
//!
//! - **Messages**: The chat message model and its single permitted mutation
//! - **Storage**: Durable key/value capability with memory and file backends
//! - **Message Store**: Bounded, persisted, per-identity ordered logs

pub mod error;
pub mod message;
pub mod storage;
pub mod store;

pub use error::StorageError;
pub use message::{Message, MessagePatch, MessageRole};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{DEFAULT_HISTORY_LIMIT, DEFAULT_MESSAGES_KEY, MessageStore};
