//! Language-model backend adapters for palaver.
//!
//! The chat widget talks to its language model through one opaque operation,
//! [`ChatBackend::send_message`], which either yields the complete reply or a
//! classified [`BackendError`]. This crate provides:
//!
//! - **Backend trait**: The adapter contract and the [`BackendSlot`] holding
//!   either a ready adapter or the reason it failed to initialize
//! - **Error classification**: Fixed user-facing text for every failure kind
//! - **Adapters**: An OpenAI-compatible HTTP adapter and an offline canned one

pub mod backend;
pub mod canned;
pub mod error;
pub mod openai;

pub use backend::{BackendSlot, ChatBackend, ContextWindow, Turn, TurnRole};
pub use canned::CannedBackend;
pub use error::{BackendError, BackendErrorKind, BackendInitError};
pub use openai::{OpenAiBackend, OpenAiConfig};
