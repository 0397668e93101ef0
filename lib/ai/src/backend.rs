//! Backend adapter abstraction.
//!
//! Every language-model provider is reached through [`ChatBackend`]: one
//! message in, one complete reply out. Retries, authentication and timeouts
//! belong to the adapter, not to its callers.

use crate::error::{BackendError, BackendInitError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Default number of turns an adapter remembers.
pub const DEFAULT_CONTEXT_TURNS: usize = 10;

/// Trait for language-model backends.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends the user's text and waits for the complete reply.
    ///
    /// # Errors
    ///
    /// Returns a classified error if the round trip fails.
    async fn send_message(&self, text: &str) -> Result<String, BackendError>;

    /// Returns a short name for logs.
    fn name(&self) -> &str;
}

/// The speaker of a remembered turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The user.
    User,
    /// The assistant.
    Assistant,
}

/// One remembered turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who spoke.
    pub role: TurnRole,
    /// What was said.
    pub content: String,
}

/// Rolling window of recent turns sent along with each request.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    turns: VecDeque<Turn>,
    capacity: usize,
}

impl ContextWindow {
    /// Creates an empty window holding at most `capacity` turns.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records a completed exchange, dropping the oldest turns past capacity.
    pub fn record_exchange(&mut self, user: &str, assistant: &str) {
        self.turns.push_back(Turn {
            role: TurnRole::User,
            content: user.to_string(),
        });
        self.turns.push_back(Turn {
            role: TurnRole::Assistant,
            content: assistant.to_string(),
        });
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
    }

    /// Returns the remembered turns, oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Returns the number of remembered turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Forgets every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_TURNS)
    }
}

/// The backend a widget sends through, or why there is none.
#[derive(Clone)]
pub enum BackendSlot {
    /// A constructed adapter.
    Ready(Arc<dyn ChatBackend>),
    /// The adapter failed to initialize; sends are permanently refused.
    Unavailable {
        /// Why initialization failed.
        reason: String,
    },
}

impl BackendSlot {
    /// Wraps a constructed adapter.
    #[must_use]
    pub fn ready(backend: impl ChatBackend + 'static) -> Self {
        Self::Ready(Arc::new(backend))
    }

    /// Builds a slot from the outcome of adapter construction.
    #[must_use]
    pub fn from_init<B>(result: Result<B, BackendInitError>) -> Self
    where
        B: ChatBackend + 'static,
    {
        match result {
            Ok(backend) => Self::ready(backend),
            Err(e) => Self::Unavailable {
                reason: e.to_string(),
            },
        }
    }

    /// Returns the adapter if it is ready.
    #[must_use]
    pub fn backend(&self) -> Option<&Arc<dyn ChatBackend>> {
        match self {
            Self::Ready(backend) => Some(backend),
            Self::Unavailable { .. } => None,
        }
    }

    /// Returns the initialization failure, if any.
    #[must_use]
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }
}

impl fmt::Debug for BackendSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(backend) => f.debug_tuple("Ready").field(&backend.name()).finish(),
            Self::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}
