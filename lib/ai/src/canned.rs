//! Offline backend that answers with canned replies.

use crate::backend::{ChatBackend, ContextWindow};
use crate::error::BackendError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Replies used when no language-model credentials are configured.
pub const DEFAULT_REPLIES: [&str; 4] = [
    "Thank you for your message! This is a free tier response. To get AI-powered responses, please provide an API key.",
    "I'm a simple canned response for the free tier. For more intelligent conversations, configure a language-model backend.",
    "Hello! I'm the free version of the chat widget. I can only provide pre-written responses.",
    "This is a demo response. To experience the full capabilities, please configure the widget with an API key.",
];

/// Simulated round-trip latency of the canned backend.
pub const DEFAULT_LATENCY: Duration = Duration::from_secs(1);

/// Backend cycling through a fixed list of replies.
#[derive(Debug)]
pub struct CannedBackend {
    replies: Vec<String>,
    next: AtomicUsize,
    latency: Duration,
    context: Mutex<ContextWindow>,
}

impl CannedBackend {
    /// Creates a backend with the default replies and latency.
    #[must_use]
    pub fn new() -> Self {
        Self::with_replies(DEFAULT_REPLIES.iter().map(ToString::to_string))
    }

    /// Creates a backend cycling through `replies`.
    ///
    /// An empty list answers with an empty string.
    #[must_use]
    pub fn with_replies(replies: impl IntoIterator<Item = String>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            next: AtomicUsize::new(0),
            latency: DEFAULT_LATENCY,
            context: Mutex::new(ContextWindow::default()),
        }
    }

    /// Sets the simulated latency.
    #[must_use]
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns the number of remembered turns.
    #[must_use]
    pub fn context_len(&self) -> usize {
        self.context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Forgets the conversation context.
    pub fn clear_context(&self) {
        self.context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn next_reply(&self) -> String {
        if self.replies.is_empty() {
            return String::new();
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.replies.len();
        self.replies[index].clone()
    }
}

impl Default for CannedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for CannedBackend {
    async fn send_message(&self, text: &str) -> Result<String, BackendError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reply = self.next_reply();
        self.context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_exchange(text, &reply);
        Ok(reply)
    }

    fn name(&self) -> &str {
        "canned"
    }
}
