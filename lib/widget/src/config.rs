//! Widget configuration.
//!
//! Every field has a default, so hosts only set what they change.

use crate::error::WidgetError;
use palaver_conversation::{DEFAULT_HISTORY_LIMIT, DEFAULT_MESSAGES_KEY};
use palaver_core::Result;
use serde::Deserialize;
use std::time::Duration;

/// Longest accepted maintenance window: one week.
pub const MAX_MAINTENANCE_WINDOW_MINUTES: i64 = 7 * 24 * 60;

/// Durable key holding the signed-in identity.
pub const DEFAULT_IDENTITY_KEY: &str = "chat-widget-auth";

/// Session configuration for one widget instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WidgetConfig {
    /// Assistant message that opens an empty log.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Whether sending requires a signed-in identity.
    #[serde(default)]
    pub require_auth: bool,

    /// Messages retained per identity.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Durable key for message logs.
    #[serde(default = "default_messages_key")]
    pub messages_key: String,

    /// Durable key for the signed-in identity.
    #[serde(default = "default_identity_key")]
    pub identity_key: String,

    /// Reveal pacing.
    #[serde(default)]
    pub reveal: RevealConfig,

    /// Assumed length of a maintenance window, in minutes.
    #[serde(default = "default_maintenance_window_minutes")]
    pub maintenance_window_minutes: i64,
}

fn default_greeting() -> String {
    "Hi! How can I help you today?".to_string()
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_messages_key() -> String {
    DEFAULT_MESSAGES_KEY.to_string()
}

fn default_identity_key() -> String {
    DEFAULT_IDENTITY_KEY.to_string()
}

fn default_maintenance_window_minutes() -> i64 {
    30
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            require_auth: false,
            history_limit: default_history_limit(),
            messages_key: default_messages_key(),
            identity_key: default_identity_key(),
            reveal: RevealConfig::default(),
            maintenance_window_minutes: default_maintenance_window_minutes(),
        }
    }
}

impl WidgetConfig {
    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range field.
    pub fn validate(&self) -> Result<(), WidgetError> {
        let invalid = |field, reason: &str| -> Result<(), WidgetError> {
            Err(WidgetError::InvalidConfig {
                field,
                reason: reason.to_string(),
            }
            .into())
        };

        if self.history_limit == 0 {
            return invalid("history_limit", "must be at least 1");
        }
        if self.messages_key.is_empty() {
            return invalid("messages_key", "must not be empty");
        }
        if self.identity_key.is_empty() || self.identity_key == self.messages_key {
            return invalid("identity_key", "must be non-empty and differ from messages_key");
        }
        if self.reveal.min_delay_ms > self.reveal.max_delay_ms {
            return invalid("reveal", "min_delay_ms exceeds max_delay_ms");
        }
        if !(0..=MAX_MAINTENANCE_WINDOW_MINUTES).contains(&self.maintenance_window_minutes) {
            return invalid("maintenance_window_minutes", "must be between 0 and one week");
        }
        Ok(())
    }
}

/// Pacing of the word-by-word reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RevealConfig {
    /// Shortest pause between words, in milliseconds.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Longest pause between words, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_min_delay_ms() -> u64 {
    50
}

fn default_max_delay_ms() -> u64 {
    150
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RevealConfig {
    /// Returns the pause bounds, ordered.
    #[must_use]
    pub fn bounds(&self) -> (Duration, Duration) {
        let low = self.min_delay_ms.min(self.max_delay_ms);
        let high = self.min_delay_ms.max(self.max_delay_ms);
        (Duration::from_millis(low), Duration::from_millis(high))
    }
}
