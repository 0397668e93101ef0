//! Terminal host configuration.
//!
//! Loaded via the `config` crate from `PALAVER__*` environment variables,
//! with `__` separating nested keys (e.g. `PALAVER__WIDGET__GREETING`).

use palaver_ai::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use palaver_widget::WidgetConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Host configuration composed around the widget config.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Directory holding persisted state.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// API key for the chat-completions backend. Without one the canned
    /// backend answers.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whether the session starts online.
    #[serde(default = "default_start_online")]
    pub start_online: bool,

    /// Simulated latency of the canned backend, in milliseconds.
    #[serde(default = "default_canned_latency_ms")]
    pub canned_latency_ms: u64,

    /// Widget settings.
    #[serde(default)]
    pub widget: WidgetConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".palaver")
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_start_online() -> bool {
    true
}

fn default_canned_latency_ms() -> u64 {
    1000
}

impl CliConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is malformed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(config::Environment::with_prefix("PALAVER"))
    }

    fn from_source(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the API key if one is set and non-blank.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}
