//! Chat-completions adapter for OpenAI-compatible endpoints.

use crate::backend::{ChatBackend, ContextWindow, DEFAULT_CONTEXT_TURNS, TurnRole};
use crate::error::{BackendError, BackendInitError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// System prompt sent ahead of every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Reply used when the completion carries no content.
pub const EMPTY_COMPLETION_REPLY: &str = "I apologize, but I could not generate a response.";

/// Settings for [`OpenAiBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    /// Bearer token.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// API base URL, without the trailing `/chat/completions`.
    pub base_url: String,
    /// System prompt.
    pub system_prompt: String,
    /// Number of remembered turns sent with each request.
    pub context_turns: usize,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Creates a config with defaults for everything but the key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            context_turns: DEFAULT_CONTEXT_TURNS,
            timeout: Duration::from_secs(30),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ChatRequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Backend calling a chat-completions endpoint.
#[derive(Debug)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    config: OpenAiConfig,
    context: Mutex<ContextWindow>,
}

impl OpenAiBackend {
    /// Builds the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, the base URL is not HTTP(S), or
    /// the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, BackendInitError> {
        if config.api_key.trim().is_empty() {
            return Err(BackendInitError::MissingApiKey);
        }
        if !(config.base_url.starts_with("https://") || config.base_url.starts_with("http://")) {
            return Err(BackendInitError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: "expected an http or https URL".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendInitError::ClientBuildFailed {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            context: Mutex::new(ContextWindow::new(config.context_turns)),
            config,
        })
    }

    /// Returns the adapter settings.
    #[must_use]
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Forgets the conversation context.
    pub fn clear_context(&self) {
        self.context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn build_body(&self, text: &str) -> ChatRequest {
        let context = self.context.lock().unwrap_or_else(PoisonError::into_inner);

        let mut messages = Vec::with_capacity(context.len() + 2);
        messages.push(ChatRequestMessage {
            role: "system",
            content: self.config.system_prompt.clone(),
        });
        messages.extend(context.turns().map(|turn| ChatRequestMessage {
            role: match turn.role {
                TurnRole::User => "user",
                TurnRole::Assistant => "assistant",
            },
            content: turn.content.clone(),
        }));
        messages.push(ChatRequestMessage {
            role: "user",
            content: text.to_string(),
        });

        ChatRequest {
            model: self.config.model.clone(),
            messages,
        }
    }
}

/// Maps an unsuccessful HTTP status to a backend error.
fn classify_status(status: StatusCode, body: &str, retry_after: Option<u64>) -> BackendError {
    let detail = format!("HTTP {status}: {body}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BackendError::InvalidCredential { detail }
        }
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimited {
            retry_after_secs: retry_after,
        },
        s if s.is_server_error() => BackendError::ServiceUnavailable { detail },
        _ => BackendError::Unknown { detail },
    }
}

/// Maps a transport failure to a backend error.
fn classify_transport(error: &reqwest::Error) -> BackendError {
    let detail = error.to_string();
    if error.is_connect() || error.is_timeout() || error.is_request() {
        BackendError::ConnectionFailed { detail }
    } else if let Some(status) = error.status() {
        classify_status(status, &detail, None)
    } else {
        BackendError::Unknown { detail }
    }
}

fn extract_reply(response: ChatResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.is_empty())
        .unwrap_or_else(|| EMPTY_COMPLETION_REPLY.to_string())
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    #[instrument(skip(self, text), fields(model = %self.config.model))]
    async fn send_message(&self, text: &str) -> Result<String, BackendError> {
        let body = self.build_body(text);
        let endpoint = self.config.endpoint();

        debug!(endpoint = %endpoint, turns = body.messages.len(), "Sending chat completion");

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, endpoint = %endpoint, "Chat completion request failed");
                classify_transport(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, endpoint = %endpoint, "Chat completion returned error");
            return Err(classify_status(status, &body, retry_after));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| BackendError::Unknown {
            detail: format!("malformed completion: {e}"),
        })?;
        let reply = extract_reply(parsed);

        self.context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_exchange(text, &reply);

        Ok(reply)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendErrorKind;

    fn backend() -> OpenAiBackend {
        OpenAiBackend::new(OpenAiConfig::new("sk-test")).unwrap()
    }

    #[test]
    fn empty_key_fails_construction() {
        let err = OpenAiBackend::new(OpenAiConfig::new("  ")).unwrap_err();
        assert_eq!(err, BackendInitError::MissingApiKey);
    }

    #[test]
    fn non_http_base_url_fails_construction() {
        let config = OpenAiConfig {
            base_url: "ftp://example.com".to_string(),
            ..OpenAiConfig::new("sk-test")
        };
        let err = OpenAiBackend::new(config).unwrap_err();
        assert!(matches!(err, BackendInitError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let config = OpenAiConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..OpenAiConfig::new("k")
        };
        assert_eq!(config.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn body_starts_with_system_prompt_and_ends_with_user_text() {
        let backend = backend();
        backend
            .context
            .lock()
            .unwrap()
            .record_exchange("earlier", "answer");

        let body = backend.build_body("now");
        let roles: Vec<_> = body.messages.iter().map(|m| m.role).collect();

        assert_eq!(body.model, DEFAULT_MODEL);
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert_eq!(body.messages[0].content, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(body.messages[3].content, "now");
    }

    #[test]
    fn clear_context_drops_history_from_body() {
        let backend = backend();
        backend.context.lock().unwrap().record_exchange("q", "a");
        backend.clear_context();

        assert_eq!(backend.build_body("x").messages.len(), 2);
    }

    #[test]
    fn status_classification() {
        let kind = |status| classify_status(status, "", None).kind();

        assert_eq!(kind(StatusCode::UNAUTHORIZED), BackendErrorKind::InvalidCredential);
        assert_eq!(kind(StatusCode::FORBIDDEN), BackendErrorKind::InvalidCredential);
        assert_eq!(kind(StatusCode::TOO_MANY_REQUESTS), BackendErrorKind::RateLimited);
        assert_eq!(kind(StatusCode::BAD_GATEWAY), BackendErrorKind::ServiceUnavailable);
        assert_eq!(kind(StatusCode::SERVICE_UNAVAILABLE), BackendErrorKind::ServiceUnavailable);
        assert_eq!(kind(StatusCode::BAD_REQUEST), BackendErrorKind::Unknown);
    }

    #[test]
    fn rate_limit_keeps_retry_after() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, "", Some(20));
        assert_eq!(
            err,
            BackendError::RateLimited {
                retry_after_secs: Some(20)
            }
        );
    }

    #[test]
    fn extracts_first_choice() {
        let response: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "world"}}]
        }))
        .unwrap();
        assert_eq!(extract_reply(response), "world");
    }

    #[test]
    fn missing_content_yields_apology() {
        let response: ChatResponse =
            serde_json::from_value(serde_json::json!({"choices": []})).unwrap();
        assert_eq!(extract_reply(response), EMPTY_COMPLETION_REPLY);

        let response: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        assert_eq!(extract_reply(response), EMPTY_COMPLETION_REPLY);
    }

    #[tokio::test]
    async fn unreachable_host_is_connection_failure() {
        let config = OpenAiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(2),
            ..OpenAiConfig::new("sk-test")
        };
        let backend = OpenAiBackend::new(config).unwrap();

        let err = backend.send_message("hello").await.unwrap_err();

        assert_eq!(err.kind(), BackendErrorKind::ConnectionFailed);
    }
}
