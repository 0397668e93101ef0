//! Error types for the AI crate.
//!
//! - `BackendError`: A failed round trip, classified into the five kinds the
//!   widget knows how to explain to a user
//! - `BackendInitError`: An adapter that could not be constructed at all

use std::fmt;

/// Shown when the backend rejects the configured credentials.
pub const INVALID_CREDENTIAL_MESSAGE: &str =
    "Invalid API key. Please check your API key configuration.";

/// Shown when the backend rate-limits the widget.
pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please try again in a moment.";

/// Shown when the backend reports it cannot serve requests.
pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "The AI service is currently unavailable. Please try again later.";

/// Shown when the backend cannot be reached.
pub const CONNECTION_FAILED_MESSAGE: &str =
    "Failed to connect to the AI service. Please check your internet connection.";

/// Shown for any failure that fits no other kind.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// The classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    /// Credentials were rejected.
    InvalidCredential,
    /// Too many requests.
    RateLimited,
    /// The service is down or overloaded.
    ServiceUnavailable,
    /// The service could not be reached.
    ConnectionFailed,
    /// Anything else.
    Unknown,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidCredential => "invalid_credential",
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable => "service_unavailable",
            Self::ConnectionFailed => "connection_failed",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Errors from a backend round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Credentials were rejected.
    InvalidCredential { detail: String },
    /// Rate limit exceeded.
    RateLimited { retry_after_secs: Option<u64> },
    /// The service is unavailable.
    ServiceUnavailable { detail: String },
    /// The service could not be reached.
    ConnectionFailed { detail: String },
    /// Unclassified failure.
    Unknown { detail: String },
}

impl BackendError {
    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> BackendErrorKind {
        match self {
            Self::InvalidCredential { .. } => BackendErrorKind::InvalidCredential,
            Self::RateLimited { .. } => BackendErrorKind::RateLimited,
            Self::ServiceUnavailable { .. } => BackendErrorKind::ServiceUnavailable,
            Self::ConnectionFailed { .. } => BackendErrorKind::ConnectionFailed,
            Self::Unknown { .. } => BackendErrorKind::Unknown,
        }
    }

    /// Returns the fixed text shown to the user for this error.
    ///
    /// The text depends only on the kind, never on the detail.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            BackendErrorKind::InvalidCredential => INVALID_CREDENTIAL_MESSAGE,
            BackendErrorKind::RateLimited => RATE_LIMITED_MESSAGE,
            BackendErrorKind::ServiceUnavailable => SERVICE_UNAVAILABLE_MESSAGE,
            BackendErrorKind::ConnectionFailed => CONNECTION_FAILED_MESSAGE,
            BackendErrorKind::Unknown => UNKNOWN_ERROR_MESSAGE,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredential { detail } => {
                write!(f, "backend rejected credentials: {detail}")
            }
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
            Self::ServiceUnavailable { detail } => {
                write!(f, "backend unavailable: {detail}")
            }
            Self::ConnectionFailed { detail } => {
                write!(f, "failed to reach backend: {detail}")
            }
            Self::Unknown { detail } => write!(f, "backend request failed: {detail}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Errors from constructing a backend adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendInitError {
    /// No API key was configured.
    MissingApiKey,
    /// The configured base URL is not usable.
    InvalidBaseUrl { url: String, reason: String },
    /// The HTTP client could not be built.
    ClientBuildFailed { reason: String },
}

impl fmt::Display for BackendInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "no API key configured"),
            Self::InvalidBaseUrl { url, reason } => {
                write!(f, "invalid backend URL '{url}': {reason}")
            }
            Self::ClientBuildFailed { reason } => {
                write!(f, "failed to build HTTP client: {reason}")
            }
        }
    }
}

impl std::error::Error for BackendInitError {}
