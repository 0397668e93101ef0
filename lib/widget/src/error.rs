//! Error types for the widget crate.
//!
//! - `WidgetError`: Invalid widget configuration
//! - `Rejection`: Why a submit was refused before anything was sent

use std::fmt;

/// Errors from widget setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetError {
    /// A configuration value is out of range.
    InvalidConfig { field: &'static str, reason: String },
}

impl fmt::Display for WidgetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { field, reason } => {
                write!(f, "invalid widget configuration for '{field}': {reason}")
            }
        }
    }
}

impl std::error::Error for WidgetError {}

/// Reasons a submit is refused.
///
/// A refused submit has no side effect beyond raising the login request for
/// [`Rejection::LoginRequired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The session was disposed.
    Disposed,
    /// The text was empty or whitespace.
    EmptyInput,
    /// The widget configuration failed validation.
    InvalidConfig,
    /// The backend adapter failed to initialize.
    BackendUnavailable,
    /// Another send is in flight.
    Busy,
    /// The identity is still being resolved.
    ResolvingIdentity,
    /// A maintenance window is active.
    Maintenance,
    /// The host is offline.
    Offline,
    /// Authentication is required and nobody is signed in.
    LoginRequired,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Disposed => "session has ended",
            Self::EmptyInput => "message is empty",
            Self::InvalidConfig => "widget configuration is invalid",
            Self::BackendUnavailable => "backend is not configured",
            Self::Busy => "a message is already being sent",
            Self::ResolvingIdentity => "identity is still loading",
            Self::Maintenance => "system is under maintenance",
            Self::Offline => "host is offline",
            Self::LoginRequired => "login required",
        };
        f.write_str(reason)
    }
}

impl std::error::Error for Rejection {}
