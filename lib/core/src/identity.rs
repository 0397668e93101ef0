//! Identity keys partition message history per user.
//!
//! The identity itself is opaque to palaver; only its identifier is used.
//! Messages without an owner, or with an empty owner, belong to the
//! anonymous key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key under which messages without an owning identity are stored.
pub const ANONYMOUS_KEY: &str = "anonymous";

/// Key of one identity's message log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Returns the anonymous key.
    #[must_use]
    pub fn anonymous() -> Self {
        Self(ANONYMOUS_KEY.to_string())
    }

    /// Resolves the key for an optional owner identifier.
    #[must_use]
    pub fn for_owner(owner: Option<&str>) -> Self {
        match owner {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self::anonymous(),
        }
    }

    /// Returns true if this is the anonymous key.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS_KEY
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for IdentityKey {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityKey {
    fn from(s: &str) -> Self {
        Self::for_owner(Some(s))
    }
}

impl From<Option<&str>> for IdentityKey {
    fn from(owner: Option<&str>) -> Self {
        Self::for_owner(owner)
    }
}
