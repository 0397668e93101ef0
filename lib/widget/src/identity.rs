//! The signed-in identity.
//!
//! The identity is opaque: palaver stores what the host hands it and keys
//! message logs by its id. Credential checks happen elsewhere.

use palaver_conversation::{Storage, StorageError};
use palaver_core::{IdentityKey, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque identifier.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    /// Creates an identity with only an id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the contact address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Returns the key of this identity's message log.
    #[must_use]
    pub fn key(&self) -> IdentityKey {
        IdentityKey::for_owner(Some(&self.id))
    }
}

/// Current identity plus whether a lookup is still in progress.
pub struct IdentityState {
    current: Option<Identity>,
    resolving: bool,
    storage: Arc<dyn Storage>,
    key: String,
}

impl IdentityState {
    /// Restores the identity saved under `key`.
    ///
    /// A missing or unreadable value starts signed out.
    #[must_use]
    pub fn load(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let current = match read_identity(storage.as_ref(), &key) {
            Ok(current) => {
                debug!(key = %key, signed_in = current.is_some(), "restored identity");
                current
            }
            Err(report) => {
                warn!(key = %key, error = %report, "failed to restore identity, starting signed out");
                None
            }
        };

        Self {
            current,
            resolving: false,
            storage,
            key,
        }
    }

    /// Returns the signed-in identity.
    #[must_use]
    pub fn current(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    /// Returns the key of the active message log.
    #[must_use]
    pub fn log_key(&self) -> IdentityKey {
        self.current
            .as_ref()
            .map_or_else(IdentityKey::anonymous, Identity::key)
    }

    /// Returns true while an identity lookup is in progress.
    #[must_use]
    pub fn is_resolving(&self) -> bool {
        self.resolving
    }

    /// Marks an identity lookup as started.
    pub fn begin_resolution(&mut self) {
        self.resolving = true;
    }

    /// Ends an identity lookup with its result.
    ///
    /// Returns true if the active identity changed.
    pub fn finish_resolution(&mut self, identity: Option<Identity>) -> bool {
        self.resolving = false;
        self.replace(identity)
    }

    /// Signs in. Returns true if the active identity changed.
    pub fn sign_in(&mut self, identity: Identity) -> bool {
        self.replace(Some(identity))
    }

    /// Signs out. Returns true if somebody was signed in.
    pub fn sign_out(&mut self) -> bool {
        self.replace(None)
    }

    fn replace(&mut self, identity: Option<Identity>) -> bool {
        if self.current == identity {
            return false;
        }
        let changed_key = self.current.as_ref().map(|i| &i.id) != identity.as_ref().map(|i| &i.id);
        self.current = identity;

        if let Err(report) = write_identity(self.storage.as_ref(), &self.key, self.current.as_ref())
        {
            warn!(key = %self.key, error = %report, "failed to persist identity");
        }
        changed_key
    }
}

impl std::fmt::Debug for IdentityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityState")
            .field("current", &self.current)
            .field("resolving", &self.resolving)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

fn read_identity(storage: &dyn Storage, key: &str) -> Result<Option<Identity>, StorageError> {
    let Some(raw) = storage.get(key)? else {
        return Ok(None);
    };
    let identity = serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Some(identity))
}

fn write_identity(
    storage: &dyn Storage,
    key: &str,
    identity: Option<&Identity>,
) -> Result<(), StorageError> {
    let Some(identity) = identity else {
        return storage.remove(key);
    };
    let raw = serde_json::to_string(identity).map_err(|e| StorageError::EncodeFailed {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    storage.set(key, &raw)
}
