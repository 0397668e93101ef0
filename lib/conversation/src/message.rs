//! Message types for conversations.

use chrono::{DateTime, Utc};
use palaver_core::{IdentityKey, MessageId};
use serde::{Deserialize, Serialize};

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User/human message.
    User,
    /// Assistant/AI message.
    Assistant,
}

/// A message in a conversation.
///
/// Once created, a message's only permitted change is clearing `is_new`
/// through [`MessagePatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Message content.
    pub content: String,
    /// Message role.
    pub role: MessageRole,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
    /// Identifier of the owning identity, if any.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Whether the message has not been seen yet.
    #[serde(default)]
    pub is_new: bool,
}

impl Message {
    /// Creates a new, unseen message.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>, owner: Option<String>) -> Self {
        Self {
            id: MessageId::new(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
            owner,
            is_new: true,
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>, owner: Option<String>) -> Self {
        Self::new(MessageRole::User, content, owner)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>, owner: Option<String>) -> Self {
        Self::new(MessageRole::Assistant, content, owner)
    }

    /// Creates the synthetic greeting that opens an empty log.
    ///
    /// Greetings are never animated, so they start out seen.
    #[must_use]
    pub fn greeting(content: impl Into<String>, owner: Option<String>) -> Self {
        Self {
            is_new: false,
            ..Self::assistant(content, owner)
        }
    }

    /// Returns the key of the log this message belongs to.
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::for_owner(self.owner.as_deref())
    }

    /// Returns true if the user wrote this message.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    /// Returns true if the assistant wrote this message.
    #[must_use]
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}

/// Fields that may change on a stored message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessagePatch {
    /// New value for the unseen flag.
    pub is_new: Option<bool>,
}

impl MessagePatch {
    /// Patch that marks a message as seen.
    #[must_use]
    pub fn seen() -> Self {
        Self {
            is_new: Some(false),
        }
    }

    /// Merges this patch into a message.
    ///
    /// Returns true if the message changed.
    pub fn apply(&self, message: &mut Message) -> bool {
        match self.is_new {
            // The flag only ever goes from new to seen.
            Some(false) if message.is_new => {
                message.is_new = false;
                true
            }
            _ => false,
        }
    }
}
