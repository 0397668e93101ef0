//! Bounded, persisted message history.
//!
//! The store keeps one ordered log per identity key and writes every log back
//! to durable storage after each mutation. Persistence is best-effort: load
//! and write failures are logged and recorded for diagnostics, but the
//! in-memory logs always stay authoritative.

use crate::error::StorageError;
use crate::message::{Message, MessagePatch};
use crate::storage::Storage;
use palaver_core::{IdentityKey, MessageId, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum number of messages retained per identity.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Durable key holding all message logs.
pub const DEFAULT_MESSAGES_KEY: &str = "chat-messages";

type Logs = BTreeMap<IdentityKey, Vec<Message>>;

/// Per-identity message logs backed by durable storage.
pub struct MessageStore {
    logs: Logs,
    storage: Arc<dyn Storage>,
    key: String,
    limit: usize,
    last_error: Option<String>,
}

impl MessageStore {
    /// Opens the store under the default key and history limit.
    #[must_use]
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        Self::open_with(storage, DEFAULT_MESSAGES_KEY, DEFAULT_HISTORY_LIMIT)
    }

    /// Opens the store, restoring any logs previously saved under `key`.
    ///
    /// A missing value yields empty logs. An unreadable or corrupt value also
    /// yields empty logs; the failure is logged and kept in
    /// [`last_error`](Self::last_error).
    #[must_use]
    pub fn open_with(storage: Arc<dyn Storage>, key: impl Into<String>, limit: usize) -> Self {
        let key = key.into();
        let mut last_error = None;

        let logs = match load_logs(storage.as_ref(), &key) {
            Ok(logs) => {
                debug!(key = %key, identities = logs.len(), "restored message logs");
                logs
            }
            Err(report) => {
                warn!(key = %key, error = %report, "failed to restore message logs, starting empty");
                last_error = Some(report.to_string());
                Logs::new()
            }
        };

        let mut store = Self {
            logs,
            storage,
            key,
            limit: limit.max(1),
            last_error,
        };
        // Stored logs may predate a smaller limit.
        let limit = store.limit;
        for log in store.logs.values_mut() {
            truncate_front(log, limit);
        }
        store
    }

    /// Appends a message to the tail of its identity's log.
    ///
    /// The log is then cut back to the most recent `limit` entries.
    pub fn append(&mut self, message: Message) {
        let log = self.logs.entry(message.identity_key()).or_default();
        log.push(message);
        truncate_front(log, self.limit);
        self.persist();
    }

    /// Applies `patch` to the message with `id`, searching every log.
    ///
    /// Returns the message after the patch, or `None` if no log holds it.
    /// Storage is only written when the message actually changed.
    pub fn update(&mut self, id: MessageId, patch: MessagePatch) -> Option<&Message> {
        let (identity, index, changed) = self.logs.iter_mut().find_map(|(identity, log)| {
            let index = log.iter().position(|m| m.id == id)?;
            let changed = patch.apply(&mut log[index]);
            Some((identity.clone(), index, changed))
        })?;

        if changed {
            self.persist();
        }
        self.logs.get(&identity).and_then(|log| log.get(index))
    }

    /// Returns the ordered log for `identity`; empty if none exists yet.
    #[must_use]
    pub fn log(&self, identity: &IdentityKey) -> &[Message] {
        self.logs.get(identity).map_or(&[], Vec::as_slice)
    }

    /// Returns the log of the anonymous identity.
    #[must_use]
    pub fn anonymous_log(&self) -> &[Message] {
        self.log(&IdentityKey::anonymous())
    }

    /// Finds a message by id in any log.
    #[must_use]
    pub fn find(&self, id: MessageId) -> Option<&Message> {
        self.logs.values().flatten().find(|m| m.id == id)
    }

    /// Returns the identities that currently have a log.
    pub fn identities(&self) -> impl Iterator<Item = &IdentityKey> {
        self.logs.keys()
    }

    /// Returns the maximum number of messages kept per identity.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Clears every log and removes the durable value.
    pub fn clear(&mut self) {
        self.logs.clear();
        if let Err(report) = self.storage.remove(&self.key) {
            warn!(key = %self.key, error = %report, "failed to remove message logs");
            self.last_error = Some(report.to_string());
        }
    }

    /// Returns the most recent persistence failure, for diagnostics.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn persist(&mut self) {
        if let Err(report) = save_logs(self.storage.as_ref(), &self.key, &self.logs) {
            warn!(key = %self.key, error = %report, "failed to persist message logs");
            self.last_error = Some(report.to_string());
        }
    }
}

impl std::fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStore")
            .field("key", &self.key)
            .field("limit", &self.limit)
            .field("identities", &self.logs.len())
            .finish_non_exhaustive()
    }
}

fn truncate_front(log: &mut Vec<Message>, limit: usize) {
    if log.len() > limit {
        let excess = log.len() - limit;
        log.drain(..excess);
    }
}

fn load_logs(storage: &dyn Storage, key: &str) -> Result<Logs, StorageError> {
    let Some(raw) = storage.get(key)? else {
        return Ok(Logs::new());
    };

    let logs = serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok(logs)
}

fn save_logs(storage: &dyn Storage, key: &str, logs: &Logs) -> Result<(), StorageError> {
    let raw = serde_json::to_string(logs).map_err(|e| StorageError::EncodeFailed {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    storage.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRole;
    use crate::storage::MemoryStorage;
    use chrono::{TimeZone, Utc};

    /// Storage whose reads or writes always fail.
    struct BrokenStorage {
        reads_fail: bool,
    }

    impl Storage for BrokenStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.reads_fail {
                Err(StorageError::ReadFailed {
                    key: key.to_string(),
                    reason: "quota exceeded".to_string(),
                }
                .into())
            } else {
                Ok(None)
            }
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::WriteFailed {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            }
            .into())
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn memory_store() -> (MemoryStorage, MessageStore) {
        let storage = MemoryStorage::new();
        let store = MessageStore::open(Arc::new(storage.clone()));
        (storage, store)
    }

    fn owned(content: &str, owner: &str) -> Message {
        Message::user(content, Some(owner.to_string()))
    }

    #[test]
    fn append_keeps_insertion_order() {
        let (_, mut store) = memory_store();
        store.append(owned("one", "u1"));
        store.append(owned("two", "u1"));

        let contents: Vec<_> = store
            .log(&IdentityKey::from("u1"))
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, ["one", "two"]);
    }

    #[test]
    fn log_never_exceeds_limit_and_keeps_most_recent() {
        let (_, mut store) = memory_store();
        let key = IdentityKey::from("u1");

        for i in 0..120 {
            store.append(owned(&format!("m{i}"), "u1"));
            assert!(store.log(&key).len() <= DEFAULT_HISTORY_LIMIT);
        }

        let contents: Vec<_> = store.log(&key).iter().map(|m| m.content.clone()).collect();
        let expected: Vec<_> = (70..120).map(|i| format!("m{i}")).collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn identities_are_isolated() {
        let (_, mut store) = memory_store();
        store.append(owned("a", "u1"));
        store.append(Message::user("b", None));

        assert_eq!(store.log(&IdentityKey::from("u1")).len(), 1);
        assert_eq!(store.anonymous_log().len(), 1);
        assert_eq!(store.anonymous_log()[0].content, "b");
        assert!(store.log(&IdentityKey::from("u2")).is_empty());
    }

    #[test]
    fn update_finds_message_in_any_log() {
        let (_, mut store) = memory_store();
        store.append(owned("a", "u1"));
        let target = Message::assistant("b", Some("u2".to_string()));
        let id = target.id;
        store.append(target);

        let updated = store.update(id, MessagePatch::seen()).expect("found");
        assert!(!updated.is_new);
        assert!(store.log(&IdentityKey::from("u1"))[0].is_new);
    }

    #[test]
    fn update_unknown_id_is_none() {
        let (_, mut store) = memory_store();
        assert!(store.update(MessageId::new(), MessagePatch::seen()).is_none());
    }

    #[test]
    fn every_mutation_is_persisted() {
        let (storage, mut store) = memory_store();
        let msg = Message::assistant("hello", None);
        let id = msg.id;
        store.append(msg);

        let reopened = MessageStore::open(Arc::new(storage.clone()));
        assert!(reopened.find(id).expect("persisted").is_new);

        store.update(id, MessagePatch::seen());
        let reopened = MessageStore::open(Arc::new(storage));
        assert!(!reopened.find(id).expect("persisted").is_new);
    }

    #[test]
    fn restore_preserves_order_and_timestamps() {
        let (storage, mut store) = memory_store();
        let base = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap();

        let originals: Vec<Message> = (0..7)
            .map(|i| {
                let mut m = Message::new(
                    if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant },
                    format!("m{i}"),
                    Some("u1".to_string()),
                );
                m.timestamp = base + chrono::Duration::seconds(i);
                m
            })
            .collect();
        for m in &originals {
            store.append(m.clone());
        }

        let restored = MessageStore::open(Arc::new(storage));
        assert_eq!(restored.log(&IdentityKey::from("u1")), originals.as_slice());
    }

    #[test]
    fn corrupt_value_falls_back_to_empty() {
        let storage = MemoryStorage::new();
        storage.set(DEFAULT_MESSAGES_KEY, "{not json").unwrap();

        let store = MessageStore::open(Arc::new(storage));

        assert_eq!(store.identities().count(), 0);
        assert!(store.last_error().expect("recorded").contains("corrupt"));
    }

    #[test]
    fn unreadable_storage_falls_back_to_empty() {
        let store = MessageStore::open(Arc::new(BrokenStorage { reads_fail: true }));

        assert!(store.anonymous_log().is_empty());
        assert!(store.last_error().is_some());
    }

    #[test]
    fn write_failure_keeps_in_memory_state() {
        let mut store = MessageStore::open(Arc::new(BrokenStorage { reads_fail: false }));

        store.append(Message::user("still here", None));

        assert_eq!(store.anonymous_log().len(), 1);
        assert!(store.last_error().expect("recorded").contains("quota"));
    }

    #[test]
    fn clear_removes_all_logs() {
        let (storage, mut store) = memory_store();
        store.append(owned("a", "u1"));
        store.append(Message::user("b", None));

        store.clear();

        assert_eq!(store.identities().count(), 0);
        assert_eq!(storage.get(DEFAULT_MESSAGES_KEY).unwrap(), None);
    }

    #[test]
    fn restore_applies_smaller_limit() {
        let (storage, mut store) = memory_store();
        for i in 0..10 {
            store.append(owned(&format!("m{i}"), "u1"));
        }

        let reopened = MessageStore::open_with(Arc::new(storage), DEFAULT_MESSAGES_KEY, 3);
        let contents: Vec<_> = reopened
            .log(&IdentityKey::from("u1"))
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, ["m7", "m8", "m9"]);
    }
}
