//! Mutable session state shared by the controller and the send pipeline.

use crate::config::WidgetConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::hooks::SessionHooks;
use crate::identity::IdentityState;
use crate::maintenance::MaintenanceMonitor;
use palaver_ai::BackendSlot;
use palaver_conversation::{Message, MessageStore};
use palaver_core::MessageId;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Everything that changes during a session.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) store: MessageStore,
    pub(crate) connectivity: ConnectivityMonitor,
    pub(crate) maintenance: MaintenanceMonitor,
    pub(crate) identity: IdentityState,
    pub(crate) busy: bool,
    pub(crate) input: String,
    /// Assistant messages whose reveal has completed.
    pub(crate) revealed: HashSet<MessageId>,
    pub(crate) alive: bool,
    pub(crate) login_requested: bool,
}

impl SessionState {
    /// Appends `message` to the store and forgets finished reveals whose
    /// messages were evicted or already seen.
    pub(crate) fn append(&mut self, message: Message) {
        self.store.append(message);
        let store = &self.store;
        self.revealed.retain(|id| store.find(*id).is_some_and(|m| m.is_new));
    }

    /// Seeds the active identity's log with the greeting if it is empty.
    ///
    /// Returns true if a greeting was appended.
    pub(crate) fn seed_greeting(&mut self, greeting: &str) -> bool {
        let key = self.identity.log_key();
        if !self.store.log(&key).is_empty() {
            return false;
        }
        let owner = self.identity.current().map(|i| i.id.clone());
        self.store.append(Message::greeting(greeting, owner));
        debug!(identity = %key, "seeded greeting");
        true
    }
}

/// A session: its state behind a lock plus the fixed collaborators.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) state: Mutex<SessionState>,
    pub(crate) backend: BackendSlot,
    pub(crate) hooks: SessionHooks,
    pub(crate) config: WidgetConfig,
    /// Whether `config` failed validation at build.
    pub(crate) config_invalid: bool,
    /// Why sending is disabled for the whole session, if it is.
    pub(crate) config_error: Option<String>,
}

impl Session {
    /// Locks the state. Every critical section leaves it consistent, so a
    /// poisoned lock is still usable.
    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
