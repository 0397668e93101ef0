//! The session controller: single source of truth for one widget instance.
//!
//! A controller is created at session start and disposed at session end.
//! Clones share the same session, so hosts can hand one to callbacks and
//! background tasks.

use crate::config::WidgetConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::hooks::SessionHooks;
use crate::identity::{Identity, IdentityState};
use crate::maintenance::{MaintenanceMonitor, MaintenanceSignal, MaintenanceStatus};
use crate::pipeline::{self, SubmitOutcome};
use crate::state::{Session, SessionState};
use palaver_ai::BackendSlot;
use palaver_conversation::{Message, MessagePatch, MessageStore, Storage};
use palaver_core::{IdentityKey, MessageId};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// A signal from the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSignal {
    /// The host became reachable.
    Online,
    /// The host became unreachable.
    Offline,
    /// A maintenance window started.
    MaintenanceActive { message: String },
    /// The maintenance window ended.
    MaintenanceInactive,
}

impl From<MaintenanceSignal> for HostSignal {
    fn from(signal: MaintenanceSignal) -> Self {
        match signal {
            MaintenanceSignal::Active { message } => Self::MaintenanceActive { message },
            MaintenanceSignal::Inactive => Self::MaintenanceInactive,
        }
    }
}

/// Snapshot of what presentation needs besides the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    /// Whether the host is reachable.
    pub online: bool,
    /// Last known maintenance state; `None` until a signal arrives.
    pub maintenance: Option<MaintenanceStatus>,
    /// Whether a send is in flight.
    pub busy: bool,
    /// Whether an identity lookup is in progress.
    pub resolving: bool,
    /// Whether the login form should be shown.
    pub login_requested: bool,
    /// The signed-in identity.
    pub identity: Option<Identity>,
    /// Why sending is disabled for the whole session: an invalid
    /// configuration or a backend that failed to initialize.
    pub config_error: Option<String>,
}

/// Result of [`SessionController::mark_seen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeenOutcome {
    /// The message flipped from new to seen.
    Marked,
    /// The message was already seen.
    AlreadySeen,
    /// The message's reveal has not completed; nothing changed.
    RevealPending,
    /// No log holds the message.
    NotFound,
}

/// Builds a [`SessionController`].
pub struct SessionControllerBuilder {
    storage: Arc<dyn Storage>,
    backend: BackendSlot,
    config: WidgetConfig,
    hooks: SessionHooks,
    online: bool,
}

impl SessionControllerBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: WidgetConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the host callbacks.
    #[must_use]
    pub fn hooks(mut self, hooks: SessionHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Seeds connectivity from the host's reachability indicator.
    #[must_use]
    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    /// Restores persisted state and starts the session.
    ///
    /// An invalid configuration still yields a session, but one that
    /// refuses every send and reports the failure in its status.
    #[must_use]
    pub fn build(self) -> SessionController {
        let config = self.config;
        let store = MessageStore::open_with(
            self.storage.clone(),
            config.messages_key.clone(),
            config.history_limit,
        );
        let identity = IdentityState::load(self.storage, config.identity_key.clone());

        let validation = config.validate();
        if let Err(report) = &validation {
            error!(error = %report, "invalid widget configuration, sending is disabled");
        }
        if let Some(reason) = self.backend.unavailable_reason() {
            error!(reason, "backend failed to initialize, sending is disabled");
        }
        let config_error = match &validation {
            Err(report) => Some(report.to_string()),
            Ok(()) => self.backend.unavailable_reason().map(ToString::to_string),
        };

        let mut state = SessionState {
            store,
            connectivity: ConnectivityMonitor::new(self.online),
            maintenance: MaintenanceMonitor::new(config.maintenance_window_minutes),
            identity,
            busy: false,
            input: String::new(),
            revealed: HashSet::new(),
            alive: true,
            login_requested: false,
        };
        state.seed_greeting(&config.greeting);

        SessionController {
            session: Arc::new(Session {
                state: Mutex::new(state),
                backend: self.backend,
                hooks: self.hooks,
                config,
                config_invalid: validation.is_err(),
                config_error,
            }),
        }
    }
}

/// Handle to one chat session.
#[derive(Debug, Clone)]
pub struct SessionController {
    session: Arc<Session>,
}

impl SessionController {
    /// Starts building a session over `storage` talking to `backend`.
    #[must_use]
    pub fn builder(storage: Arc<dyn Storage>, backend: BackendSlot) -> SessionControllerBuilder {
        SessionControllerBuilder {
            storage,
            backend,
            config: WidgetConfig::default(),
            hooks: SessionHooks::default(),
            online: true,
        }
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &WidgetConfig {
        &self.session.config
    }

    /// Sends `text` if every admission gate passes.
    ///
    /// Backend failures come back as an appended assistant message, never as
    /// an error. A submit while another is in flight is a no-op.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        pipeline::submit(&self.session, text).await
    }

    /// Marks a message as seen.
    ///
    /// An assistant message that is still new must have finished its reveal
    /// first; until then this is rejected and not remembered.
    pub fn mark_seen(&self, id: MessageId) -> SeenOutcome {
        let mut state = self.session.lock();
        let Some(message) = state.store.find(id) else {
            return SeenOutcome::NotFound;
        };
        if !message.is_new {
            return SeenOutcome::AlreadySeen;
        }
        if message.is_assistant() && !state.revealed.contains(&id) {
            debug!(message_id = %id, "seen before reveal completed, ignoring");
            return SeenOutcome::RevealPending;
        }

        state.store.update(id, MessagePatch::seen());
        state.revealed.remove(&id);
        SeenOutcome::Marked
    }

    /// Records that the reveal of `id` has finished.
    ///
    /// Returns false if `id` is not a new assistant message.
    pub fn complete_reveal(&self, id: MessageId) -> bool {
        let mut state = self.session.lock();
        let eligible = state
            .store
            .find(id)
            .is_some_and(|m| m.is_assistant() && m.is_new);
        if eligible {
            state.revealed.insert(id);
        }
        eligible
    }

    /// Returns true if `id` needs no reveal or its reveal has finished.
    #[must_use]
    pub fn is_revealed(&self, id: MessageId) -> bool {
        let state = self.session.lock();
        match state.store.find(id) {
            Some(m) if m.is_assistant() && m.is_new => state.revealed.contains(&id),
            Some(_) => true,
            None => false,
        }
    }

    /// Returns the log of the active identity.
    #[must_use]
    pub fn current_log(&self) -> Vec<Message> {
        let state = self.session.lock();
        state.store.log(&state.identity.log_key()).to_vec()
    }

    /// Returns the log of `identity`.
    #[must_use]
    pub fn log_for(&self, identity: &IdentityKey) -> Vec<Message> {
        self.session.lock().store.log(identity).to_vec()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        let state = self.session.lock();
        SessionStatus {
            online: state.connectivity.is_online(),
            maintenance: state.maintenance.status().cloned(),
            busy: state.busy,
            resolving: state.identity.is_resolving(),
            login_requested: state.login_requested,
            identity: state.identity.current().cloned(),
            config_error: self.session.config_error.clone(),
        }
    }

    /// Returns the most recent persistence failure, for diagnostics.
    #[must_use]
    pub fn storage_error(&self) -> Option<String> {
        self.session.lock().store.last_error().map(ToString::to_string)
    }

    /// Applies a host signal.
    pub fn handle_signal(&self, signal: HostSignal) {
        let mut state = self.session.lock();
        match signal {
            HostSignal::Online => {
                state.connectivity.went_online();
            }
            HostSignal::Offline => {
                state.connectivity.went_offline();
            }
            HostSignal::MaintenanceActive { message } => {
                state.maintenance.apply(MaintenanceSignal::Active { message });
            }
            HostSignal::MaintenanceInactive => {
                state.maintenance.apply(MaintenanceSignal::Inactive);
            }
        }
    }

    /// Signs in and switches to that identity's log.
    pub fn sign_in(&self, identity: Identity) {
        let mut state = self.session.lock();
        state.login_requested = false;
        if state.identity.sign_in(identity) {
            self.identity_changed(&mut state);
        }
    }

    /// Signs out and switches to the anonymous log.
    pub fn sign_out(&self) {
        let mut state = self.session.lock();
        if state.identity.sign_out() {
            self.identity_changed(&mut state);
        }
    }

    /// Marks an identity lookup as started; sends are refused until it ends.
    pub fn begin_identity_resolution(&self) {
        self.session.lock().identity.begin_resolution();
    }

    /// Ends an identity lookup with its result.
    pub fn finish_identity_resolution(&self, identity: Option<Identity>) {
        let mut state = self.session.lock();
        if identity.is_some() {
            state.login_requested = false;
        }
        if state.identity.finish_resolution(identity) {
            self.identity_changed(&mut state);
        }
    }

    /// Replaces the draft input.
    pub fn set_input(&self, text: impl Into<String>) {
        self.session.lock().input = text.into();
    }

    /// Returns the draft input.
    #[must_use]
    pub fn input(&self) -> String {
        self.session.lock().input.clone()
    }

    /// Hides the login request.
    pub fn dismiss_login(&self) {
        self.session.lock().login_requested = false;
    }

    /// Clears every log and reseeds the greeting for the active identity.
    pub fn reset(&self) {
        let mut state = self.session.lock();
        state.store.clear();
        state.revealed.clear();
        state.seed_greeting(&self.session.config.greeting);
        info!("message history reset");
    }

    /// Ends the session. A reply still in flight is discarded on arrival.
    pub fn dispose(&self) {
        let mut state = self.session.lock();
        if state.alive {
            state.alive = false;
            debug!("session disposed");
        }
    }

    /// Returns false once the session is disposed.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.session.lock().alive
    }

    fn identity_changed(&self, state: &mut SessionState) {
        let key = state.identity.log_key();
        info!(identity = %key, "active identity changed");
        state.seed_greeting(&self.session.config.greeting);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Rejection;
    use async_trait::async_trait;
    use palaver_ai::{BackendError, BackendErrorKind, BackendInitError, ChatBackend};
    use palaver_conversation::{MemoryStorage, MessageRole};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Backend answering from a queue and counting calls.
    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, BackendError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn replying(replies: impl IntoIterator<Item = Result<String, BackendError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send_message(&self, _text: &str) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default".to_string()))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Backend that blocks until released.
    #[derive(Default)]
    struct GatedBackend {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ChatBackend for GatedBackend {
        async fn send_message(&self, text: &str) -> Result<String, BackendError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(format!("re: {text}"))
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    fn controller_with(backend: Arc<dyn ChatBackend>) -> SessionController {
        SessionController::builder(Arc::new(MemoryStorage::new()), BackendSlot::Ready(backend))
            .config(WidgetConfig {
                greeting: "Hi".to_string(),
                ..WidgetConfig::default()
            })
            .build()
    }

    #[test]
    fn empty_log_is_seeded_with_greeting_per_identity() {
        let controller = controller_with(ScriptedBackend::replying([]));
        controller.sign_in(Identity::new("u1"));

        let log = controller.log_for(&IdentityKey::from("u1"));
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].role, MessageRole::Assistant);
        assert_eq!(log[0].content, "Hi");
        assert!(!log[0].is_new);

        controller.sign_out();
        controller.sign_in(Identity::new("u1"));
        assert_eq!(controller.current_log().len(), 1);
    }

    #[tokio::test]
    async fn submit_appends_user_then_assistant() {
        let backend = ScriptedBackend::replying([Ok("world".to_string())]);
        let controller = controller_with(backend.clone());

        let outcome = controller.submit("hello").await;

        assert!(matches!(outcome, SubmitOutcome::Completed { failure: None, .. }));
        let log = controller.current_log();
        let tail: Vec<_> = log[1..].iter().map(|m| (m.role, m.content.as_str())).collect();
        assert_eq!(
            tail,
            [(MessageRole::User, "hello"), (MessageRole::Assistant, "world")]
        );
        assert!(!controller.status().busy);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn backend_failure_becomes_fixed_message() {
        let backend = ScriptedBackend::replying([Err(BackendError::RateLimited {
            retry_after_secs: Some(12),
        })]);
        let controller = controller_with(backend);

        let outcome = controller.submit("hello").await;

        let SubmitOutcome::Completed { reply, failure, .. } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(failure, Some(BackendErrorKind::RateLimited));
        assert_eq!(
            reply.content,
            "Rate limit exceeded. Please try again in a moment."
        );
        assert_eq!(controller.current_log().last(), Some(&reply));
        assert!(!controller.status().busy);
    }

    #[tokio::test]
    async fn submit_while_busy_is_a_no_op() {
        let backend = Arc::new(GatedBackend::default());
        let controller = controller_with(backend.clone());

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit("first").await }
        });
        backend.started.notified().await;

        let before = controller.current_log().len();
        assert!(controller.status().busy);

        let second = controller.submit("second").await;

        assert_eq!(second, SubmitOutcome::Rejected(Rejection::Busy));
        assert_eq!(controller.current_log().len(), before);
        assert!(controller.status().busy);

        backend.release.notify_one();
        let first = first.await.unwrap();
        assert!(first.was_sent());
        assert!(!controller.status().busy);
    }

    #[tokio::test]
    async fn maintenance_blocks_backend() {
        let backend = ScriptedBackend::replying([]);
        let controller = controller_with(backend.clone());
        controller.handle_signal(HostSignal::MaintenanceActive {
            message: "Upgrading".to_string(),
        });

        let outcome = controller.submit("hello").await;

        assert_eq!(outcome.rejection(), Some(Rejection::Maintenance));
        assert_eq!(backend.calls(), 0);
        assert_eq!(controller.current_log().len(), 1);

        controller.handle_signal(HostSignal::MaintenanceInactive);
        assert!(controller.submit("hello").await.was_sent());
    }

    #[tokio::test]
    async fn offline_blocks_backend_and_keeps_input() {
        let backend = ScriptedBackend::replying([]);
        let controller = controller_with(backend.clone());
        controller.set_input("draft");
        controller.handle_signal(HostSignal::Offline);

        let outcome = controller.submit("draft").await;

        assert_eq!(outcome.rejection(), Some(Rejection::Offline));
        assert_eq!(backend.calls(), 0);
        assert_eq!(controller.input(), "draft");

        controller.handle_signal(HostSignal::Online);
        assert!(controller.submit("draft").await.was_sent());
        assert_eq!(controller.input(), "");
    }

    #[tokio::test]
    async fn auth_required_requests_login_once_per_submit() {
        let backend = ScriptedBackend::replying([]);
        let prompts = Arc::new(AtomicUsize::new(0));
        let controller = SessionController::builder(
            Arc::new(MemoryStorage::new()),
            BackendSlot::Ready(backend.clone()),
        )
        .config(WidgetConfig {
            require_auth: true,
            ..WidgetConfig::default()
        })
        .hooks(SessionHooks::new().on_login_required({
            let prompts = prompts.clone();
            move || {
                prompts.fetch_add(1, Ordering::SeqCst);
            }
        }))
        .build();

        let outcome = controller.submit("hello").await;

        assert_eq!(outcome.rejection(), Some(Rejection::LoginRequired));
        assert_eq!(backend.calls(), 0);
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
        assert!(controller.status().login_requested);

        controller.sign_in(Identity::new("u1"));
        assert!(!controller.status().login_requested);
        assert!(controller.submit("hello").await.was_sent());
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolving_identity_blocks_send() {
        let backend = ScriptedBackend::replying([]);
        let controller = controller_with(backend.clone());
        controller.begin_identity_resolution();

        assert_eq!(
            controller.submit("hi").await.rejection(),
            Some(Rejection::ResolvingIdentity)
        );

        controller.finish_identity_resolution(Some(Identity::new("u9")));
        assert!(controller.submit("hi").await.was_sent());
        assert_eq!(controller.log_for(&IdentityKey::from("u9")).len(), 3);
    }

    #[tokio::test]
    async fn unavailable_backend_refuses_silently() {
        let controller = SessionController::builder(
            Arc::new(MemoryStorage::new()),
            BackendSlot::from_init::<ScriptedBackend>(Err(BackendInitError::MissingApiKey)),
        )
        .build();

        let outcome = controller.submit("hello").await;

        assert_eq!(outcome.rejection(), Some(Rejection::BackendUnavailable));
        assert_eq!(controller.current_log().len(), 1);
        assert_eq!(
            controller.status().config_error.as_deref(),
            Some("no API key configured")
        );
    }

    #[tokio::test]
    async fn hooks_fire_for_sent_and_received() {
        let backend = ScriptedBackend::replying([
            Ok("world".to_string()),
            Err(BackendError::ConnectionFailed {
                detail: "refused".to_string(),
            }),
        ]);
        let sent = Arc::new(Mutex::new(Vec::new()));
        let received = Arc::new(Mutex::new(Vec::new()));
        let controller = SessionController::builder(
            Arc::new(MemoryStorage::new()),
            BackendSlot::Ready(backend),
        )
        .hooks(
            SessionHooks::new()
                .on_message_sent({
                    let sent = sent.clone();
                    move |m| sent.lock().unwrap().push(m.content.clone())
                })
                .on_message_received({
                    let received = received.clone();
                    move |m| received.lock().unwrap().push(m.content.clone())
                }),
        )
        .build();

        controller.submit("one").await;
        controller.submit("two").await;

        assert_eq!(*sent.lock().unwrap(), ["one", "two"]);
        assert_eq!(*received.lock().unwrap(), ["world"]);
    }

    #[tokio::test]
    async fn mark_seen_requires_completed_reveal() {
        let controller = controller_with(ScriptedBackend::replying([Ok("world".to_string())]));
        let SubmitOutcome::Completed { reply, .. } = controller.submit("hello").await else {
            panic!("expected completion");
        };

        assert_eq!(controller.mark_seen(reply.id), SeenOutcome::RevealPending);
        assert!(controller.current_log().last().unwrap().is_new);

        assert!(controller.complete_reveal(reply.id));
        assert_eq!(controller.mark_seen(reply.id), SeenOutcome::Marked);
        assert_eq!(controller.mark_seen(reply.id), SeenOutcome::AlreadySeen);
        assert!(!controller.current_log().last().unwrap().is_new);
    }

    #[tokio::test]
    async fn evicted_reveals_are_forgotten() {
        let controller = SessionController::builder(
            Arc::new(MemoryStorage::new()),
            BackendSlot::Ready(ScriptedBackend::replying([])),
        )
        .config(WidgetConfig {
            history_limit: 4,
            ..WidgetConfig::default()
        })
        .build();

        let SubmitOutcome::Completed { reply: first, .. } = controller.submit("one").await else {
            panic!("expected completion");
        };
        assert!(controller.complete_reveal(first.id));

        controller.submit("two").await;
        assert!(controller.session.lock().revealed.contains(&first.id));

        controller.submit("three").await;
        assert!(controller.session.lock().store.find(first.id).is_none());
        assert!(controller.session.lock().revealed.is_empty());
    }

    #[tokio::test]
    async fn user_messages_are_seen_without_reveal() {
        let controller = controller_with(ScriptedBackend::replying([]));
        let SubmitOutcome::Completed { user, .. } = controller.submit("hello").await else {
            panic!("expected completion");
        };

        assert!(controller.is_revealed(user.id));
        assert!(!controller.complete_reveal(user.id));
        assert_eq!(controller.mark_seen(user.id), SeenOutcome::Marked);
        assert_eq!(controller.mark_seen(MessageId::new()), SeenOutcome::NotFound);
    }

    #[tokio::test]
    async fn reply_after_dispose_is_discarded() {
        let backend = Arc::new(GatedBackend::default());
        let controller = controller_with(backend.clone());

        let pending = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit("hello").await }
        });
        backend.started.notified().await;

        controller.dispose();
        backend.release.notify_one();

        let outcome = pending.await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Discarded { .. }));
        assert_eq!(controller.current_log().len(), 2);
        assert!(!controller.status().busy);
        assert!(!controller.is_alive());
    }

    #[tokio::test]
    async fn submit_after_dispose_sends_nothing() {
        let backend = ScriptedBackend::replying([]);
        let controller = controller_with(backend.clone());
        let before = controller.current_log().len();

        controller.dispose();
        let outcome = controller.submit("hello").await;

        assert_eq!(outcome.rejection(), Some(Rejection::Disposed));
        assert_eq!(backend.calls(), 0);
        assert_eq!(controller.current_log().len(), before);
    }

    #[tokio::test]
    async fn invalid_config_disables_sending() {
        let backend = ScriptedBackend::replying([]);
        let config = WidgetConfig {
            maintenance_window_minutes: 1_000_000_000_000,
            ..WidgetConfig::default()
        };
        let controller = SessionController::builder(
            Arc::new(MemoryStorage::new()),
            BackendSlot::Ready(backend.clone()),
        )
        .config(config)
        .build();

        assert_eq!(
            controller.submit("hello").await.rejection(),
            Some(Rejection::InvalidConfig)
        );
        assert_eq!(backend.calls(), 0);
        let reason = controller.status().config_error.unwrap();
        assert!(reason.contains("maintenance_window_minutes"));

        controller.handle_signal(HostSignal::MaintenanceActive {
            message: String::new(),
        });
        let maintenance = controller.status().maintenance.unwrap();
        assert!(maintenance.active);
        assert_eq!(maintenance.estimated_end, None);
    }

    #[tokio::test]
    async fn reply_lands_in_identity_captured_at_submit() {
        let backend = Arc::new(GatedBackend::default());
        let controller = controller_with(backend.clone());
        controller.sign_in(Identity::new("u1"));

        let pending = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit("hello").await }
        });
        backend.started.notified().await;

        controller.sign_out();
        backend.release.notify_one();
        pending.await.unwrap();

        let u1 = controller.log_for(&IdentityKey::from("u1"));
        assert_eq!(u1.last().map(|m| m.content.as_str()), Some("re: hello"));
        assert_eq!(controller.current_log().len(), 1);
    }

    #[tokio::test]
    async fn reset_clears_history_and_reseeds() {
        let controller = controller_with(ScriptedBackend::replying([]));
        controller.submit("hello").await;
        assert_eq!(controller.current_log().len(), 3);

        controller.reset();

        let log = controller.current_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].content, "Hi");
    }

    #[tokio::test]
    async fn history_survives_restart() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let slot = BackendSlot::Ready(ScriptedBackend::replying([Ok("world".to_string())]));

        let first = SessionController::builder(storage.clone(), slot.clone()).build();
        first.sign_in(Identity::new("u1"));
        first.submit("hello").await;
        first.dispose();

        let second = SessionController::builder(storage, slot).build();
        let log = second.current_log();
        assert_eq!(second.status().identity, Some(Identity::new("u1")));
        assert_eq!(log.len(), 3);
        assert_eq!(log[2].content, "world");
    }

    #[test]
    fn maintenance_status_is_exposed() {
        let controller = controller_with(ScriptedBackend::replying([]));
        assert!(controller.status().maintenance.is_none());

        controller.handle_signal(MaintenanceSignal::Active { message: String::new() }.into());

        let status = controller.status().maintenance.unwrap();
        assert!(status.active);
        assert_eq!(status.message, "System is under maintenance");
    }
}
