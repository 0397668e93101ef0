//! Host callbacks.

use palaver_conversation::Message;
use std::fmt;
use std::sync::Arc;

/// Callback receiving a message.
pub type MessageHook = Arc<dyn Fn(&Message) + Send + Sync>;

/// Callback with no arguments.
pub type SignalHook = Arc<dyn Fn() + Send + Sync>;

/// Optional callbacks invoked by the session controller.
///
/// Hooks run outside the session lock, so they may call back into the
/// controller.
#[derive(Clone, Default)]
pub struct SessionHooks {
    /// Called after a user message is admitted and appended.
    pub on_message_sent: Option<MessageHook>,
    /// Called after a successful assistant reply is appended.
    pub on_message_received: Option<MessageHook>,
    /// Called when a submit is refused for lack of a signed-in identity.
    pub on_login_required: Option<SignalHook>,
}

impl SessionHooks {
    /// Creates an empty set of hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sent-message hook.
    #[must_use]
    pub fn on_message_sent(mut self, hook: impl Fn(&Message) + Send + Sync + 'static) -> Self {
        self.on_message_sent = Some(Arc::new(hook));
        self
    }

    /// Sets the received-message hook.
    #[must_use]
    pub fn on_message_received(
        mut self,
        hook: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.on_message_received = Some(Arc::new(hook));
        self
    }

    /// Sets the login-required hook.
    #[must_use]
    pub fn on_login_required(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_login_required = Some(Arc::new(hook));
        self
    }

    pub(crate) fn message_sent(&self, message: &Message) {
        if let Some(hook) = &self.on_message_sent {
            hook(message);
        }
    }

    pub(crate) fn message_received(&self, message: &Message) {
        if let Some(hook) = &self.on_message_received {
            hook(message);
        }
    }

    pub(crate) fn login_required(&self) {
        if let Some(hook) = &self.on_login_required {
            hook();
        }
    }
}

impl fmt::Debug for SessionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHooks")
            .field("on_message_sent", &self.on_message_sent.is_some())
            .field("on_message_received", &self.on_message_received.is_some())
            .field("on_login_required", &self.on_login_required.is_some())
            .finish()
    }
}
