//! The send pipeline: admission gating and one backend round trip.
//!
//! Admission runs under the session lock and either refuses with no side
//! effect or appends the user message and raises `busy` before the lock is
//! released. The backend is awaited without the lock; its reply (or the
//! fixed text for its failure) is appended afterwards under the identity
//! captured at admission, unless the session was disposed in the meantime.

use crate::error::Rejection;
use crate::state::{Session, SessionState};
use palaver_ai::BackendErrorKind;
use palaver_conversation::Message;
use tracing::{debug, warn};

/// Preconditions of a send, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gates {
    /// The session has not been disposed.
    pub alive: bool,
    /// The text has visible content.
    pub has_text: bool,
    /// The widget configuration passed validation.
    pub config_valid: bool,
    /// A backend adapter is available.
    pub backend_ready: bool,
    /// A send is in flight.
    pub busy: bool,
    /// An identity lookup is in progress.
    pub resolving: bool,
    /// A maintenance window is active.
    pub maintenance_active: bool,
    /// The host is reachable.
    pub online: bool,
    /// Sending requires a signed-in identity.
    pub require_auth: bool,
    /// Somebody is signed in.
    pub signed_in: bool,
}

impl Gates {
    fn capture(state: &SessionState, session: &Session, text: &str) -> Self {
        Self {
            alive: state.alive,
            has_text: !text.trim().is_empty(),
            config_valid: !session.config_invalid,
            backend_ready: session.backend.backend().is_some(),
            busy: state.busy,
            resolving: state.identity.is_resolving(),
            maintenance_active: state.maintenance.is_active(),
            online: state.connectivity.is_online(),
            require_auth: session.config.require_auth,
            signed_in: state.identity.current().is_some(),
        }
    }
}

/// Checks the gates in order and returns the first failure.
///
/// # Errors
///
/// Returns the reason the send must not proceed.
pub fn admit(gates: &Gates) -> Result<(), Rejection> {
    if !gates.alive {
        return Err(Rejection::Disposed);
    }
    if !gates.has_text {
        return Err(Rejection::EmptyInput);
    }
    if !gates.config_valid {
        return Err(Rejection::InvalidConfig);
    }
    if !gates.backend_ready {
        return Err(Rejection::BackendUnavailable);
    }
    if gates.busy {
        return Err(Rejection::Busy);
    }
    if gates.resolving {
        return Err(Rejection::ResolvingIdentity);
    }
    if gates.maintenance_active {
        return Err(Rejection::Maintenance);
    }
    if !gates.online {
        return Err(Rejection::Offline);
    }
    if gates.require_auth && !gates.signed_in {
        return Err(Rejection::LoginRequired);
    }
    Ok(())
}

/// Result of a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was sent.
    Rejected(Rejection),
    /// The round trip finished and both messages were appended.
    Completed {
        /// The appended user message.
        user: Message,
        /// The appended assistant message, either the reply or the error text.
        reply: Message,
        /// The backend failure, if the reply is an error text.
        failure: Option<BackendErrorKind>,
    },
    /// The session was disposed before the reply arrived; it was dropped.
    Discarded {
        /// The appended user message.
        user: Message,
    },
}

impl SubmitOutcome {
    /// Returns true if the backend was called.
    #[must_use]
    pub fn was_sent(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }

    /// Returns the rejection, if the submit was refused.
    #[must_use]
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Rejected(rejection) => Some(*rejection),
            _ => None,
        }
    }
}

/// Clears `busy` when the round trip ends, however it ends.
struct BusyGuard<'a> {
    session: &'a Session,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.session.lock().busy = false;
    }
}

/// Runs one submit against `session`.
pub(crate) async fn submit(session: &Session, text: &str) -> SubmitOutcome {
    let admitted = {
        let mut state = session.lock();
        match admit(&Gates::capture(&state, session, text)) {
            Ok(()) => {
                let owner = state.identity.current().map(|i| i.id.clone());
                let user = Message::user(text, owner.clone());
                state.append(user.clone());
                state.input.clear();
                state.busy = true;
                Ok((user, owner))
            }
            Err(rejection) => {
                if rejection == Rejection::LoginRequired {
                    state.login_requested = true;
                }
                Err(rejection)
            }
        }
    };

    let (user, owner) = match admitted {
        Ok(admitted) => admitted,
        Err(rejection) => {
            debug!(reason = %rejection, "submit refused");
            if rejection == Rejection::LoginRequired {
                session.hooks.login_required();
            }
            return SubmitOutcome::Rejected(rejection);
        }
    };
    let guard = BusyGuard { session };

    session.hooks.message_sent(&user);

    let result = match session.backend.backend() {
        Some(backend) => backend.send_message(text).await,
        None => {
            drop(guard);
            return SubmitOutcome::Rejected(Rejection::BackendUnavailable);
        }
    };

    let (reply, failure) = match result {
        Ok(content) => (Message::assistant(content, owner), None),
        Err(e) => {
            warn!(kind = %e.kind(), error = %e, "backend call failed");
            (Message::assistant(e.user_message(), owner), Some(e.kind()))
        }
    };

    {
        let mut state = session.lock();
        if !state.alive {
            debug!(message_id = %reply.id, "session disposed, discarding backend result");
            return SubmitOutcome::Discarded { user };
        }
        state.append(reply.clone());
    }
    drop(guard);

    if failure.is_none() {
        session.hooks.message_received(&reply);
    }

    SubmitOutcome::Completed {
        user,
        reply,
        failure,
    }
}
