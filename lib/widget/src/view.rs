//! Presentation coordinator tying the controller to reveal and visibility.
//!
//! A [`ChatView`] decides what text each message shows right now. New
//! assistant messages are revealed word by word; everything else shows in
//! full. A message is armed for visibility once it is fully shown and still
//! new, and the visibility callback marks it seen through the controller.

use crate::controller::SessionController;
use crate::reveal::{DelaySource, RevealAnimator, RevealEventKind};
use crate::visibility::{ViewportTracker, VisibilityObserver};
use palaver_conversation::Message;
use palaver_core::MessageId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A change to what the view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    /// A revealing message shows more text.
    Frame { id: MessageId, text: String },
    /// A message finished revealing.
    Revealed { id: MessageId },
}

/// Drives reveal and visibility for one controller.
pub struct ChatView<O: VisibilityObserver = ViewportTracker> {
    controller: SessionController,
    animator: RevealAnimator,
    observer: O,
    displayed: HashMap<MessageId, String>,
}

impl ChatView<ViewportTracker> {
    /// Creates a view using the built-in viewport tracker.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn new(controller: SessionController, delay: Arc<dyn DelaySource>) -> Self {
        Self::with_observer(controller, delay, ViewportTracker::new())
    }

    /// Reports that `ratio` of message `id` is visible.
    ///
    /// Returns true if this marked the message seen.
    pub fn report_visibility(&mut self, id: MessageId, ratio: f64) -> bool {
        self.observer.report(id, ratio)
    }
}

impl<O: VisibilityObserver> ChatView<O> {
    /// Creates a view with a host-provided visibility observer.
    #[must_use]
    pub fn with_observer(
        controller: SessionController,
        delay: Arc<dyn DelaySource>,
        observer: O,
    ) -> Self {
        Self {
            controller,
            animator: RevealAnimator::new(delay),
            observer,
            displayed: HashMap::new(),
        }
    }

    /// Returns the controller.
    #[must_use]
    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Returns the visibility observer.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Reconciles the view with the current log and returns it.
    ///
    /// Starts reveals for new assistant messages, shows everything else in
    /// full, arms visibility for fully shown new messages, and forgets
    /// messages that left the log.
    pub fn sync(&mut self) -> Vec<Message> {
        let log = self.controller.current_log();
        let present: HashSet<MessageId> = log.iter().map(|m| m.id).collect();

        let stale: Vec<MessageId> = self
            .displayed
            .keys()
            .copied()
            .filter(|id| !present.contains(id))
            .collect();
        for id in stale {
            self.displayed.remove(&id);
            self.animator.cancel(id);
            self.observer.unobserve(id);
        }

        for message in &log {
            if message.is_assistant() && message.is_new && !self.controller.is_revealed(message.id)
            {
                self.animator.start(message.id, &message.content);
                self.displayed.entry(message.id).or_default();
                continue;
            }

            self.displayed.insert(message.id, message.content.clone());
            if message.is_new && !self.observer.is_observing(message.id) {
                self.arm(message.id);
            }
        }

        log
    }

    /// Waits for the next reveal step and applies it.
    ///
    /// Returns `None` immediately when nothing is revealing.
    pub async fn next_update(&mut self) -> Option<ViewUpdate> {
        let event = self.animator.next_event().await?;
        let id = event.id;
        match event.kind {
            RevealEventKind::Frame(text) => {
                self.displayed.insert(id, text.clone());
                Some(ViewUpdate::Frame { id, text })
            }
            RevealEventKind::Completed => {
                if self.controller.complete_reveal(id) {
                    self.arm(id);
                }
                Some(ViewUpdate::Revealed { id })
            }
        }
    }

    /// Returns the text message `id` shows now.
    #[must_use]
    pub fn displayed_text(&self, id: MessageId) -> Option<&str> {
        self.displayed.get(&id).map(String::as_str)
    }

    /// Returns true while message `id` is revealing.
    #[must_use]
    pub fn is_revealing(&self, id: MessageId) -> bool {
        self.animator.is_running(id)
    }

    /// Stops every reveal and visibility watch.
    pub fn teardown(&mut self) {
        self.animator.cancel_all();
        self.observer.clear();
    }

    fn arm(&mut self, id: MessageId) {
        let controller = self.controller.clone();
        self.observer.observe(
            id,
            Box::new(move |id| {
                controller.mark_seen(id);
            }),
        );
    }
}
