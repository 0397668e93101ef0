//! Viewport visibility of unseen messages.
//!
//! Display surfaces implement [`VisibilityObserver`]. [`ViewportTracker`] is
//! the built-in implementation for hosts that report visible ratios
//! themselves, and for tests.

use palaver_core::MessageId;
use std::collections::HashMap;
use std::fmt;

/// Fraction of a message that must be visible for it to count as seen.
pub const VISIBILITY_THRESHOLD: f64 = 0.5;

/// Callback fired when a watched message becomes visible.
pub type OnVisible = Box<dyn FnOnce(MessageId) + Send>;

/// Watches messages for viewport entry.
pub trait VisibilityObserver: Send {
    /// Starts watching `id`. `on_visible` fires at most once, the first time
    /// the message is visible enough; watching then stops. Observing an
    /// already watched message replaces its callback.
    fn observe(&mut self, id: MessageId, on_visible: OnVisible);

    /// Stops watching `id` without firing.
    fn unobserve(&mut self, id: MessageId);

    /// Returns true if `id` is being watched.
    fn is_observing(&self, id: MessageId) -> bool;

    /// Stops watching everything.
    fn clear(&mut self);
}

/// Observer fed with visible ratios by the host.
pub struct ViewportTracker {
    watched: HashMap<MessageId, OnVisible>,
    threshold: f64,
}

impl ViewportTracker {
    /// Creates a tracker with the default threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::with_threshold(VISIBILITY_THRESHOLD)
    }

    /// Creates a tracker firing at `threshold` visible.
    #[must_use]
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            watched: HashMap::new(),
            threshold,
        }
    }

    /// Reports that `ratio` of message `id` is visible.
    ///
    /// Returns true if this report fired the callback.
    pub fn report(&mut self, id: MessageId, ratio: f64) -> bool {
        if ratio < self.threshold {
            return false;
        }
        match self.watched.remove(&id) {
            Some(on_visible) => {
                on_visible(id);
                true
            }
            None => false,
        }
    }

    /// Returns the number of watched messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.watched.len()
    }

    /// Returns true if nothing is watched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }
}

impl Default for ViewportTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityObserver for ViewportTracker {
    fn observe(&mut self, id: MessageId, on_visible: OnVisible) {
        self.watched.insert(id, on_visible);
    }

    fn unobserve(&mut self, id: MessageId) {
        self.watched.remove(&id);
    }

    fn is_observing(&self, id: MessageId) -> bool {
        self.watched.contains_key(&id)
    }

    fn clear(&mut self) {
        self.watched.clear();
    }
}

impl fmt::Debug for ViewportTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportTracker")
            .field("watched", &self.watched.len())
            .field("threshold", &self.threshold)
            .finish()
    }
}
