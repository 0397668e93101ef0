//! Word-by-word reveal of finished assistant messages.
//!
//! [`Reveal`] is the pure disclosure sequence. [`RevealAnimator`] drives one
//! timer task per message and reports frames and completions over a channel.
//! Each started reveal gets a fresh epoch; events from a cancelled or
//! restarted reveal carry a stale epoch and are dropped on receipt, so a
//! cancelled reveal never changes state again.

use crate::config::RevealConfig;
use palaver_core::MessageId;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Incremental disclosure of one text, a word at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    words: Vec<String>,
    shown: usize,
}

impl Reveal {
    /// Splits `content` on whitespace.
    #[must_use]
    pub fn new(content: &str) -> Self {
        Self {
            words: content.split_whitespace().map(str::to_string).collect(),
            shown: 0,
        }
    }

    /// Discloses one more word and returns the text shown so far, or `None`
    /// once every word is shown.
    pub fn next_frame(&mut self) -> Option<String> {
        if self.shown >= self.words.len() {
            return None;
        }
        self.shown += 1;
        Some(self.words[..self.shown].join(" "))
    }

    /// Returns the number of words.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Returns true once every word is shown.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.shown >= self.words.len()
    }
}

/// Source of the pause before each reveal step.
pub trait DelaySource: Send + Sync {
    /// Returns the next pause.
    fn next_delay(&self) -> Duration;
}

/// Uniformly random pauses between two bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterDelay {
    min: Duration,
    max: Duration,
}

impl JitterDelay {
    /// Creates a source drawing from `min..=max`. Bounds are swapped if
    /// given in the wrong order.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }
}

impl From<RevealConfig> for JitterDelay {
    fn from(config: RevealConfig) -> Self {
        let (min, max) = config.bounds();
        Self::new(min, max)
    }
}

impl Default for JitterDelay {
    fn default() -> Self {
        RevealConfig::default().into()
    }
}

impl DelaySource for JitterDelay {
    fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

/// The same pause every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl DelaySource for FixedDelay {
    fn next_delay(&self) -> Duration {
        self.0
    }
}

/// What a reveal reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEventKind {
    /// The text to show now.
    Frame(String),
    /// The last word was shown. Sent once per reveal.
    Completed,
}

/// A report from a running reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealEvent {
    /// The message being revealed.
    pub id: MessageId,
    /// The reveal run that produced this event.
    pub epoch: u64,
    /// The report.
    pub kind: RevealEventKind,
}

struct RunningReveal {
    epoch: u64,
    content: String,
    task: JoinHandle<()>,
}

impl Drop for RunningReveal {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Runs reveals on timer tasks.
///
/// Must be used inside a Tokio runtime.
pub struct RevealAnimator {
    delay: Arc<dyn DelaySource>,
    events_tx: mpsc::UnboundedSender<RevealEvent>,
    events_rx: mpsc::UnboundedReceiver<RevealEvent>,
    running: HashMap<MessageId, RunningReveal>,
    next_epoch: u64,
}

impl RevealAnimator {
    /// Creates an animator pacing steps with `delay`.
    #[must_use]
    pub fn new(delay: Arc<dyn DelaySource>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            delay,
            events_tx,
            events_rx,
            running: HashMap::new(),
            next_epoch: 0,
        }
    }

    /// Starts revealing `content` for `id` and returns the run's epoch.
    ///
    /// If the same content is already being revealed, the running reveal is
    /// kept. Different content restarts from the first word.
    pub fn start(&mut self, id: MessageId, content: &str) -> u64 {
        if let Some(running) = self.running.get(&id)
            && running.content == content
        {
            return running.epoch;
        }

        let epoch = self.next_epoch;
        self.next_epoch += 1;

        let task = tokio::spawn(run_reveal(
            id,
            epoch,
            Reveal::new(content),
            self.delay.clone(),
            self.events_tx.clone(),
        ));

        if self
            .running
            .insert(
                id,
                RunningReveal {
                    epoch,
                    content: content.to_string(),
                    task,
                },
            )
            .is_some()
        {
            debug!(message_id = %id, epoch, "restarted reveal with new content");
        }
        epoch
    }

    /// Cancels the reveal of `id`. Returns true if one was running.
    pub fn cancel(&mut self, id: MessageId) -> bool {
        self.running.remove(&id).is_some()
    }

    /// Cancels every running reveal.
    pub fn cancel_all(&mut self) {
        self.running.clear();
    }

    /// Returns true if `id` is being revealed.
    #[must_use]
    pub fn is_running(&self, id: MessageId) -> bool {
        self.running.contains_key(&id)
    }

    /// Returns the ids being revealed.
    pub fn running(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.running.keys().copied()
    }

    /// Waits for the next event of a running reveal.
    ///
    /// Returns `None` immediately when nothing is running. A completion
    /// retires its reveal.
    pub async fn next_event(&mut self) -> Option<RevealEvent> {
        loop {
            if self.running.is_empty() {
                return None;
            }
            let event = self.events_rx.recv().await?;
            let current = self
                .running
                .get(&event.id)
                .is_some_and(|running| running.epoch == event.epoch);
            if !current {
                continue;
            }
            if event.kind == RevealEventKind::Completed {
                self.running.remove(&event.id);
            }
            return Some(event);
        }
    }
}

impl fmt::Debug for RevealAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevealAnimator")
            .field("running", &self.running.len())
            .field("next_epoch", &self.next_epoch)
            .finish_non_exhaustive()
    }
}

async fn run_reveal(
    id: MessageId,
    epoch: u64,
    mut reveal: Reveal,
    delay: Arc<dyn DelaySource>,
    events: mpsc::UnboundedSender<RevealEvent>,
) {
    loop {
        tokio::time::sleep(delay.next_delay()).await;
        let kind = match reveal.next_frame() {
            Some(text) => RevealEventKind::Frame(text),
            None => RevealEventKind::Completed,
        };
        let done = kind == RevealEventKind::Completed;
        if events.send(RevealEvent { id, epoch, kind }).is_err() || done {
            return;
        }
    }
}
