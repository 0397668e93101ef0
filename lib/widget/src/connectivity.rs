//! Host reachability.

use tracing::info;

/// Tracks whether the host can reach the network.
///
/// The state changes only through explicit transition signals; nothing polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityMonitor {
    online: bool,
}

impl ConnectivityMonitor {
    /// Creates a monitor seeded from the host's reachability indicator.
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self { online }
    }

    /// Returns true if the host is reachable.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Applies a "became reachable" signal. Returns true if the state changed.
    pub fn went_online(&mut self) -> bool {
        self.transition(true)
    }

    /// Applies a "became unreachable" signal. Returns true if the state changed.
    pub fn went_offline(&mut self) -> bool {
        self.transition(false)
    }

    fn transition(&mut self, online: bool) -> bool {
        if self.online == online {
            return false;
        }
        self.online = online;
        info!(online, "connectivity changed");
        true
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}
