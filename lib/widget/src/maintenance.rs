//! Externally signaled maintenance windows.
//!
//! The monitor starts out unknown, which permits sends and shows no banner.
//! Two named host events move it between active and inactive. The estimated
//! end of an active window is a placeholder: signal arrival plus a fixed
//! window length.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::info;

/// Host event announcing a maintenance window.
pub const ACTIVE_EVENT: &str = "maintenance-active";

/// Host event announcing the end of maintenance.
pub const INACTIVE_EVENT: &str = "maintenance-inactive";

/// Text used when an active signal carries no message.
pub const DEFAULT_ACTIVE_MESSAGE: &str = "System is under maintenance";

/// Text carried by every inactive transition.
pub const OPERATIONAL_MESSAGE: &str = "System is operational";

/// Snapshot of the maintenance state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceStatus {
    /// Whether sends are blocked.
    pub active: bool,
    /// Human-readable explanation.
    pub message: String,
    /// Expected end of an active window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_end: Option<DateTime<Utc>>,
}

/// A maintenance transition received from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaintenanceSignal {
    /// Maintenance started.
    Active { message: String },
    /// Maintenance ended.
    Inactive,
}

impl MaintenanceSignal {
    /// Parses a named host event. Unrelated event names yield `None`.
    #[must_use]
    pub fn from_event(name: &str, payload: Option<&str>) -> Option<Self> {
        match name {
            ACTIVE_EVENT => Some(Self::Active {
                message: payload.unwrap_or_default().to_string(),
            }),
            INACTIVE_EVENT => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Tracks the current maintenance window.
#[derive(Debug, Clone)]
pub struct MaintenanceMonitor {
    status: Option<MaintenanceStatus>,
    /// `None` if the window is too large to represent.
    window: Option<TimeDelta>,
}

impl MaintenanceMonitor {
    /// Creates a monitor in the unknown state.
    #[must_use]
    pub fn new(window_minutes: i64) -> Self {
        Self {
            status: None,
            window: TimeDelta::try_minutes(window_minutes),
        }
    }

    /// Returns the last known status, or `None` if no signal arrived yet.
    #[must_use]
    pub fn status(&self) -> Option<&MaintenanceStatus> {
        self.status.as_ref()
    }

    /// Returns true if a maintenance window is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.active)
    }

    /// Returns the status to show as a banner: only an active window.
    #[must_use]
    pub fn banner(&self) -> Option<&MaintenanceStatus> {
        self.status.as_ref().filter(|s| s.active)
    }

    /// Applies a signal arriving now.
    pub fn apply(&mut self, signal: MaintenanceSignal) {
        self.apply_at(signal, Utc::now());
    }

    /// Applies a signal that arrived at `now`.
    pub fn apply_at(&mut self, signal: MaintenanceSignal, now: DateTime<Utc>) {
        let status = match signal {
            MaintenanceSignal::Active { message } => {
                let message = if message.trim().is_empty() {
                    DEFAULT_ACTIVE_MESSAGE.to_string()
                } else {
                    message
                };
                let estimated_end = self.window.and_then(|w| now.checked_add_signed(w));
                info!(message = %message, estimated_end = ?estimated_end, "maintenance started");
                MaintenanceStatus {
                    active: true,
                    message,
                    estimated_end,
                }
            }
            MaintenanceSignal::Inactive => {
                info!("maintenance ended");
                MaintenanceStatus {
                    active: false,
                    message: OPERATIONAL_MESSAGE.to_string(),
                    estimated_end: None,
                }
            }
        };
        self.status = Some(status);
    }
}

impl Default for MaintenanceMonitor {
    fn default() -> Self {
        Self::new(30)
    }
}
