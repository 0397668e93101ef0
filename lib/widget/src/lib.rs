//! Chat widget session controller for palaver.
//!
//! This crate turns user input and backend replies into one persisted
//! conversation thread:
//!
//! - **Monitors**: Connectivity and maintenance state, changed only by host signals
//! - **Identity**: The signed-in identity that selects the active log
//! - **Send Pipeline**: Ordered admission gates and a single in-flight round trip
//! - **Reveal**: Word-by-word disclosure of finished assistant replies
//! - **Visibility**: One-shot "seen" detection for unseen messages
//! - **Controller**: The session facade consumed by presentation
//! - **View**: Coordinator driving reveal and visibility from the controller

pub mod config;
pub mod connectivity;
pub mod controller;
pub mod error;
pub mod hooks;
pub mod identity;
pub mod maintenance;
pub mod pipeline;
pub mod reveal;
mod state;
pub mod view;
pub mod visibility;

pub use config::{RevealConfig, WidgetConfig};
pub use connectivity::ConnectivityMonitor;
pub use controller::{
    HostSignal, SeenOutcome, SessionController, SessionControllerBuilder, SessionStatus,
};
pub use error::{Rejection, WidgetError};
pub use hooks::SessionHooks;
pub use identity::{Identity, IdentityState};
pub use maintenance::{MaintenanceMonitor, MaintenanceSignal, MaintenanceStatus};
pub use pipeline::{Gates, SubmitOutcome};
pub use reveal::{DelaySource, FixedDelay, JitterDelay, Reveal, RevealAnimator, RevealEvent};
pub use view::{ChatView, ViewUpdate};
pub use visibility::{ViewportTracker, VisibilityObserver};
