//! Error handling foundation for palaver.
//!
//! Only the `Result` alias lives here. Domain errors belong to the crate
//! that raises them (`StorageError`, `BackendError`, `WidgetError`) and are
//! wrapped in a rootcause [`Report`] where they cross a layer.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
