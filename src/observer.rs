//! Observer trait for conversion session events.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via
//! [`crate::session::ConversionSession::with_observer`] to be told when the
//! session changes state, when a report arrives, and when something must be
//! brought to the user's attention.
//!
//! `on_alert` is the session's only way of reporting user-facing problems
//! (missing PDF on submit, a non-PDF in the PDF slot, a failed conversion).
//! A terminal front end prints it; a GUI would show a modal.
//!
//! # Example
//!
//! ```rust
//! use pdf2pubmed::{ConversionState, SessionObserver};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct AlertLog {
//!     alerts: Mutex<Vec<String>>,
//! }
//!
//! impl SessionObserver for AlertLog {
//!     fn on_alert(&self, message: &str) {
//!         self.alerts.lock().unwrap().push(message.to_string());
//!     }
//! }
//!
//! let log = AlertLog::default();
//! log.on_alert("Please select a PDF file");
//! log.on_state_change(ConversionState::Idle, ConversionState::Converting);
//! assert_eq!(log.alerts.lock().unwrap().len(), 1);
//! ```

use crate::archive::ValidationReport;
use crate::session::ConversionState;
use std::sync::Arc;

/// Receives session events. All methods default to no-ops.
pub trait SessionObserver: Send + Sync {
    /// A message the user must see before continuing.
    fn on_alert(&self, message: &str) {
        let _ = message;
    }

    /// The session moved between states. Only fired when `from != to`.
    fn on_state_change(&self, from: ConversionState, to: ConversionState) {
        let _ = (from, to);
    }

    /// A successful conversion produced a validation report.
    fn on_report(&self, report: &ValidationReport) {
        let _ = report;
    }
}

/// A no-op implementation for callers that don't need session events.
///
/// This is the default when no observer is configured.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Convenience alias matching the type stored in the session.
pub type SharedObserver = Arc<dyn SessionObserver>;
