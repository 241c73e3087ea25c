//! Progress-callback trait for analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalyzerConfigBuilder::progress_callback`] to keep a UI
//! responsive while the single inference call is in flight (spinner, status
//! line, disabled submit button, …).
//!
//! # Example
//!
//! ```rust
//! use resume_audit::{AnalysisProgressCallback, AnalyzerConfig};
//! use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
//!
//! struct Busy(AtomicBool);
//!
//! impl AnalysisProgressCallback for Busy {
//!     fn on_request_sent(&self, _backend: &str) {
//!         self.0.store(true, Ordering::SeqCst);
//!     }
//!     fn on_complete(&self, _score: f64, _elapsed_ms: u64) {
//!         self.0.store(false, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = AnalyzerConfig::builder()
//!     .progress_callback(Arc::new(Busy(AtomicBool::new(false))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline at each step of one analysis attempt.
///
/// All methods default to no-ops so callers only override what they need.
pub trait AnalysisProgressCallback: Send + Sync {
    /// The file and job details passed validation.
    fn on_validated(&self, display_name: &str, size_bytes: u64) {
        let _ = (display_name, size_bytes);
    }

    /// The request is about to be sent.
    fn on_request_sent(&self, backend: &str) {
        let _ = backend;
    }

    /// A result was decoded.
    fn on_complete(&self, overall_score: f64, elapsed_ms: u64) {
        let _ = (overall_score, elapsed_ms);
    }

    /// The attempt failed; `message` is the user-facing text.
    fn on_error(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalyzerConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: AtomicUsize,
        errors: Mutex<Vec<String>>,
    }

    impl AnalysisProgressCallback for Recorder {
        fn on_request_sent(&self, _backend: &str) {
            self.sent.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_validated("resume.pdf", 1024);
        cb.on_request_sent("gemini/x");
        cb.on_complete(80.0, 1200);
        cb.on_error("boom");
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Recorder::default();
        rec.on_request_sent("gemini/x");
        rec.on_error("quota");
        rec.on_complete(10.0, 5);
        assert_eq!(rec.sent.load(Ordering::SeqCst), 1);
        assert_eq!(*rec.errors.lock().unwrap(), vec!["quota".to_string()]);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_validated("a.png", 1);
    }
}
