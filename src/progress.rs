//! Progress-callback trait for per-turn chat events.
//!
//! Inject an [`Arc<dyn TurnProgressCallback>`] via
//! [`crate::config::ChatConfigBuilder::progress_callback`] to observe a turn
//! while it runs: which candidate model is being probed, which one was
//! selected, and how the turn ended. Hosts use it to drive a "thinking"
//! indicator or to forward events to their own telemetry.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docchat::{ChatConfig, TurnProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct ProbeCounter {
//!     probes: AtomicUsize,
//! }
//!
//! impl TurnProgressCallback for ProbeCounter {
//!     fn on_probe_start(&self, model: &str, attempt: usize, candidates: usize) {
//!         self.probes.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("probing {model} ({attempt}/{candidates})");
//!     }
//! }
//!
//! let config = ChatConfig::builder()
//!     .api_key("test-key")
//!     .progress_callback(Arc::new(ProbeCounter { probes: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the chat engine as it works through a turn.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: the server
/// runs turns for different sessions on different worker threads.
pub trait TurnProgressCallback: Send + Sync {
    /// Called once the prompt has been assembled, before any model call.
    fn on_turn_start(&self, prompt_chars: usize) {
        let _ = prompt_chars;
    }

    /// Called before a candidate model is probed.
    ///
    /// # Arguments
    /// * `model`      — candidate identifier
    /// * `attempt`    — 1-indexed position in the candidate list
    /// * `candidates` — length of the candidate list
    fn on_probe_start(&self, model: &str, attempt: usize, candidates: usize) {
        let _ = (model, attempt, candidates);
    }

    /// Called when a candidate fails to construct or to answer the probe.
    fn on_probe_failed(&self, model: &str, error: &str) {
        let _ = (model, error);
    }

    /// Called when a candidate is chosen for the real prompt.
    fn on_model_selected(&self, model: &str) {
        let _ = model;
    }

    /// Called when the reply has been recorded in the session.
    fn on_turn_complete(&self, model: &str, reply_chars: usize) {
        let _ = (model, reply_chars);
    }

    /// Called when the turn is aborted.
    fn on_turn_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl TurnProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ChatConfig`].
pub type ProgressCallback = Arc<dyn TurnProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        probes: AtomicUsize,
        failures: AtomicUsize,
        selected: Mutex<Option<String>>,
    }

    impl TurnProgressCallback for TrackingCallback {
        fn on_probe_start(&self, _model: &str, _attempt: usize, _candidates: usize) {
            self.probes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_probe_failed(&self, _model: &str, _error: &str) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }

        fn on_model_selected(&self, model: &str) {
            *self.selected.lock().unwrap() = Some(model.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_turn_start(10);
        cb.on_probe_start("gemini-pro", 1, 3);
        cb.on_probe_failed("gemini-pro", "404");
        cb.on_model_selected("gemini-1.5-pro");
        cb.on_turn_complete("gemini-1.5-pro", 42);
        cb.on_turn_error("boom");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_probe_start("a", 1, 2);
        tracker.on_probe_failed("a", "404");
        tracker.on_probe_start("b", 2, 2);
        tracker.on_model_selected("b");

        assert_eq!(tracker.probes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.failures.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.selected.lock().unwrap().as_deref(), Some("b"));
    }
}
