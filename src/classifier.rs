//! Local classifier adapter.
//!
//! The offline model is an optional enrichment signal. It is injected into
//! the pipeline as a trait object rather than loaded as global state, so
//! tests can substitute doubles that simulate "unavailable" without touching
//! a real model.

/// Offline scam classifier seam.
///
/// `classify` returns `None` whenever the model was never loaded or
/// inference fails for any reason; callers treat that as "skip this
/// signal", never as an error to propagate.
pub trait LocalClassifier: Send + Sync {
    /// Scam probability in [0.0, 1.0], or `None` when unavailable.
    fn classify(&self, text: &str) -> Option<f64>;

    /// Load status, for observability only. Calls are not gated on it.
    fn is_available(&self) -> bool;
}

/// Stand-in used when no local model has been loaded.
///
/// Always unavailable; the pipeline then skips the local blend entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnloadedClassifier;

impl LocalClassifier for UnloadedClassifier {
    fn classify(&self, _text: &str) -> Option<f64> {
        None
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Classifier returning a fixed score, for wiring tests and demos.
#[derive(Debug, Clone, Copy)]
pub struct FixedScoreClassifier {
    score: f64,
}

impl FixedScoreClassifier {
    /// Create a classifier that always reports `score` (clamped to [0, 1]).
    pub fn new(score: f64) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
        }
    }
}

impl LocalClassifier for FixedScoreClassifier {
    fn classify(&self, _text: &str) -> Option<f64> {
        Some(self.score)
    }

    fn is_available(&self) -> bool {
        true
    }
}
