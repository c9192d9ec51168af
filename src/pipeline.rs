//! Analysis pipeline.
//!
//! Wires the verdict analyzer, calibration engine, local classifier, and
//! dataset store together: text goes in, a calibrated [`AnalysisResult`]
//! comes out, and persistence happens afterwards on its own task so it can
//! never delay or fail the caller's response.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::calibration::{derive_label, CalibrationWeights};
use crate::classifier::LocalClassifier;
use crate::dataset::{DatasetStore, NewPrediction};
use crate::error::{AppError, AppResult};
use crate::verdict::{FinalLabel, HighlightedPhrase, ScamCategory, Verdict, VerdictAnalyzer};

/// The verdict shape returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Final probability in [0, 1], after calibration and the optional
    /// local-classifier blend.
    pub probability: f64,
    pub category: ScamCategory,
    pub red_flags: Vec<String>,
    pub highlighted_phrases: Vec<HighlightedPhrase>,
    pub psychology_explainer: String,
    pub advice: String,
    /// Local classifier score, when that model was available.
    pub ml_score: Option<f64>,
}

/// One analysis plus the ground-truth label derived for the dataset.
///
/// The label comes from the calibrated (pre-local-blend) probability, which
/// is what the calibration engine reports as the LLM-side verdict.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub result: AnalysisResult,
    pub label: FinalLabel,
}

/// Orchestrates one analysis request end to end.
#[derive(Clone)]
pub struct AnalysisEngine {
    analyzer: VerdictAnalyzer,
    classifier: Arc<dyn LocalClassifier>,
    store: Arc<dyn DatasetStore>,
    weights: CalibrationWeights,
}

impl AnalysisEngine {
    /// Create a new engine
    pub fn new(
        analyzer: VerdictAnalyzer,
        classifier: Arc<dyn LocalClassifier>,
        store: Arc<dyn DatasetStore>,
        weights: CalibrationWeights,
    ) -> Self {
        Self {
            analyzer,
            classifier,
            store,
            weights,
        }
    }

    /// Analyze a message: verdict, calibration, optional local blend.
    ///
    /// A degraded model call still yields a normal-looking result via the
    /// fallback verdict; only empty input is rejected. The fallback carries
    /// a fixed 0.5 probability and skips calibration and the local blend,
    /// so an outage reads as "could not tell" rather than confidently
    /// benign.
    pub async fn analyze(&self, text: &str) -> AppResult<Analysis> {
        if text.trim().is_empty() {
            return Err(AppError::Validation {
                field: "message".to_string(),
                reason: "Message cannot be empty".to_string(),
            });
        }

        let verdict = match self.analyzer.analyze(text).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(
                    error = %e,
                    unavailable = e.is_unavailable(),
                    "Verdict analysis failed, using fallback"
                );
                return Ok(Self::fallback_analysis());
            }
        };
        let calibrated = self.weights.calibrate_verdict(&verdict);

        let ml_score = self.classifier.classify(text);
        let probability = match ml_score {
            Some(score) => self.weights.blend_local(calibrated, score),
            None => calibrated,
        };

        let label = derive_label(verdict.category, calibrated);

        info!(
            category = %verdict.category,
            probability,
            calibrated,
            ml_score = ?ml_score,
            flags = verdict.red_flags.len(),
            "Analysis completed"
        );

        Ok(Analysis {
            result: AnalysisResult {
                probability,
                category: verdict.category,
                red_flags: verdict.red_flags,
                highlighted_phrases: verdict.highlighted_phrases,
                psychology_explainer: verdict.psychology_explainer,
                advice: verdict.advice,
                ml_score,
            },
            label,
        })
    }

    // The fallback verdict is reported as-is on the 0-1 scale, uncalibrated.
    fn fallback_analysis() -> Analysis {
        let fallback = Verdict::fallback();
        let probability = fallback.probability / 100.0;
        let label = derive_label(fallback.category, probability);

        Analysis {
            result: AnalysisResult {
                probability,
                category: fallback.category,
                red_flags: fallback.red_flags,
                highlighted_phrases: fallback.highlighted_phrases,
                psychology_explainer: fallback.psychology_explainer,
                advice: fallback.advice,
                ml_score: None,
            },
            label,
        }
    }

    /// Persist an analysis on a detached task, after the response is out.
    ///
    /// Duplicates and short messages are skipped by the store; store
    /// failures are logged and swallowed. Feedback arriving before this
    /// completes simply finds no record, which callers tolerate.
    pub fn spawn_persist(&self, text: &str, analysis: &Analysis) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let prediction = NewPrediction {
            message_text: text.trim().to_string(),
            local_model_prediction: analysis
                .result
                .ml_score
                .map(|s| if s >= 0.5 { "SCAM" } else { "SAFE" }.to_string()),
            local_model_score: analysis.result.ml_score,
            llm_prediction: analysis.result.category.to_string(),
            final_label: analysis.label,
            red_flags: analysis.result.red_flags.clone(),
            psychology_tags: analysis.result.psychology_explainer.clone(),
            advice: analysis.result.advice.clone(),
        };

        tokio::spawn(async move {
            match store.save_initial_prediction(&prediction).await {
                Ok(Some(id)) => debug!(id = %id, "Stored analysis for training"),
                Ok(None) => debug!("Analysis not stored (duplicate or too short)"),
                Err(e) => warn!(error = %e, "Failed to store analysis"),
            }
        })
    }
}
