//! Feedback-correction workflow.
//!
//! Drives the label lifecycle: `unreviewed` records become `confirmed` on
//! agreement or go through a stricter second review on disagreement, which
//! always overwrites the stored ground-truth label when it succeeds.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dataset::{DatasetStore, FeedbackKind};
use crate::error::AppResult;
use crate::verdict::{FinalLabel, VerdictAnalyzer};

/// Outcome status of a feedback submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    /// Feedback stored against an existing record.
    Recorded,
    /// No record matches the message; nothing was updated. Not an error —
    /// feedback can race the deferred save and callers need not retry.
    NotFound,
}

/// Result of processing one feedback submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackOutcome {
    pub status: FeedbackStatus,
    pub label_changed: bool,
    /// The corrected verdict from the second review, when one ran and
    /// succeeded.
    pub new_verdict: Option<FinalLabel>,
}

impl FeedbackOutcome {
    fn not_found() -> Self {
        Self {
            status: FeedbackStatus::NotFound,
            label_changed: false,
            new_verdict: None,
        }
    }

    fn recorded() -> Self {
        Self {
            status: FeedbackStatus::Recorded,
            label_changed: false,
            new_verdict: None,
        }
    }
}

/// Human-in-the-loop correction workflow over the dataset store.
#[derive(Clone)]
pub struct FeedbackWorkflow {
    analyzer: VerdictAnalyzer,
    store: Arc<dyn DatasetStore>,
}

impl FeedbackWorkflow {
    /// Create a new workflow
    pub fn new(analyzer: VerdictAnalyzer, store: Arc<dyn DatasetStore>) -> Self {
        Self { analyzer, store }
    }

    /// Process an agree/disagree submission for a previously analyzed
    /// message.
    ///
    /// The feedback itself is persisted first and survives regardless of
    /// what the second review does. Agreement never touches the label.
    /// Disagreement triggers the second review; its verdict always
    /// overwrites the stored label, even when it matches the prior value.
    /// A failed review leaves the label untouched.
    pub async fn process(
        &self,
        text: &str,
        feedback: FeedbackKind,
        reason: &str,
    ) -> AppResult<FeedbackOutcome> {
        let found = self.store.update_feedback(text, feedback, reason).await?;
        if !found {
            info!(feedback = %feedback, "Feedback for unknown message");
            return Ok(FeedbackOutcome::not_found());
        }

        if feedback == FeedbackKind::Agree {
            info!("Feedback recorded, verdict confirmed");
            return Ok(FeedbackOutcome::recorded());
        }

        // Disagreement always produces a review cycle, not just a
        // conditional correction.
        match self.analyzer.second_review(text, reason).await {
            Ok(label) => {
                let updated = self.store.update_final_label(text, label).await?;
                info!(new_label = %label, updated, "Second review overwrote label");
                Ok(FeedbackOutcome {
                    status: FeedbackStatus::Recorded,
                    label_changed: updated,
                    new_verdict: Some(label),
                })
            }
            Err(e) => {
                warn!(error = %e, "Second review failed, label left untouched");
                Ok(FeedbackOutcome::recorded())
            }
        }
    }
}
