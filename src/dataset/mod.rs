//! Training dataset store.
//!
//! Every analyzed message is persisted here (deduplicated on normalized
//! text) together with both signal sources, the calibrated label, and user
//! feedback. Over time this builds a self-improving, human-verified
//! training dataset. Only the message text is stored — no user identifiers
//! of any kind.

mod export;
mod sqlite;

pub use export::{export_datasets, ExportSummary};
pub use sqlite::SqliteDatasetStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::verdict::FinalLabel;

/// Normalized texts shorter than this are not worth storing.
pub const MIN_NORMALIZED_LEN: usize = 10;

static PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalize a message for deduplication.
///
/// Lowercases, strips punctuation, and collapses whitespace. Pure and total:
/// defined for any string, including empty.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let no_punct = PUNCT_RE.replace_all(&lowered, " ");
    WS_RE.replace_all(&no_punct, " ").trim().to_string()
}

/// User feedback state on a stored record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserFeedback {
    /// No feedback received yet.
    #[default]
    None,
    /// User confirmed the verdict.
    Agree,
    /// User disputed the verdict.
    Disagree,
}

impl std::fmt::Display for UserFeedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserFeedback::None => write!(f, "none"),
            UserFeedback::Agree => write!(f, "agree"),
            UserFeedback::Disagree => write!(f, "disagree"),
        }
    }
}

impl std::str::FromStr for UserFeedback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim() {
            "none" => Ok(UserFeedback::None),
            "agree" => Ok(UserFeedback::Agree),
            "disagree" => Ok(UserFeedback::Disagree),
            other => Err(format!("Unknown feedback state: {}", other)),
        }
    }
}

/// Feedback accepted at the boundary: agree or disagree only.
///
/// `none` is a stored default, never a submittable value; anything else is
/// rejected before it reaches the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Agree,
    Disagree,
}

impl FeedbackKind {
    /// The stored feedback state this submission maps to.
    pub fn as_user_feedback(&self) -> UserFeedback {
        match self {
            FeedbackKind::Agree => UserFeedback::Agree,
            FeedbackKind::Disagree => UserFeedback::Disagree,
        }
    }
}

impl std::fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackKind::Agree => write!(f, "agree"),
            FeedbackKind::Disagree => write!(f, "disagree"),
        }
    }
}

impl std::str::FromStr for FeedbackKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim() {
            "agree" => Ok(FeedbackKind::Agree),
            "disagree" => Ok(FeedbackKind::Disagree),
            other => Err(format!("Feedback must be 'agree' or 'disagree', got: {}", other)),
        }
    }
}

/// Input for [`DatasetStore::save_initial_prediction`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrediction {
    /// Original message text, stored verbatim (trimmed).
    pub message_text: String,
    /// Local classifier label ("SCAM"/"SAFE"), if the model was available.
    pub local_model_prediction: Option<String>,
    /// Local classifier score in [0, 1], if available.
    pub local_model_score: Option<f64>,
    /// LLM category at analysis time.
    pub llm_prediction: String,
    /// Calibrated ground-truth label.
    pub final_label: FinalLabel,
    /// Red flags from the verdict.
    pub red_flags: Vec<String>,
    /// Psychology explainer from the verdict.
    pub psychology_tags: String,
    /// Advice from the verdict.
    pub advice: String,
}

/// One stored message record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub message_text: String,
    pub normalized_text: String,
    pub local_model_prediction: Option<String>,
    pub local_model_score: Option<f64>,
    pub llm_prediction: String,
    pub final_label: FinalLabel,
    pub red_flags: Vec<String>,
    pub psychology_tags: String,
    pub advice: String,
    pub user_feedback: UserFeedback,
    pub user_feedback_reason: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate dataset counts for the stats surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total: i64,
    pub scam: i64,
    pub safe: i64,
    pub uncertain: i64,
    pub agreed: i64,
    pub disagreed: i64,
}

/// A labeled training example for classifier retraining.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledExample {
    pub text: String,
    /// 1 = scam, 0 = safe.
    pub label: u8,
}

/// Raw material for one explanation-dataset row.
#[derive(Debug, Clone)]
pub struct ExplanationRow {
    pub message_text: String,
    pub final_label: FinalLabel,
    pub red_flags: Vec<String>,
    pub psychology_tags: String,
    pub advice: String,
}

/// Storage trait for the training dataset.
///
/// Append-only with correction: records are created once per distinct
/// normalized text, updated in place by feedback and second review, and
/// never deleted by this core.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Insert a new record unless the normalized text is too short or
    /// already on file. Returns the new record id, or `None` when skipped.
    async fn save_initial_prediction(
        &self,
        prediction: &NewPrediction,
    ) -> StorageResult<Option<String>>;

    /// Record agree/disagree feedback for the record matching `message_text`
    /// (by normalized form). Returns whether a record was found; never
    /// creates one.
    async fn update_feedback(
        &self,
        message_text: &str,
        feedback: FeedbackKind,
        reason: &str,
    ) -> StorageResult<bool>;

    /// Overwrite the ground-truth label for the record matching
    /// `message_text`. Returns whether a record was found.
    async fn update_final_label(
        &self,
        message_text: &str,
        label: FinalLabel,
    ) -> StorageResult<bool>;

    /// Look up a record by message text (normalized form).
    async fn find_by_text(&self, message_text: &str) -> StorageResult<Option<MessageRecord>>;

    /// Read-only aggregate counts.
    async fn get_stats(&self) -> StorageResult<DatasetStats>;

    /// Rows with a confident scam/safe label, oldest first, for classifier
    /// retraining export.
    async fn labeled_rows(&self) -> StorageResult<Vec<LabeledExample>>;

    /// Rows with non-empty advice, oldest first, for explanation-model
    /// export.
    async fn explanation_rows(&self) -> StorageResult<Vec<ExplanationRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_strips_punctuation() {
        assert_eq!(
            normalize("URGENT!!! Your a/c is BLOCKED."),
            "urgent your a c is blocked"
        );
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  hello   \t world \n"), "hello world");
    }

    #[test]
    fn test_normalize_is_total() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!!???..."), "");
    }

    #[test]
    fn test_normalize_variants_collide() {
        let a = normalize("Win a FREE prize now!");
        let b = normalize("win   a free PRIZE now");
        assert_eq!(a, b);
    }

    #[test]
    fn test_feedback_kind_rejects_unknown() {
        assert!("agree".parse::<FeedbackKind>().is_ok());
        assert!("Disagree".parse::<FeedbackKind>().is_ok());
        assert!("none".parse::<FeedbackKind>().is_err());
        assert!("maybe".parse::<FeedbackKind>().is_err());
    }

    #[test]
    fn test_feedback_kind_maps_to_stored_state() {
        assert_eq!(
            FeedbackKind::Agree.as_user_feedback(),
            UserFeedback::Agree
        );
        assert_eq!(
            FeedbackKind::Disagree.as_user_feedback(),
            UserFeedback::Disagree
        );
    }
}
