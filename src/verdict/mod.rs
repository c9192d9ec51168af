//! LLM verdict types and parsing.
//!
//! The analyzer sends message text to Groq and turns whatever comes back
//! into a well-formed [`Verdict`], coercing out-of-range fields and falling
//! back to a conservative default when the model misbehaves entirely.

mod analyzer;

pub use analyzer::{parse_verdict, VerdictAnalyzer};

use serde::{Deserialize, Serialize};

/// Closed set of scam categories the system recognizes.
///
/// Anything the model emits outside this set is coerced to
/// [`ScamCategory::NormalMessage`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScamCategory {
    #[serde(rename = "bank scam")]
    BankScam,
    #[serde(rename = "job scam")]
    JobScam,
    #[serde(rename = "courier scam")]
    CourierScam,
    #[serde(rename = "lottery scam")]
    LotteryScam,
    #[serde(rename = "phishing")]
    Phishing,
    #[default]
    #[serde(rename = "normal message")]
    NormalMessage,
}

impl ScamCategory {
    /// Canonical string form, matching the prompt contract.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScamCategory::BankScam => "bank scam",
            ScamCategory::JobScam => "job scam",
            ScamCategory::CourierScam => "courier scam",
            ScamCategory::LotteryScam => "lottery scam",
            ScamCategory::Phishing => "phishing",
            ScamCategory::NormalMessage => "normal message",
        }
    }

    /// Coerce a model-emitted category into the closed set.
    pub fn coerce(raw: &str) -> Self {
        match raw.to_lowercase().trim() {
            "bank scam" => ScamCategory::BankScam,
            "job scam" => ScamCategory::JobScam,
            "courier scam" => ScamCategory::CourierScam,
            "lottery scam" => ScamCategory::LotteryScam,
            "phishing" => ScamCategory::Phishing,
            _ => ScamCategory::NormalMessage,
        }
    }
}

impl std::fmt::Display for ScamCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ground-truth classification stored for training, distinct from the
/// probability shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalLabel {
    Scam,
    Safe,
    #[default]
    Uncertain,
}

impl std::fmt::Display for FinalLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinalLabel::Scam => write!(f, "scam"),
            FinalLabel::Safe => write!(f, "safe"),
            FinalLabel::Uncertain => write!(f, "uncertain"),
        }
    }
}

impl std::str::FromStr for FinalLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim() {
            "scam" => Ok(FinalLabel::Scam),
            "safe" => Ok(FinalLabel::Safe),
            "uncertain" => Ok(FinalLabel::Uncertain),
            other => Err(format!("Unknown final label: {}", other)),
        }
    }
}

/// Danger level of a highlighted phrase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Danger {
    High,
    #[default]
    Medium,
}

impl Danger {
    /// Coerce a model-emitted danger level; anything but "high" is medium.
    pub fn coerce(raw: &str) -> Self {
        match raw {
            "high" => Danger::High,
            _ => Danger::Medium,
        }
    }
}

/// A phrase from the message the model flagged as suspicious.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightedPhrase {
    /// Verbatim substring of the analyzed message.
    pub phrase: String,
    /// How dangerous the phrase is.
    pub danger: Danger,
}

/// Structured verdict parsed from a model completion.
///
/// `probability` is the model's raw score on the 0–100 scale, before
/// calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub probability: f64,
    pub category: ScamCategory,
    pub red_flags: Vec<String>,
    pub highlighted_phrases: Vec<HighlightedPhrase>,
    pub psychology_explainer: String,
    pub advice: String,
}

impl Verdict {
    /// Conservative fallback used whenever the model call or parse fails.
    ///
    /// Looks like a normal, if generic, verdict — callers never see raw
    /// errors in the analysis result.
    pub fn fallback() -> Self {
        Self {
            probability: 50.0,
            category: ScamCategory::NormalMessage,
            red_flags: vec!["Could not analyse — AI service unavailable".to_string()],
            highlighted_phrases: Vec::new(),
            psychology_explainer: "Analysis failed.".to_string(),
            advice: "Please try again. If you suspect a scam, do not share personal information."
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_coercion() {
        assert_eq!(ScamCategory::coerce("Bank Scam"), ScamCategory::BankScam);
        assert_eq!(ScamCategory::coerce(" phishing "), ScamCategory::Phishing);
        assert_eq!(
            ScamCategory::coerce("romance scam"),
            ScamCategory::NormalMessage
        );
        assert_eq!(ScamCategory::coerce(""), ScamCategory::NormalMessage);
    }

    #[test]
    fn test_category_round_trip() {
        for cat in [
            ScamCategory::BankScam,
            ScamCategory::JobScam,
            ScamCategory::CourierScam,
            ScamCategory::LotteryScam,
            ScamCategory::Phishing,
            ScamCategory::NormalMessage,
        ] {
            assert_eq!(ScamCategory::coerce(cat.as_str()), cat);
        }
    }

    #[test]
    fn test_final_label_parse() {
        assert_eq!("scam".parse::<FinalLabel>(), Ok(FinalLabel::Scam));
        assert_eq!("SAFE".parse::<FinalLabel>(), Ok(FinalLabel::Safe));
        assert!("maybe".parse::<FinalLabel>().is_err());
    }

    #[test]
    fn test_danger_coercion() {
        assert_eq!(Danger::coerce("high"), Danger::High);
        assert_eq!(Danger::coerce("medium"), Danger::Medium);
        assert_eq!(Danger::coerce("extreme"), Danger::Medium);
    }

    #[test]
    fn test_fallback_verdict_shape() {
        let v = Verdict::fallback();
        assert_eq!(v.probability, 50.0);
        assert_eq!(v.category, ScamCategory::NormalMessage);
        assert_eq!(v.red_flags.len(), 1);
        assert!(v.highlighted_phrases.is_empty());
    }
}
