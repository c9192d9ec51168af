use serde_json::Value;
use tracing::debug;

use super::{Danger, FinalLabel, HighlightedPhrase, ScamCategory, Verdict};
use crate::config::ModelConfig;
use crate::error::{GroqError, GroqResult};
use crate::groq::{ChatRequest, GroqClient, Message};
use crate::prompts::{ANALYSIS_PROMPT, SECOND_REVIEW_PROMPT};

/// Red flags are capped at this many entries.
const MAX_RED_FLAGS: usize = 5;
/// Highlighted phrases are capped at this many entries.
const MAX_HIGHLIGHTS: usize = 8;

/// Turns raw message text into a structured [`Verdict`] via Groq.
///
/// Every call is a single attempt that surfaces its typed failure; the
/// pipeline owns degradation to [`Verdict::fallback`].
#[derive(Clone)]
pub struct VerdictAnalyzer {
    groq: GroqClient,
    models: ModelConfig,
}

impl VerdictAnalyzer {
    /// Create a new analyzer
    pub fn new(groq: GroqClient, models: ModelConfig) -> Self {
        Self { groq, models }
    }

    /// Analyze a message, surfacing the typed failure kind.
    pub async fn analyze(&self, text: &str) -> GroqResult<Verdict> {
        let request = ChatRequest::new(
            &self.models.analysis,
            vec![
                Message::system(ANALYSIS_PROMPT),
                Message::user(format!("Analyse this message:\n\n{}", text)),
            ],
        )
        .with_temperature(0.25)
        .with_max_tokens(400);

        let completion = self.groq.chat(request).await?;

        debug!(completion_len = completion.len(), "Parsing verdict completion");

        parse_verdict(&completion)
    }

    /// Re-evaluate a message after a user disagreed with the verdict.
    ///
    /// A transport failure or unparseable completion is an error; the
    /// caller leaves the stored label untouched in that case. A parseable
    /// response with an unknown label coerces to `uncertain`.
    pub async fn second_review(&self, text: &str, user_reason: &str) -> GroqResult<FinalLabel> {
        let mut user_content = format!("Message to re-evaluate:\n\n{}", text);
        if !user_reason.trim().is_empty() {
            user_content.push_str(&format!(
                "\n\nUser's reason for disagreement: {}",
                user_reason.trim()
            ));
        }

        let request = ChatRequest::new(
            &self.models.review,
            vec![
                Message::system(SECOND_REVIEW_PROMPT),
                Message::user(user_content),
            ],
        )
        .with_temperature(0.1)
        .with_max_tokens(60);

        let completion = self.groq.chat(request).await?;

        let json = extract_json(&completion).ok_or_else(|| GroqError::InvalidResponse {
            message: format!("No JSON object in review completion: {:?}", completion),
        })?;

        let value: Value =
            serde_json::from_str(json).map_err(|e| GroqError::InvalidResponse {
                message: format!("Review completion is not valid JSON: {}", e),
            })?;

        let label = value
            .get("final_label")
            .and_then(Value::as_str)
            .unwrap_or("uncertain");

        Ok(label.parse().unwrap_or(FinalLabel::Uncertain))
    }
}

/// Parse a model completion into a [`Verdict`], coercing malformed fields.
///
/// Returns an error when no JSON object can be recovered at all, or when a
/// probability is present but not numeric; the payload is included so the
/// raw response can be diagnosed from logs.
pub fn parse_verdict(completion: &str) -> GroqResult<Verdict> {
    let json = extract_json(completion).ok_or_else(|| GroqError::InvalidResponse {
        message: format!("No JSON object in completion: {:?}", completion),
    })?;

    let value: Value = serde_json::from_str(json).map_err(|e| GroqError::InvalidResponse {
        message: format!("Completion is not valid JSON: {} (raw: {:?})", e, completion),
    })?;

    // Probability: the prompt asks for 0-100, but guard against models that
    // still emit 0.0-1.0 floats and rescale those. A missing field defaults
    // to 50; a present but non-numeric one is a malformed response.
    let mut probability = match value.get("probability") {
        None => 50.0,
        Some(v) => value_as_f64(v).ok_or_else(|| GroqError::InvalidResponse {
            message: format!("Probability is not numeric: {}", v),
        })?,
    };
    if probability <= 1.0 {
        probability *= 100.0;
    }

    let category = value
        .get("category")
        .and_then(Value::as_str)
        .map(ScamCategory::coerce)
        .unwrap_or(ScamCategory::NormalMessage);

    let red_flags: Vec<String> = value
        .get("red_flags")
        .and_then(Value::as_array)
        .map(|flags| {
            flags
                .iter()
                .take(MAX_RED_FLAGS)
                .map(value_as_string)
                .collect()
        })
        .unwrap_or_default();

    let highlighted_phrases: Vec<HighlightedPhrase> = value
        .get("highlighted_phrases")
        .and_then(Value::as_array)
        .map(|phrases| {
            phrases
                .iter()
                .take(MAX_HIGHLIGHTS)
                .filter_map(|p| {
                    let phrase = p.get("phrase")?;
                    let danger = p.get("danger")?;
                    Some(HighlightedPhrase {
                        phrase: value_as_string(phrase),
                        danger: Danger::coerce(danger.as_str().unwrap_or("medium")),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let advice = value
        .get("advice")
        .and_then(Value::as_str)
        .unwrap_or("Stay cautious and verify the source.")
        .to_string();

    let psychology_explainer = value
        .get("psychology_explainer")
        .and_then(Value::as_str)
        .unwrap_or("No psychological manipulation detected.")
        .to_string();

    Ok(Verdict {
        probability,
        category,
        red_flags,
        highlighted_phrases,
        psychology_explainer,
        advice,
    })
}

/// Extract the outermost `{...}` span from a completion.
///
/// Models sometimes wrap the JSON in markdown fences or prose despite the
/// prompt; spanning first `{` to last `}` recovers it.
fn extract_json(completion: &str) -> Option<&str> {
    let start = completion.find('{')?;
    let end = completion.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&completion[start..=end])
}

/// Numeric coercion: accepts JSON numbers and numeric strings.
fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// String coercion: unwraps JSON strings, stringifies everything else.
fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
