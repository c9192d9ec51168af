//! # ScamShield Core
//!
//! Verdict calibration and feedback-correction engine for scam-message
//! classification, with a self-improving training dataset.
//!
//! ## Features
//!
//! - **Verdict Parsing**: Best-effort structured verdicts from a Groq LLM,
//!   with field coercion and a conservative fallback for misbehaving models
//! - **Calibration**: Deterministic blend of the model's raw score,
//!   red-flag count, and category risk weight into one final probability
//! - **Local Classifier Blend**: Optional offline classifier score folded
//!   in when available, skipped when not
//! - **Dataset Flywheel**: Every analysis persisted (deduplicated on
//!   normalized text) as ground-truth training data
//! - **Feedback Correction**: User disagreement triggers a stricter second
//!   review that overwrites the stored label
//! - **Dataset Export**: JSONL exports for classifier retraining and
//!   explanation-model fine-tuning
//!
//! ## Architecture
//!
//! ```text
//! text → Verdict Analyzer (Groq) → Calibration → AnalysisResult
//!              ↑ second review              ↘ (deferred)
//!         Feedback Workflow  ←──────────  SQLite dataset
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use scamshield::{AnalysisEngine, CalibrationWeights, Config};
//! use scamshield::classifier::UnloadedClassifier;
//! use scamshield::dataset::SqliteDatasetStore;
//! use scamshield::groq::GroqClient;
//! use scamshield::verdict::VerdictAnalyzer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let store = Arc::new(SqliteDatasetStore::new(&config.database).await?);
//!     let groq = GroqClient::new(&config.groq, config.request.clone())?;
//!     let analyzer = VerdictAnalyzer::new(groq, config.models.clone());
//!     let engine = AnalysisEngine::new(
//!         analyzer,
//!         Arc::new(UnloadedClassifier),
//!         store,
//!         CalibrationWeights::default(),
//!     );
//!     let analysis = engine.analyze("You won a FREE iPhone, click here!").await?;
//!     println!("{}", analysis.result.probability);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Verdict calibration: raw score + flags + category into one probability.
pub mod calibration;
/// Local classifier adapter seam and provided implementations.
pub mod classifier;
/// Configuration management loaded from environment variables.
pub mod config;
/// Training dataset store, normalization, and export.
pub mod dataset;
/// Error types and result aliases for the application.
pub mod error;
/// Feedback-correction workflow driving the label lifecycle.
pub mod feedback;
/// Groq API client for chat completions.
pub mod groq;
/// Analysis pipeline orchestrating one request end to end.
pub mod pipeline;
/// System prompts for the Groq call sites.
pub mod prompts;
/// LLM verdict types and parsing.
pub mod verdict;

pub use calibration::CalibrationWeights;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use pipeline::{Analysis, AnalysisEngine, AnalysisResult};
