use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Groq error: {0}")]
    Groq(#[from] GroqError),

    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Groq API errors.
///
/// The verdict layer folds every variant into the same conservative fallback
/// verdict, but the kinds stay distinct so callers can tell "model
/// unavailable" from "malformed response" in logs and metrics.
#[derive(Debug, Error)]
pub enum GroqError {
    #[error("GROQ_API_KEY is not set")]
    MissingApiKey,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GroqError {
    /// True when the upstream model could not be reached at all, as opposed
    /// to reaching it and getting garbage back.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, GroqError::InvalidResponse { .. })
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for Groq operations
pub type GroqResult<T> = Result<T, GroqError>;
