use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub groq: GroqConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub models: ModelConfig,
}

/// Groq API configuration
#[derive(Debug, Clone)]
pub struct GroqConfig {
    /// May be empty; the client reports a typed error per call so analysis
    /// degrades to the fallback verdict instead of refusing to start.
    pub api_key: String,
    pub base_url: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration.
///
/// Analysis calls are single-attempt: a failed call degrades to the fallback
/// verdict rather than retrying.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
}

/// Model selection for the two Groq call sites
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub analysis: String,
    pub review: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let groq = GroqConfig {
            api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            base_url: env::var("GROQ_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com".to_string()),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/training_data.db".to_string()),
            ),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30000),
        };

        let models = ModelConfig {
            analysis: env::var("GROQ_ANALYSIS_MODEL")
                .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string()),
            review: env::var("GROQ_REVIEW_MODEL")
                .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string()),
        };

        Ok(Config {
            groq,
            database,
            logging,
            request,
            models,
        })
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout_ms: 30000 }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            analysis: "llama-3.1-8b-instant".to_string(),
            review: "llama-3.1-8b-instant".to_string(),
        }
    }
}
