use async_trait::async_trait;
use chrono::Utc;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    normalize, DatasetStats, DatasetStore, ExplanationRow, FeedbackKind, LabeledExample,
    MessageRecord, NewPrediction, MIN_NORMALIZED_LEN,
};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};
use crate::verdict::FinalLabel;

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed dataset store
#[derive(Clone)]
pub struct SqliteDatasetStore {
    pool: SqlitePool,
}

impl SqliteDatasetStore {
    /// Create a new SQLite dataset store
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory store, for tests.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            }
        })?;

        // A single connection keeps every query on the same in-memory db.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Migration {
                message: format!("Failed to run migrations: {}", e),
            })?;

        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl DatasetStore for SqliteDatasetStore {
    async fn save_initial_prediction(
        &self,
        prediction: &NewPrediction,
    ) -> StorageResult<Option<String>> {
        let norm = normalize(&prediction.message_text);

        // Skip empty or very short messages
        if norm.chars().count() < MIN_NORMALIZED_LEN {
            debug!(len = norm.chars().count(), "Skipping short message");
            return Ok(None);
        }

        let id = Uuid::new_v4().to_string();
        let red_flags = serde_json::to_string(&prediction.red_flags).unwrap_or_default();

        let result = sqlx::query(
            r#"
            INSERT INTO messages (
                id, message_text, normalized_text,
                local_model_prediction, local_model_score,
                llm_prediction, final_label,
                red_flags, psychology_tags, advice,
                user_feedback, user_feedback_reason, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'none', '', ?)
            "#,
        )
        .bind(&id)
        .bind(prediction.message_text.trim())
        .bind(&norm)
        .bind(&prediction.local_model_prediction)
        .bind(prediction.local_model_score)
        .bind(&prediction.llm_prediction)
        .bind(prediction.final_label.to_string())
        .bind(&red_flags)
        .bind(&prediction.psychology_tags)
        .bind(&prediction.advice)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(Some(id)),
            // Duplicate submission: same normalized text already on file.
            // Silently skipped, not an error.
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                debug!("Skipping duplicate message");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_feedback(
        &self,
        message_text: &str,
        feedback: FeedbackKind,
        reason: &str,
    ) -> StorageResult<bool> {
        let norm = normalize(message_text);

        let result = sqlx::query(
            r#"
            UPDATE messages
            SET user_feedback = ?, user_feedback_reason = ?
            WHERE normalized_text = ?
            "#,
        )
        .bind(feedback.to_string())
        .bind(reason.trim())
        .bind(&norm)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_final_label(
        &self,
        message_text: &str,
        label: FinalLabel,
    ) -> StorageResult<bool> {
        let norm = normalize(message_text);

        let result = sqlx::query("UPDATE messages SET final_label = ? WHERE normalized_text = ?")
            .bind(label.to_string())
            .bind(&norm)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_text(&self, message_text: &str) -> StorageResult<Option<MessageRecord>> {
        let norm = normalize(message_text);

        let row: Option<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, message_text, normalized_text,
                   local_model_prediction, local_model_score,
                   llm_prediction, final_label,
                   red_flags, psychology_tags, advice,
                   user_feedback, user_feedback_reason, created_at
            FROM messages
            WHERE normalized_text = ?
            "#,
        )
        .bind(&norm)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn get_stats(&self) -> StorageResult<DatasetStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        let scam: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE final_label = 'scam'")
                .fetch_one(&self.pool)
                .await?;
        let safe: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE final_label = 'safe'")
                .fetch_one(&self.pool)
                .await?;
        let agreed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE user_feedback = 'agree'")
                .fetch_one(&self.pool)
                .await?;
        let disagreed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE user_feedback = 'disagree'")
                .fetch_one(&self.pool)
                .await?;

        Ok(DatasetStats {
            total,
            scam,
            safe,
            uncertain: total - scam - safe,
            agreed,
            disagreed,
        })
    }

    async fn labeled_rows(&self) -> StorageResult<Vec<LabeledExample>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT message_text, final_label
            FROM messages
            WHERE final_label IN ('scam', 'safe')
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(text, label)| LabeledExample {
                text: text.trim().to_string(),
                label: if label == "scam" { 1 } else { 0 },
            })
            .collect())
    }

    async fn explanation_rows(&self) -> StorageResult<Vec<ExplanationRow>> {
        let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT message_text, final_label, red_flags, psychology_tags, advice
            FROM messages
            WHERE advice IS NOT NULL AND advice != ''
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(message_text, final_label, red_flags, psychology_tags, advice)| {
                ExplanationRow {
                    message_text,
                    final_label: final_label.parse().unwrap_or_default(),
                    red_flags: serde_json::from_str(&red_flags).unwrap_or_default(),
                    psychology_tags,
                    advice,
                }
            })
            .collect())
    }
}

// Internal row type for SQLx mapping
#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    message_text: String,
    normalized_text: String,
    local_model_prediction: Option<String>,
    local_model_score: Option<f64>,
    llm_prediction: String,
    final_label: String,
    red_flags: String,
    psychology_tags: String,
    advice: String,
    user_feedback: String,
    user_feedback_reason: String,
    created_at: String,
}

impl From<MessageRow> for MessageRecord {
    fn from(row: MessageRow) -> Self {
        use chrono::DateTime;

        Self {
            id: row.id,
            message_text: row.message_text,
            normalized_text: row.normalized_text,
            local_model_prediction: row.local_model_prediction,
            local_model_score: row.local_model_score,
            llm_prediction: row.llm_prediction,
            final_label: row.final_label.parse().unwrap_or_default(),
            red_flags: serde_json::from_str(&row.red_flags).unwrap_or_default(),
            psychology_tags: row.psychology_tags,
            advice: row.advice,
            user_feedback: row.user_feedback.parse().unwrap_or_default(),
            user_feedback_reason: row.user_feedback_reason,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}
