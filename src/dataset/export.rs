use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::DatasetStore;
use crate::error::{StorageError, StorageResult};

/// Summary of a dataset export run, also written to `export_summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSummary {
    pub exported_at: String,
    pub classifier_rows: usize,
    pub explanation_rows: usize,
    pub classifier_file: PathBuf,
    pub explanation_file: PathBuf,
}

/// Export the training datasets as JSONL files into `out_dir`.
///
/// Writes `classifier_dataset.jsonl` (confident scam/safe rows as
/// `{"text", "label"}` with scam=1) and `explanation_dataset.jsonl`
/// (rows with advice as `{"input", "output"}` prompt/response pairs),
/// plus an `export_summary.json`.
pub async fn export_datasets<S: DatasetStore + ?Sized>(
    store: &S,
    out_dir: &Path,
) -> StorageResult<ExportSummary> {
    fs::create_dir_all(out_dir).map_err(io_error)?;

    // Classifier dataset
    let classifier_file = out_dir.join("classifier_dataset.jsonl");
    let examples = store.labeled_rows().await?;
    let mut writer = BufWriter::new(File::create(&classifier_file).map_err(io_error)?);
    for example in &examples {
        let line = serde_json::to_string(example).map_err(|e| StorageError::Query {
            message: format!("Failed to serialize example: {}", e),
        })?;
        writeln!(writer, "{}", line).map_err(io_error)?;
    }
    writer.flush().map_err(io_error)?;

    info!(
        path = %classifier_file.display(),
        rows = examples.len(),
        "Classifier dataset exported"
    );

    // Explanation dataset
    let explanation_file = out_dir.join("explanation_dataset.jsonl");
    let rows = store.explanation_rows().await?;
    let mut writer = BufWriter::new(File::create(&explanation_file).map_err(io_error)?);
    for row in &rows {
        let flags_text = if row.red_flags.is_empty() {
            "None".to_string()
        } else {
            row.red_flags.join(", ")
        };
        let psychology = if row.psychology_tags.is_empty() {
            "N/A"
        } else {
            &row.psychology_tags
        };

        let record = serde_json::json!({
            "input": format!("Message: {}", row.message_text.trim()),
            "output": format!(
                "Verdict: {}\nRed Flags: {}\nPsychology: {}\nAdvice: {}",
                row.final_label.to_string().to_uppercase(),
                flags_text,
                psychology,
                row.advice,
            ),
        });
        writeln!(writer, "{}", record).map_err(io_error)?;
    }
    writer.flush().map_err(io_error)?;

    info!(
        path = %explanation_file.display(),
        rows = rows.len(),
        "Explanation dataset exported"
    );

    let summary = ExportSummary {
        exported_at: Utc::now().to_rfc3339(),
        classifier_rows: examples.len(),
        explanation_rows: rows.len(),
        classifier_file,
        explanation_file,
    };

    let summary_path = out_dir.join("export_summary.json");
    let summary_json = serde_json::to_string_pretty(&summary).map_err(|e| StorageError::Query {
        message: format!("Failed to serialize summary: {}", e),
    })?;
    fs::write(&summary_path, summary_json).map_err(io_error)?;

    Ok(summary)
}

fn io_error(e: std::io::Error) -> StorageError {
    StorageError::Query {
        message: format!("Export I/O failed: {}", e),
    }
}
