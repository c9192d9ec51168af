use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scamshield::classifier::UnloadedClassifier;
use scamshield::config::Config;
use scamshield::dataset::{export_datasets, DatasetStore, FeedbackKind, SqliteDatasetStore};
use scamshield::feedback::FeedbackWorkflow;
use scamshield::groq::GroqClient;
use scamshield::verdict::VerdictAnalyzer;
use scamshield::{AnalysisEngine, CalibrationWeights};

/// ScamShield verdict calibration and dataset flywheel
#[derive(Parser)]
#[command(name = "scamshield", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a message and print the calibrated verdict as JSON
    Analyze {
        /// The message text to analyze
        message: String,
    },
    /// Submit agree/disagree feedback for a previously analyzed message
    Feedback {
        /// The original message text
        message: String,
        /// "agree" or "disagree"
        #[arg(long)]
        verdict: String,
        /// Optional reason for disagreement
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// Print aggregate dataset statistics
    Stats,
    /// Export the training datasets as JSONL files
    Export {
        /// Output directory
        #[arg(long, default_value = "./data/exports")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    let store = match SqliteDatasetStore::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            Arc::new(s)
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    let groq = GroqClient::new(&config.groq, config.request.clone())?;
    let analyzer = VerdictAnalyzer::new(groq, config.models.clone());

    match cli.command {
        Command::Analyze { message } => {
            let engine = AnalysisEngine::new(
                analyzer,
                Arc::new(UnloadedClassifier),
                store,
                CalibrationWeights::default(),
            );

            let analysis = engine.analyze(&message).await?;
            println!("{}", serde_json::to_string_pretty(&analysis.result)?);

            // Persistence runs after the verdict is out; in a one-shot CLI
            // we still wait for the task before exiting.
            let _ = engine.spawn_persist(&message, &analysis).await;
        }
        Command::Feedback {
            message,
            verdict,
            reason,
        } => {
            let feedback: FeedbackKind = match verdict.parse() {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Invalid feedback: {}", e);
                    std::process::exit(2);
                }
            };

            let workflow = FeedbackWorkflow::new(analyzer, store);
            let outcome = workflow.process(&message, feedback, &reason).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Stats => {
            let stats = store.get_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Export { out } => {
            let summary = export_datasets(store.as_ref(), &out).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        scamshield::config::LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        scamshield::config::LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
