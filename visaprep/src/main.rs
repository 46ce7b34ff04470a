//! Command-line entry point: runs the full data-preparation pipeline once.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use visaprep::events::LoggingEventSink;
use visaprep::observability::{init_logging, LoggingOptions};
use visaprep::prelude::{ConfigProvider, ConfiguredPipeline, PipelineState};

/// Ingest, validate and transform the visa dataset.
#[derive(Parser, Debug)]
#[command(name = "visaprep", version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/config.yaml")]
    config: PathBuf,

    /// Directory relative configuration paths resolve against
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Directory receiving the log file
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Emit JSON logs on stderr
    #[arg(long)]
    json_logs: bool,
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let provider = ConfigProvider::from_file(&cli.config, &cli.root)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    let mut pipeline = ConfiguredPipeline::from_config(&provider, Arc::new(LoggingEventSink::default()))
        .context("invalid pipeline configuration")?;

    info!(pipeline = pipeline.name(), config = %cli.config.display(), "Starting pipeline");
    let summary = pipeline.run().await;

    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("failed to serialize run summary")?
    );
    if let PipelineState::Failed { failure } = &summary.state {
        eprintln!(
            "error: {} failed with {} at {}: {}",
            failure.stage, failure.kind, failure.location, failure.detail
        );
    }
    Ok(summary.succeeded())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_logging(&LoggingOptions {
        log_dir: cli.log_dir.clone(),
        json: cli.json_logs,
    }) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
