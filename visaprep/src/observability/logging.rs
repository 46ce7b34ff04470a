//! Process-wide `tracing` subscriber.
//!
//! Installed once by the binary: a console layer filtered by `RUST_LOG`
//! (falling back to [`DEFAULT_FILTER`]) and a file layer writing
//! `log<timestamp>.log` into the log directory.

use crate::errors::{ConfigError, PipelineError};
use crate::utils::{file_stamp, Timestamp};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "visaprep=info";

/// Where and how to log.
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Directory receiving the log file.
    pub log_dir: PathBuf,
    /// Emit JSON lines on the console instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            json: false,
        }
    }
}

/// Name of the log file for a run started at `at`.
#[must_use]
pub fn log_file_name(at: &Timestamp) -> String {
    format!("log{}.log", file_stamp(at))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. The returned guard flushes the file
/// writer when dropped and must be held for the life of the process.
///
/// # Errors
///
/// Returns an IO error if the log directory cannot be created and a
/// `ConfigError` if a subscriber is already installed.
pub fn init_logging(options: &LoggingOptions) -> Result<WorkerGuard, PipelineError> {
    std::fs::create_dir_all(&options.log_dir)
        .map_err(|e| PipelineError::io(&options.log_dir, e))?;
    let file_name = log_file_name(&chrono::Utc::now());
    let appender = tracing_appender::rolling::never(&options.log_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(env_filter());

    let console_layer = if options.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(env_filter())
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(env_filter())
            .boxed()
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("logging already initialised: {e}")))?;

    Ok(guard)
}
