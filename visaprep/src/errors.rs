//! Error types for the visaprep pipeline.
//!
//! Every stage failure is one of a small set of kinds. Each kind is a
//! concrete error struct carrying the context needed for diagnostics; they
//! are unified in [`PipelineError`] and, at a stage boundary, enriched into
//! a [`StageFailure`] that also records which stage failed and where.

use crate::core::StageName;
use crate::validation::ValidationCheck;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::panic::Location;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Discriminant of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or invalid configuration.
    Config,
    /// The dataset could not be fetched.
    Download,
    /// A table does not have the expected shape or values.
    DataFormat,
    /// An upstream artifact is absent or unusable.
    MissingArtifact,
    /// One or more schema checks failed.
    Validation,
    /// A table contains a column the schema does not declare.
    SchemaMismatch,
    /// An output could not be encoded or decoded.
    Serialization,
    /// A filesystem operation failed.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Download => write!(f, "download"),
            Self::DataFormat => write!(f, "data_format"),
            Self::MissingArtifact => write!(f, "missing_artifact"),
            Self::Validation => write!(f, "validation"),
            Self::SchemaMismatch => write!(f, "schema_mismatch"),
            Self::Serialization => write!(f, "serialization"),
            Self::Io => write!(f, "io"),
        }
    }
}

/// The main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration could not be resolved.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The raw dataset could not be downloaded.
    #[error("{0}")]
    Download(#[from] DownloadError),

    /// Input data is malformed.
    #[error("{0}")]
    DataFormat(#[from] DataFormatError),

    /// An artifact handed to a stage is unusable.
    #[error("{0}")]
    MissingArtifact(#[from] MissingArtifactError),

    /// Schema validation failed.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Input columns do not match the schema.
    #[error("{0}")]
    SchemaMismatch(#[from] SchemaMismatchError),

    /// Encoding or decoding an output failed.
    #[error("{0}")]
    Serialization(#[from] SerializationError),

    /// Filesystem error with the offending path.
    #[error("IO error at '{}': {source}", path.display())]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Creates an IO error for a path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Download(_) => ErrorKind::Download,
            Self::DataFormat(_) => ErrorKind::DataFormat,
            Self::MissingArtifact(_) => ErrorKind::MissingArtifact,
            Self::Validation(_) => ErrorKind::Validation,
            Self::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), serde_json::json!(self.kind()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));

        match self {
            Self::Validation(err) => {
                map.insert("failures".to_string(), serde_json::json!(err.failures));
            }
            Self::SchemaMismatch(err) => {
                map.insert(
                    "unknown_columns".to_string(),
                    serde_json::json!(err.unknown_columns),
                );
            }
            Self::Io { path, .. } => {
                map.insert("path".to_string(), serde_json::json!(path));
            }
            _ => {}
        }

        map
    }
}

/// Error raised when configuration is missing or invalid.
#[derive(Debug, Clone, Error)]
#[error("Configuration error: {message}")]
pub struct ConfigError {
    /// The error message.
    pub message: String,
    /// The offending key, when known.
    pub key: Option<String>,
    /// The configuration file involved, when known.
    pub path: Option<PathBuf>,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            key: None,
            path: None,
        }
    }

    /// Creates an error for a required key that is absent.
    #[must_use]
    pub fn missing_key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("required key '{key}' is missing"),
            key: Some(key),
            path: None,
        }
    }

    /// Sets the offending key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the configuration file.
    #[must_use]
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }
}

/// Error raised when the dataset cannot be fetched.
#[derive(Debug, Clone, Error)]
#[error("Download of '{url}' failed: {message}")]
pub struct DownloadError {
    /// The URL being fetched.
    pub url: String,
    /// What went wrong.
    pub message: String,
}

impl DownloadError {
    /// Creates a new download error.
    #[must_use]
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Error raised when a table does not have the expected structure or values.
#[derive(Debug, Clone, Error)]
#[error("Data format error{}: {message}", display_file(file.as_deref()))]
pub struct DataFormatError {
    /// The error message.
    pub message: String,
    /// The file being read, when known.
    pub file: Option<PathBuf>,
    /// The offending column, when known.
    pub column: Option<String>,
}

fn display_file(file: Option<&Path>) -> String {
    file.map(|p| format!(" in '{}'", p.display()))
        .unwrap_or_default()
}

impl DataFormatError {
    /// Creates a new data format error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
            column: None,
        }
    }

    /// Creates an error for an expected column that is absent.
    #[must_use]
    pub fn missing_column(column: impl Into<String>) -> Self {
        let column = column.into();
        Self {
            message: format!("expected column '{column}' is missing"),
            file: None,
            column: Some(column),
        }
    }

    /// Sets the file.
    #[must_use]
    pub fn with_file(mut self, file: impl AsRef<Path>) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }

    /// Sets the column.
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

/// Error raised when an upstream artifact cannot be consumed.
#[derive(Debug, Clone, Error)]
#[error("Missing artifact for {stage} stage: {message}")]
pub struct MissingArtifactError {
    /// The stage that needed the artifact.
    pub stage: StageName,
    /// Paths that were expected but not found.
    pub missing_paths: Vec<PathBuf>,
    /// Additional message.
    pub message: String,
}

impl MissingArtifactError {
    /// Creates a new missing artifact error.
    #[must_use]
    pub fn new(stage: StageName, message: impl Into<String>) -> Self {
        Self {
            stage,
            missing_paths: Vec::new(),
            message: message.into(),
        }
    }

    /// Creates an error listing paths that do not exist.
    #[must_use]
    pub fn paths_not_found(stage: StageName, paths: Vec<PathBuf>) -> Self {
        let listed = paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            stage,
            message: format!("files not found: {listed}"),
            missing_paths: paths,
        }
    }
}

/// The checks that failed for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileValidationFailure {
    /// Which split the file holds ("train" or "test").
    pub split: String,
    /// The file that failed.
    pub file: PathBuf,
    /// The checks that returned false.
    pub failed_checks: Vec<ValidationCheck>,
}

impl fmt::Display for FileValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let checks = self
            .failed_checks
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "{} file '{}' failed [{}]",
            self.split,
            self.file.display(),
            checks
        )
    }
}

/// Error raised when one or more schema checks fail.
#[derive(Debug, Clone, Error)]
#[error("Validation failed: {}", summarize(failures))]
pub struct ValidationError {
    /// One entry per failing file.
    pub failures: Vec<FileValidationFailure>,
}

fn summarize(failures: &[FileValidationFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(failures: Vec<FileValidationFailure>) -> Self {
        Self { failures }
    }

    /// Returns true if the given split failed.
    #[must_use]
    pub fn failed_split(&self, split: &str) -> bool {
        self.failures.iter().any(|f| f.split == split)
    }
}

/// Error raised when a table contains columns the schema does not declare.
#[derive(Debug, Clone, Error)]
#[error(
    "Schema mismatch in '{}': columns not in the schema: {}",
    file.display(),
    unknown_columns.join(", ")
)]
pub struct SchemaMismatchError {
    /// The file that was loaded.
    pub file: PathBuf,
    /// The undeclared columns.
    pub unknown_columns: Vec<String>,
}

impl SchemaMismatchError {
    /// Creates a new schema mismatch error.
    #[must_use]
    pub fn new(file: impl AsRef<Path>, unknown_columns: Vec<String>) -> Self {
        Self {
            file: file.as_ref().to_path_buf(),
            unknown_columns,
        }
    }
}

/// Error raised when an output cannot be encoded or decoded.
#[derive(Debug, Clone, Error)]
#[error("Serialization error{}: {message}", display_file(path.as_deref()))]
pub struct SerializationError {
    /// The error message.
    pub message: String,
    /// The file involved, when known.
    pub path: Option<PathBuf>,
}

impl SerializationError {
    /// Creates a new serialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    /// Sets the file.
    #[must_use]
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }
}

impl From<bincode::Error> for SerializationError {
    fn from(err: bincode::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// A [`PipelineError`] enriched with the stage it escaped from.
#[derive(Debug, Error)]
#[error("{stage} stage failed at {location}: {source}")]
pub struct StageFailure {
    /// The stage that failed.
    pub stage: StageName,
    /// Where the error was enriched.
    pub location: &'static Location<'static>,
    /// The underlying error.
    #[source]
    pub source: PipelineError,
}

impl StageFailure {
    /// Wraps an error, recording the caller's source location.
    #[must_use]
    #[track_caller]
    pub fn new(stage: StageName, source: impl Into<PipelineError>) -> Self {
        Self {
            stage,
            location: Location::caller(),
            source: source.into(),
        }
    }

    /// Returns the kind of the underlying error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// Returns a cloneable summary of this failure.
    #[must_use]
    pub fn summary(&self) -> FailureSummary {
        FailureSummary {
            stage: self.stage,
            kind: self.kind(),
            detail: self.source.to_string(),
            location: self.location.to_string(),
        }
    }
}

/// Serializable snapshot of a [`StageFailure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSummary {
    /// The stage that failed.
    pub stage: StageName,
    /// The error kind.
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub detail: String,
    /// Source location of the enrichment.
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_missing_key() {
        let err = ConfigError::missing_key("data_ingestion_config").with_path("config.yaml");

        assert_eq!(err.key.as_deref(), Some("data_ingestion_config"));
        assert!(err.to_string().contains("data_ingestion_config"));
        assert_eq!(err.path, Some(PathBuf::from("config.yaml")));
    }

    #[test]
    fn test_pipeline_error_kind() {
        let err: PipelineError = DownloadError::new("http://x/y.csv", "404").into();
        assert_eq!(err.kind(), ErrorKind::Download);

        let err = PipelineError::io(
            "a.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("a.csv"));
    }

    #[test]
    fn test_validation_error_names_split_and_checks() {
        let err = ValidationError::new(vec![FileValidationFailure {
            split: "train".to_string(),
            file: PathBuf::from("train/Visadataset.csv"),
            failed_checks: vec![ValidationCheck::ColumnCount],
        }]);

        let msg = err.to_string();
        assert!(msg.contains("train file"));
        assert!(msg.contains("column_count"));
        assert!(err.failed_split("train"));
        assert!(!err.failed_split("test"));
    }

    #[test]
    fn test_schema_mismatch_to_dict() {
        let err: PipelineError =
            SchemaMismatchError::new("train.csv", vec!["mystery".to_string()]).into();

        let dict = err.to_dict();
        assert_eq!(dict.get("kind").unwrap(), "schema_mismatch");
        assert_eq!(dict.get("unknown_columns").unwrap(), &serde_json::json!(["mystery"]));
    }

    #[test]
    fn test_stage_failure_records_location() {
        let failure = StageFailure::new(
            StageName::Validation,
            MissingArtifactError::new(StageName::Validation, "no train file"),
        );

        assert_eq!(failure.kind(), ErrorKind::MissingArtifact);
        assert!(failure.location.file().ends_with("errors.rs"));

        let summary = failure.summary();
        assert_eq!(summary.stage, StageName::Validation);
        assert!(summary.detail.contains("no train file"));
    }

    #[test]
    fn test_error_kind_serialize() {
        let json = serde_json::to_string(&ErrorKind::SchemaMismatch).unwrap();
        assert_eq!(json, r#""schema_mismatch""#);
    }
}
