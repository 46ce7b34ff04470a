//! The data validation stage.

use super::validator::{FileCheckReport, SchemaValidator, ValidationCheck};
use crate::config::DataValidationConfig;
use crate::core::{DataIngestionArtifact, DataValidationArtifact, StageName};
use crate::errors::{
    FileValidationFailure, MissingArtifactError, PipelineError, SerializationError, StageFailure,
    ValidationError,
};
use crate::schema::DatasetSchema;
use crate::stages::{Stage, StageResult};
use crate::table::Table;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Check results for one split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitReport {
    /// "train" or "test".
    pub split: String,
    /// The file that was checked.
    pub file_path: PathBuf,
    /// Every check result.
    pub checks: FileCheckReport,
}

/// The JSON document written by the validation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// The schema the splits were checked against.
    pub schema_file_path: PathBuf,
    /// One entry per split.
    pub splits: Vec<SplitReport>,
    /// True iff every split passed.
    pub is_validated: bool,
    /// When the report was produced (ISO 8601).
    pub created_at: String,
}

/// Validates the ingested splits against the dataset schema.
#[derive(Debug, Clone)]
pub struct DataValidation {
    config: DataValidationConfig,
}

impl DataValidation {
    /// Creates the stage.
    #[must_use]
    pub fn new(config: DataValidationConfig) -> Self {
        Self { config }
    }

    /// Returns the stage configuration.
    #[must_use]
    pub fn config(&self) -> &DataValidationConfig {
        &self.config
    }

    async fn check_split(
        schema: &DatasetSchema,
        split: &str,
        path: &Path,
    ) -> Result<SplitReport, PipelineError> {
        let table = Table::read_csv(path).await?;
        let validator = SchemaValidator::new(schema, &table);
        let actual_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let checks = validator.run_all(&actual_name);
        let filled = validator.replace_nulls();
        debug!(split, rows = filled.n_rows(), "Null replacement computed");

        info!(
            split,
            file = %path.display(),
            file_name_ok = ?checks.result(ValidationCheck::FileName),
            column_count_ok = ?checks.result(ValidationCheck::ColumnCount),
            column_names_ok = ?checks.result(ValidationCheck::ColumnNames),
            no_empty_column = ?checks.result(ValidationCheck::WholeColumnMissing),
            "Split checked"
        );

        Ok(SplitReport {
            split: split.to_string(),
            file_path: path.to_path_buf(),
            checks,
        })
    }

    async fn write_report(&self, report: &ValidationReport) -> Result<(), PipelineError> {
        let path = &self.config.report_file_path;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::io(parent, e))?;
        }
        let json = serde_json::to_vec_pretty(report)
            .map_err(|e| SerializationError::from(e).with_path(path))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| PipelineError::io(path, e))
    }

    /// Runs every check on both splits and returns the verdict.
    ///
    /// # Errors
    ///
    /// Returns `MissingArtifactError` if a split file does not exist and
    /// `ValidationError` if any check fails on either split.
    pub async fn validate(
        &self,
        ingestion: &DataIngestionArtifact,
    ) -> Result<DataValidationArtifact, PipelineError> {
        let splits = [
            ("train", ingestion.train_file_path.as_path()),
            ("test", ingestion.test_file_path.as_path()),
        ];

        let mut missing = Vec::new();
        for (_, path) in splits {
            if !tokio::fs::try_exists(path)
                .await
                .map_err(|e| PipelineError::io(path, e))?
            {
                missing.push(path.to_path_buf());
            }
        }
        if !missing.is_empty() {
            return Err(MissingArtifactError::paths_not_found(StageName::Validation, missing).into());
        }

        let schema = DatasetSchema::load(&self.config.schema_file_path).await?;

        let mut reports = Vec::with_capacity(splits.len());
        for (split, path) in splits {
            reports.push(Self::check_split(&schema, split, path).await?);
        }

        let is_validated = reports.iter().all(|r| r.checks.passed());
        let report = ValidationReport {
            schema_file_path: self.config.schema_file_path.clone(),
            splits: reports,
            is_validated,
            created_at: crate::utils::iso_timestamp(),
        };
        self.write_report(&report).await?;

        if !is_validated {
            let failures: Vec<FileValidationFailure> = report
                .splits
                .iter()
                .filter(|r| !r.checks.passed())
                .map(|r| FileValidationFailure {
                    split: r.split.clone(),
                    file: r.file_path.clone(),
                    failed_checks: r.checks.failed_checks(),
                })
                .collect();
            warn!(failed_files = failures.len(), "Validation failed");
            return Err(ValidationError::new(failures).into());
        }

        info!(report = %self.config.report_file_path.display(), "Validation passed");
        Ok(DataValidationArtifact::new(
            &self.config.schema_file_path,
            &self.config.report_file_path,
        ))
    }
}

#[async_trait]
impl Stage for DataValidation {
    type Input = DataIngestionArtifact;
    type Output = DataValidationArtifact;

    fn name(&self) -> StageName {
        StageName::Validation
    }

    async fn execute(&self, input: &Self::Input) -> StageResult<Self::Output> {
        self.validate(input)
            .await
            .map_err(|e| StageFailure::new(StageName::Validation, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    const SCHEMA: &str = r"
FileName: Visadataset.csv
NumberofColumns: 3
ColumnNames:
  a: int
  b: category
  case_status: int
target_column: case_status
";

    struct Fixture {
        _dir: tempfile::TempDir,
        stage: DataValidation,
        root: PathBuf,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let schema_path = root.join("schema.yaml");
        tokio::fs::write(&schema_path, SCHEMA).await.unwrap();
        let stage = DataValidation::new(DataValidationConfig {
            schema_file_path: schema_path,
            report_file_path: root.join("validation/report.json"),
        });
        Fixture {
            _dir: dir,
            stage,
            root,
        }
    }

    async fn write_split(root: &Path, split: &str, name: &str, csv: &str) -> PathBuf {
        let path = root.join(split).join(name);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, csv).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_valid_splits_pass() {
        let fx = fixture().await;
        let train = write_split(&fx.root, "train", "Visadataset.csv", "a,b,case_status\n1,x,0\n").await;
        let test = write_split(&fx.root, "test", "Visadataset.csv", "b,a,case_status\ny,2,1\n").await;
        let ingestion = DataIngestionArtifact::new("raw.csv", train, test);

        let artifact = fx.stage.execute(&ingestion).await.unwrap();

        assert!(artifact.is_validated);
        let report: ValidationReport =
            serde_json::from_slice(&tokio::fs::read(&artifact.report_file_path).await.unwrap())
                .unwrap();
        assert!(report.is_validated);
        assert_eq!(report.splits.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_split_file() {
        let fx = fixture().await;
        let train = write_split(&fx.root, "train", "Visadataset.csv", "a,b,case_status\n1,x,0\n").await;
        let ingestion = DataIngestionArtifact::new("raw.csv", train, fx.root.join("test/nope.csv"));

        let failure = fx.stage.execute(&ingestion).await.unwrap_err();

        assert_eq!(failure.kind(), ErrorKind::MissingArtifact);
        assert_eq!(failure.stage, StageName::Validation);
    }

    #[tokio::test]
    async fn test_unreadable_split_path_is_io_error() {
        let fx = fixture().await;
        let train = write_split(&fx.root, "train", "Visadataset.csv", "a,b,case_status\n1,x,0\n").await;
        // A regular file used as a directory cannot be probed.
        let test = train.join("Visadataset.csv");
        let ingestion = DataIngestionArtifact::new("raw.csv", train, test);

        let failure = fx.stage.execute(&ingestion).await.unwrap_err();

        assert_eq!(failure.kind(), ErrorKind::Io);
        assert!(!fx.stage.config().report_file_path.exists());
    }

    #[tokio::test]
    async fn test_failed_checks_named_and_report_written() {
        let fx = fixture().await;
        let train = write_split(&fx.root, "train", "Visadataset.csv", "a,b,case_status\n1,x,0\n").await;
        let test = write_split(&fx.root, "test", "Visadataset.csv", "a,b\n1,x\n").await;
        let ingestion = DataIngestionArtifact::new("raw.csv", train, test.clone());

        let failure = fx.stage.execute(&ingestion).await.unwrap_err();

        match failure.source {
            PipelineError::Validation(err) => {
                assert_eq!(err.failures.len(), 1);
                assert_eq!(err.failures[0].split, "test");
                assert_eq!(err.failures[0].file, test);
                assert!(err.failures[0]
                    .failed_checks
                    .contains(&ValidationCheck::ColumnCount));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fx.stage.config().report_file_path.exists());
    }
}
