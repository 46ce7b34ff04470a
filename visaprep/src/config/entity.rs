//! Resolved per-stage configuration records.
//!
//! These are produced once by a [`ConfigProvider`](super::ConfigProvider),
//! owned by the orchestrator and borrowed by each stage. All paths are
//! absolute or relative to the root the provider was created with.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Pipeline-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPipelineConfig {
    /// Name used in logs and events.
    pub pipeline_name: String,
    /// Directory holding every stage's outputs.
    pub artifact_dir: PathBuf,
}

/// Settings for the ingestion stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIngestionConfig {
    /// Where to fetch the raw CSV from.
    pub dataset_download_url: String,
    /// Directory the raw file is downloaded into.
    pub raw_data_dir: PathBuf,
    /// Directory the training split is written to.
    pub ingested_train_dir: PathBuf,
    /// Directory the test split is written to.
    pub ingested_test_dir: PathBuf,
    /// Fraction of rows that go to the test split.
    pub test_size: f64,
    /// Seed of the split shuffle.
    pub random_state: u64,
    /// Year used to derive company age; the current UTC year when unset.
    pub current_year: Option<i64>,
    /// Request timeout of the HTTP download, in seconds.
    pub download_timeout_secs: u64,
}

impl DataIngestionConfig {
    /// Sets the reference year for company age.
    #[must_use]
    pub fn with_current_year(mut self, year: i64) -> Self {
        self.current_year = Some(year);
        self
    }

    /// Sets the download URL.
    #[must_use]
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.dataset_download_url = url.into();
        self
    }

    /// Request timeout of the HTTP download.
    #[must_use]
    pub const fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Returns the configured year or the current one.
    #[must_use]
    pub fn reference_year(&self) -> i64 {
        self.current_year.unwrap_or_else(crate::utils::current_year)
    }
}

/// Settings for the validation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidationConfig {
    /// The schema YAML file.
    pub schema_file_path: PathBuf,
    /// Where the JSON check report is written.
    pub report_file_path: PathBuf,
}

/// Settings for the transformation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTransformationConfig {
    /// The schema YAML file.
    pub schema_file_path: PathBuf,
    /// Directory of the transformed training matrix.
    pub transformed_train_dir: PathBuf,
    /// Directory of the transformed test matrix.
    pub transformed_test_dir: PathBuf,
    /// The persisted fitted transformer.
    pub preprocessed_object_file_path: PathBuf,
    /// Minimum distinct training values for a numeric column to be capped.
    pub continuous_min_distinct: usize,
    /// Seed of the rebalancing step.
    pub random_state: u64,
}
