//! Artifacts handed from one stage to the next.
//!
//! Each stage produces exactly one artifact describing where its outputs
//! were written. The success flag is only ever set by a stage that finished
//! every underlying operation; the orchestrator refuses to forward an
//! artifact whose flag is false.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Common behaviour of stage artifacts.
pub trait Artifact: Serialize + Send + Sync {
    /// Returns the success flag of the artifact.
    fn succeeded(&self) -> bool;

    /// Returns the human-readable message.
    fn message(&self) -> &str;

    /// Converts the artifact to a dictionary representation.
    fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => HashMap::new(),
        }
    }
}

/// Output of the ingestion stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIngestionArtifact {
    /// Path of the training split.
    pub train_file_path: PathBuf,
    /// Path of the test split.
    pub test_file_path: PathBuf,
    /// Path of the downloaded raw file.
    pub raw_file_path: PathBuf,
    /// Rows written to the training split.
    pub train_rows: usize,
    /// Rows written to the test split.
    pub test_rows: usize,
    /// True when download and split both succeeded.
    pub is_ingested: bool,
    /// Human-readable summary.
    pub message: String,
    /// When the artifact was created (ISO 8601).
    pub created_at: String,
}

impl DataIngestionArtifact {
    /// Creates a successful ingestion artifact.
    #[must_use]
    pub fn new(
        raw_file_path: impl Into<PathBuf>,
        train_file_path: impl Into<PathBuf>,
        test_file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            train_file_path: train_file_path.into(),
            test_file_path: test_file_path.into(),
            raw_file_path: raw_file_path.into(),
            train_rows: 0,
            test_rows: 0,
            is_ingested: true,
            message: "Data ingestion completed successfully.".to_string(),
            created_at: crate::utils::iso_timestamp(),
        }
    }

    /// Sets the row counts of both splits.
    #[must_use]
    pub fn with_rows(mut self, train_rows: usize, test_rows: usize) -> Self {
        self.train_rows = train_rows;
        self.test_rows = test_rows;
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Artifact for DataIngestionArtifact {
    fn succeeded(&self) -> bool {
        self.is_ingested
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// Output of the validation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    /// The schema the splits were checked against.
    pub schema_file_path: PathBuf,
    /// The JSON report with per-file check results.
    pub report_file_path: PathBuf,
    /// True when every check passed on both splits.
    pub is_validated: bool,
    /// Human-readable summary.
    pub message: String,
    /// When the artifact was created (ISO 8601).
    pub created_at: String,
}

impl DataValidationArtifact {
    /// Creates a successful validation artifact.
    #[must_use]
    pub fn new(schema_file_path: impl Into<PathBuf>, report_file_path: impl Into<PathBuf>) -> Self {
        Self {
            schema_file_path: schema_file_path.into(),
            report_file_path: report_file_path.into(),
            is_validated: true,
            message: "Data validation performed successfully.".to_string(),
            created_at: crate::utils::iso_timestamp(),
        }
    }
}

impl Artifact for DataValidationArtifact {
    fn succeeded(&self) -> bool {
        self.is_validated
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// Output of the transformation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTransformationArtifact {
    /// Transformed training matrix (`.npy`).
    pub transformed_train_file_path: PathBuf,
    /// Transformed test matrix (`.npy`).
    pub transformed_test_file_path: PathBuf,
    /// Fitted preprocessing object (bincode).
    pub preprocessed_object_file_path: PathBuf,
    /// Feature columns in each matrix, excluding the target.
    pub n_features: usize,
    /// Training rows after rebalancing.
    pub train_rows: usize,
    /// Test rows after rebalancing.
    pub test_rows: usize,
    /// SHA-256 of the training matrix file.
    pub train_digest: String,
    /// SHA-256 of the test matrix file.
    pub test_digest: String,
    /// True when every output was written.
    pub is_transformed: bool,
    /// Human-readable summary.
    pub message: String,
    /// When the artifact was created (ISO 8601).
    pub created_at: String,
}

impl DataTransformationArtifact {
    /// Creates a successful transformation artifact.
    #[must_use]
    pub fn new(
        transformed_train_file_path: impl Into<PathBuf>,
        transformed_test_file_path: impl Into<PathBuf>,
        preprocessed_object_file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transformed_train_file_path: transformed_train_file_path.into(),
            transformed_test_file_path: transformed_test_file_path.into(),
            preprocessed_object_file_path: preprocessed_object_file_path.into(),
            n_features: 0,
            train_rows: 0,
            test_rows: 0,
            train_digest: String::new(),
            test_digest: String::new(),
            is_transformed: true,
            message: "Data transformation successful.".to_string(),
            created_at: crate::utils::iso_timestamp(),
        }
    }

    /// Sets the matrix shapes.
    #[must_use]
    pub fn with_shape(mut self, n_features: usize, train_rows: usize, test_rows: usize) -> Self {
        self.n_features = n_features;
        self.train_rows = train_rows;
        self.test_rows = test_rows;
        self
    }

    /// Sets the content digests of both matrices.
    #[must_use]
    pub fn with_digests(mut self, train: impl Into<String>, test: impl Into<String>) -> Self {
        self.train_digest = train.into();
        self.test_digest = test.into();
        self
    }
}

impl Artifact for DataTransformationArtifact {
    fn succeeded(&self) -> bool {
        self.is_transformed
    }

    fn message(&self) -> &str {
        &self.message
    }
}
