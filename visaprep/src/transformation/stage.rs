//! The data transformation stage.

use super::column_transformer::ColumnTransformer;
use super::outlier::{cap_columns, continuous_columns};
use super::persist::save_numpy_array;
use super::resample::{class_counts, SmoteEnn};
use crate::config::DataTransformationConfig;
use crate::core::{
    DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact, StageName,
};
use crate::errors::{DataFormatError, MissingArtifactError, PipelineError, StageFailure};
use crate::schema::{ColumnGroup, DatasetSchema};
use crate::stages::{Stage, StageResult};
use crate::table::Table;
use async_trait::async_trait;
use ndarray::{concatenate, Array1, Array2, Axis};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Artifacts the transformation stage consumes.
#[derive(Debug, Clone)]
pub struct TransformationInput {
    /// Where the train/test splits were written.
    pub ingestion: DataIngestionArtifact,
    /// Which schema the splits passed.
    pub validation: DataValidationArtifact,
}

/// Fits the preprocessing object on the train split and writes model-ready
/// matrices for both splits.
#[derive(Debug, Clone)]
pub struct DataTransformation {
    config: DataTransformationConfig,
}

impl DataTransformation {
    /// Creates the stage.
    #[must_use]
    pub fn new(config: DataTransformationConfig) -> Self {
        Self { config }
    }

    /// Returns the stage configuration.
    #[must_use]
    pub fn config(&self) -> &DataTransformationConfig {
        &self.config
    }

    async fn load_split(schema: &DatasetSchema, path: &Path) -> Result<Table, PipelineError> {
        let raw = Table::read_csv(path).await?;
        schema.coerce(&raw, path)
    }

    /// Extracts the integer labels of the target column.
    ///
    /// # Errors
    ///
    /// Returns `DataFormatError` if the column is absent or holds a null or
    /// non-integer label.
    pub fn target_labels(table: &Table, target: &str) -> Result<Array1<i64>, DataFormatError> {
        let column = table.require_column(target)?;
        column
            .values
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.as_i64().ok_or_else(|| {
                    DataFormatError::new(format!("row {}: label '{v}' is not an integer", row + 1))
                        .with_column(target)
                })
            })
            .collect()
    }

    /// Path of the `.npy` matrix written for a split CSV.
    #[must_use]
    pub fn matrix_path(dir: &Path, csv_path: &Path) -> PathBuf {
        let name = csv_path
            .file_name()
            .map_or_else(|| PathBuf::from("data"), PathBuf::from);
        dir.join(name.with_extension("npy"))
    }

    fn with_target(features: &Array2<f64>, labels: &Array1<i64>) -> Result<Array2<f64>, DataFormatError> {
        let target = labels.mapv(|v| v as f64).insert_axis(Axis(1));
        concatenate(Axis(1), &[features.view(), target.view()])
            .map_err(|e| DataFormatError::new(format!("failed to append target: {e}")))
    }

    /// Runs the full transformation.
    ///
    /// # Errors
    ///
    /// Returns `MissingArtifactError` if a split is absent,
    /// `SchemaMismatchError` for undeclared columns (before any fitting),
    /// `DataFormatError` for unparseable cells, and IO or serialization
    /// errors while persisting.
    pub async fn transform(
        &self,
        input: &TransformationInput,
    ) -> Result<DataTransformationArtifact, PipelineError> {
        let train_path = input.ingestion.train_file_path.as_path();
        let test_path = input.ingestion.test_file_path.as_path();

        let mut missing = Vec::new();
        for path in [train_path, test_path] {
            if !tokio::fs::try_exists(path)
                .await
                .map_err(|e| PipelineError::io(path, e))?
            {
                missing.push(path.to_path_buf());
            }
        }
        if !missing.is_empty() {
            return Err(
                MissingArtifactError::paths_not_found(StageName::Transformation, missing).into(),
            );
        }

        let schema = DatasetSchema::load(&input.validation.schema_file_path).await?;
        let train = Self::load_split(&schema, train_path).await?;
        let test = Self::load_split(&schema, test_path).await?;
        let target = schema.target_column.as_str();

        let y_train = Self::target_labels(&train, target).map_err(|e| e.with_file(train_path))?;
        let y_test = Self::target_labels(&test, target).map_err(|e| e.with_file(test_path))?;
        let train = train.without_columns(&[target]);
        let test = test.without_columns(&[target]);

        // Only the numerical group is capped; power-transformed columns keep their tails.
        let continuous = continuous_columns(
            &train,
            schema.group(ColumnGroup::Numeric),
            self.config.continuous_min_distinct,
        );
        debug!(columns = ?continuous, "Capping continuous columns");
        let train = cap_columns(&train, &continuous).map_err(|e| e.with_file(train_path))?;
        let test = cap_columns(&test, &continuous).map_err(|e| e.with_file(test_path))?;

        let fitted = ColumnTransformer::from_schema(&schema)
            .fit(&train)
            .map_err(|e| e.with_file(train_path))?;
        let x_train = fitted.transform(&train).map_err(|e| e.with_file(train_path))?;
        let x_test = fitted.transform(&test).map_err(|e| e.with_file(test_path))?;

        let resampler = SmoteEnn::new(self.config.random_state);
        let train_out = resampler.fit_resample(&x_train, &y_train);
        let test_out = resampler.fit_resample(&x_test, &y_test);
        info!(
            before = ?class_counts(&y_train),
            after = ?class_counts(&train_out.y),
            "Train split rebalanced"
        );

        let train_matrix = Self::with_target(&train_out.x, &train_out.y)?;
        let test_matrix = Self::with_target(&test_out.x, &test_out.y)?;

        let train_npy = Self::matrix_path(&self.config.transformed_train_dir, train_path);
        let test_npy = Self::matrix_path(&self.config.transformed_test_dir, test_path);
        let train_digest = save_numpy_array(&train_npy, &train_matrix).await?;
        let test_digest = save_numpy_array(&test_npy, &test_matrix).await?;
        fitted.save(&self.config.preprocessed_object_file_path).await?;

        info!(
            features = fitted.n_features_out(),
            train_rows = train_matrix.nrows(),
            test_rows = test_matrix.nrows(),
            object = %self.config.preprocessed_object_file_path.display(),
            "Transformation complete"
        );

        Ok(DataTransformationArtifact::new(
            train_npy,
            test_npy,
            &self.config.preprocessed_object_file_path,
        )
        .with_shape(fitted.n_features_out(), train_matrix.nrows(), test_matrix.nrows())
        .with_digests(train_digest, test_digest))
    }
}

#[async_trait]
impl Stage for DataTransformation {
    type Input = TransformationInput;
    type Output = DataTransformationArtifact;

    fn name(&self) -> StageName {
        StageName::Transformation
    }

    async fn execute(&self, input: &Self::Input) -> StageResult<Self::Output> {
        self.transform(input)
            .await
            .map_err(|e| StageFailure::new(StageName::Transformation, e))
    }
}
