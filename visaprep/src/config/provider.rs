//! YAML-backed configuration provider.

use super::entity::{
    DataIngestionConfig, DataTransformationConfig, DataValidationConfig, TrainingPipelineConfig,
};
use crate::errors::{ConfigError, PipelineError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const TRAINING_PIPELINE_KEY: &str = "training_pipeline_config";
const DATA_INGESTION_KEY: &str = "data_ingestion_config";
const DATA_VALIDATION_KEY: &str = "data_validation_config";
const DATA_TRANSFORMATION_KEY: &str = "data_transformation_config";

const DATA_INGESTION_ARTIFACT_DIR: &str = "data_ingestion";
const DATA_VALIDATION_ARTIFACT_DIR: &str = "data_validation";
const DATA_TRANSFORMATION_ARTIFACT_DIR: &str = "data_transformation";
const VALIDATION_REPORT_FILE_NAME: &str = "validation_report.json";

#[derive(Debug, Deserialize)]
struct TrainingPipelineSection {
    pipeline_name: String,
    artifact_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct DataIngestionSection {
    dataset_download_url: String,
    raw_data_dir: PathBuf,
    ingested_train_dir: PathBuf,
    ingested_test_dir: PathBuf,
    #[serde(default = "default_test_size")]
    test_size: f64,
    #[serde(default = "default_random_state")]
    random_state: u64,
    #[serde(default)]
    current_year: Option<i64>,
    #[serde(default = "default_download_timeout_secs")]
    download_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct DataValidationSection {
    schema_dir: PathBuf,
    #[serde(alias = "schema_file_path")]
    schema_file_name: String,
}

#[derive(Debug, Deserialize)]
struct DataTransformationSection {
    transformed_train_dir: PathBuf,
    transformed_test_dir: PathBuf,
    preprocessing_dir: PathBuf,
    #[serde(alias = "preprocessed_object_file_path")]
    preprocessed_object_file_name: String,
    #[serde(default = "default_continuous_min_distinct")]
    continuous_min_distinct: usize,
    #[serde(default = "default_random_state")]
    random_state: u64,
}

fn default_test_size() -> f64 {
    0.2
}

fn default_download_timeout_secs() -> u64 {
    60
}

fn default_random_state() -> u64 {
    42
}

fn default_continuous_min_distinct() -> usize {
    25
}

/// Resolves stage configuration from a static YAML document.
///
/// The provider is pure: every getter re-reads the already parsed document,
/// so repeated calls return equal values.
#[derive(Debug, Clone)]
pub struct ConfigProvider {
    document: serde_yaml::Value,
    root: PathBuf,
    source: Option<PathBuf>,
}

impl ConfigProvider {
    /// Parses a YAML document; relative paths resolve against `root`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the document is not valid YAML or not a mapping.
    pub fn from_yaml_str(yaml: &str, root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let document: serde_yaml::Value = serde_yaml::from_str(yaml)
            .map_err(|e| ConfigError::new(format!("invalid YAML: {e}")))?;
        if !document.is_mapping() {
            return Err(ConfigError::new("configuration root must be a mapping"));
        }
        Ok(Self {
            document,
            root: root.into(),
            source: None,
        })
    }

    /// Reads and parses a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Io` if the file cannot be read and
    /// `PipelineError::Config` if it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>, root: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let mut provider =
            Self::from_yaml_str(&contents, root).map_err(|e| e.with_path(path))?;
        provider.source = Some(path.to_path_buf());
        debug!(path = %path.display(), "Loaded configuration file");
        Ok(provider)
    }

    /// Returns the root relative paths resolve against.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn section<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self
            .document
            .get(key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| self.attach_source(ConfigError::missing_key(key)))?;
        serde_yaml::from_value(value.clone()).map_err(|e| {
            self.attach_source(
                ConfigError::new(format!("invalid section '{key}': {e}")).with_key(key),
            )
        })
    }

    fn attach_source(&self, err: ConfigError) -> ConfigError {
        match &self.source {
            Some(path) => err.with_path(path),
            None => err,
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Returns the pipeline-wide settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the section or one of its keys is missing.
    pub fn get_training_pipeline_config(&self) -> Result<TrainingPipelineConfig, ConfigError> {
        let section: TrainingPipelineSection = self.section(TRAINING_PIPELINE_KEY)?;
        Ok(TrainingPipelineConfig {
            pipeline_name: section.pipeline_name,
            artifact_dir: self.resolve(&section.artifact_dir),
        })
    }

    fn stage_dir(&self, stage_dir: &str) -> Result<PathBuf, ConfigError> {
        Ok(self.get_training_pipeline_config()?.artifact_dir.join(stage_dir))
    }

    /// Returns the ingestion stage settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a section or key is missing, or if
    /// `test_size` is not strictly between 0 and 1.
    pub fn get_ingestion_config(&self) -> Result<DataIngestionConfig, ConfigError> {
        let section: DataIngestionSection = self.section(DATA_INGESTION_KEY)?;
        if !(section.test_size > 0.0 && section.test_size < 1.0) {
            return Err(self.attach_source(
                ConfigError::new(format!(
                    "test_size must be between 0 and 1, got {}",
                    section.test_size
                ))
                .with_key(format!("{DATA_INGESTION_KEY}.test_size")),
            ));
        }
        if section.download_timeout_secs == 0 {
            return Err(self.attach_source(
                ConfigError::new("download_timeout_secs must be positive")
                    .with_key(format!("{DATA_INGESTION_KEY}.download_timeout_secs")),
            ));
        }
        let base = self.stage_dir(DATA_INGESTION_ARTIFACT_DIR)?;
        Ok(DataIngestionConfig {
            dataset_download_url: section.dataset_download_url,
            raw_data_dir: base.join(section.raw_data_dir),
            ingested_train_dir: base.join(section.ingested_train_dir),
            ingested_test_dir: base.join(section.ingested_test_dir),
            test_size: section.test_size,
            random_state: section.random_state,
            current_year: section.current_year,
            download_timeout_secs: section.download_timeout_secs,
        })
    }

    fn schema_file_path(&self) -> Result<PathBuf, ConfigError> {
        let section: DataValidationSection = self.section(DATA_VALIDATION_KEY)?;
        Ok(self
            .resolve(&section.schema_dir)
            .join(section.schema_file_name))
    }

    /// Returns the validation stage settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a section or key is missing.
    pub fn get_validation_config(&self) -> Result<DataValidationConfig, ConfigError> {
        let schema_file_path = self.schema_file_path()?;
        let base = self.stage_dir(DATA_VALIDATION_ARTIFACT_DIR)?;
        Ok(DataValidationConfig {
            schema_file_path,
            report_file_path: base.join(VALIDATION_REPORT_FILE_NAME),
        })
    }

    /// Returns the transformation stage settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a section or key is missing, or if
    /// `continuous_min_distinct` is zero.
    pub fn get_transformation_config(&self) -> Result<DataTransformationConfig, ConfigError> {
        let section: DataTransformationSection = self.section(DATA_TRANSFORMATION_KEY)?;
        if section.continuous_min_distinct == 0 {
            return Err(self.attach_source(
                ConfigError::new("continuous_min_distinct must be at least 1")
                    .with_key(format!("{DATA_TRANSFORMATION_KEY}.continuous_min_distinct")),
            ));
        }
        let schema_file_path = self.schema_file_path()?;
        let base = self.stage_dir(DATA_TRANSFORMATION_ARTIFACT_DIR)?;
        Ok(DataTransformationConfig {
            schema_file_path,
            transformed_train_dir: base.join(section.transformed_train_dir),
            transformed_test_dir: base.join(section.transformed_test_dir),
            preprocessed_object_file_path: base
                .join(section.preprocessing_dir)
                .join(section.preprocessed_object_file_name),
            continuous_min_distinct: section.continuous_min_distinct,
            random_state: section.random_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const CONFIG: &str = r#"
training_pipeline_config:
  pipeline_name: visa
  artifact_dir: artifact
data_ingestion_config:
  dataset_download_url: https://example.com/data/Visadataset.csv
  raw_data_dir: raw_data
  ingested_train_dir: train
  ingested_test_dir: test
data_validation_config:
  schema_dir: config
  schema_file_name: schema.yaml
data_transformation_config:
  transformed_train_dir: train
  transformed_test_dir: test
  preprocessing_dir: preprocessed
  preprocessed_object_file_name: preprocessed.bin
"#;

    fn provider() -> ConfigProvider {
        ConfigProvider::from_yaml_str(CONFIG, "/work").unwrap()
    }

    #[test]
    fn test_ingestion_config_resolves_layout() {
        let config = provider().get_ingestion_config().unwrap();

        assert_eq!(
            config.raw_data_dir,
            PathBuf::from("/work/artifact/data_ingestion/raw_data")
        );
        assert_eq!(
            config.ingested_test_dir,
            PathBuf::from("/work/artifact/data_ingestion/test")
        );
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.random_state, 42);
        assert_eq!(config.current_year, None);
        assert_eq!(config.download_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_validation_config_paths() {
        let config = provider().get_validation_config().unwrap();

        assert_eq!(config.schema_file_path, PathBuf::from("/work/config/schema.yaml"));
        assert_eq!(
            config.report_file_path,
            PathBuf::from("/work/artifact/data_validation/validation_report.json")
        );
    }

    #[test]
    fn test_transformation_config_paths() {
        let config = provider().get_transformation_config().unwrap();

        assert_eq!(
            config.preprocessed_object_file_path,
            PathBuf::from("/work/artifact/data_transformation/preprocessed/preprocessed.bin")
        );
        assert_eq!(config.continuous_min_distinct, 25);
    }

    #[test]
    fn test_getters_are_deterministic() {
        let provider = provider();
        assert_eq!(
            provider.get_ingestion_config().unwrap(),
            provider.get_ingestion_config().unwrap()
        );
    }

    #[test]
    fn test_missing_section_names_key() {
        let provider = ConfigProvider::from_yaml_str(
            "training_pipeline_config: {pipeline_name: v, artifact_dir: a}",
            "/work",
        )
        .unwrap();

        let err = provider.get_ingestion_config().unwrap_err();
        assert_eq!(err.key.as_deref(), Some("data_ingestion_config"));
    }

    #[test]
    fn test_missing_field_in_section() {
        let yaml = CONFIG.replace("  raw_data_dir: raw_data\n", "");
        let provider = ConfigProvider::from_yaml_str(&yaml, "/work").unwrap();

        let err = provider.get_ingestion_config().unwrap_err();
        assert!(err.message.contains("raw_data_dir"));
    }

    #[test]
    fn test_invalid_test_size() {
        let yaml = CONFIG.replace("  ingested_test_dir: test\n", "  ingested_test_dir: test\n  test_size: 1.5\n");
        let provider = ConfigProvider::from_yaml_str(&yaml, "/work").unwrap();

        let err = provider.get_ingestion_config().unwrap_err();
        assert_eq!(err.key.as_deref(), Some("data_ingestion_config.test_size"));
    }

    #[test]
    fn test_zero_download_timeout() {
        let yaml = CONFIG.replace(
            "  ingested_test_dir: test\n",
            "  ingested_test_dir: test\n  download_timeout_secs: 0\n",
        );
        let provider = ConfigProvider::from_yaml_str(&yaml, "/work").unwrap();

        let err = provider.get_ingestion_config().unwrap_err();
        assert_eq!(
            err.key.as_deref(),
            Some("data_ingestion_config.download_timeout_secs")
        );
    }

    #[test]
    fn test_absolute_artifact_dir_is_kept() {
        let yaml = CONFIG.replace("artifact_dir: artifact", "artifact_dir: /tmp/out");
        let provider = ConfigProvider::from_yaml_str(&yaml, "/work").unwrap();

        let config = provider.get_training_pipeline_config().unwrap();
        assert_eq!(config.artifact_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_non_mapping_document_rejected() {
        assert!(ConfigProvider::from_yaml_str("- a\n- b\n", "/work").is_err());
    }
}
