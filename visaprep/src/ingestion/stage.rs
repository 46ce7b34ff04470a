//! The data ingestion stage.

use super::download::{download, Downloader, HttpDownloader};
use super::split::{prepare, train_test_split};
use crate::config::DataIngestionConfig;
use crate::core::{DataIngestionArtifact, StageName};
use crate::errors::{DataFormatError, DownloadError, PipelineError, StageFailure};
use crate::stages::{Stage, StageResult};
use crate::table::Table;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Downloads the raw dataset and writes the train and test splits.
#[derive(Clone)]
pub struct DataIngestion {
    config: DataIngestionConfig,
    downloader: Arc<dyn Downloader>,
}

impl fmt::Debug for DataIngestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataIngestion")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DataIngestion {
    /// Creates the stage with an HTTP downloader using the configured
    /// request timeout.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the HTTP client cannot be built.
    pub fn new(config: DataIngestionConfig) -> Result<Self, DownloadError> {
        let downloader = HttpDownloader::new(config.download_timeout())?;
        Ok(Self::with_downloader(config, Arc::new(downloader)))
    }

    /// Creates the stage with a custom downloader.
    #[must_use]
    pub fn with_downloader(config: DataIngestionConfig, downloader: Arc<dyn Downloader>) -> Self {
        Self { config, downloader }
    }

    /// Returns the stage configuration.
    #[must_use]
    pub fn config(&self) -> &DataIngestionConfig {
        &self.config
    }

    /// Downloads the dataset into the raw data directory.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` or an IO error.
    pub async fn download(&self) -> Result<std::path::PathBuf, PipelineError> {
        download(
            self.downloader.as_ref(),
            &self.config.dataset_download_url,
            &self.config.raw_data_dir,
        )
        .await
    }

    /// Prepares the raw file and writes both splits under its file name.
    ///
    /// # Errors
    ///
    /// Returns `DataFormatError` if the raw file does not have the expected
    /// columns or values, or an IO error.
    pub async fn split(&self, raw_file_path: &Path) -> Result<DataIngestionArtifact, PipelineError> {
        let file_name = raw_file_path.file_name().ok_or_else(|| {
            DataFormatError::new("raw file path has no file name").with_file(raw_file_path)
        })?;

        info!(path = %raw_file_path.display(), "Reading raw dataset");
        let raw = Table::read_csv(raw_file_path).await?;
        let year = self.config.reference_year();
        let prepared = prepare(&raw, year).map_err(|e| e.with_file(raw_file_path))?;

        let (train, test) =
            train_test_split(&prepared, self.config.test_size, self.config.random_state)
                .map_err(|e| e.with_file(raw_file_path))?;

        let train_file_path = self.config.ingested_train_dir.join(file_name);
        let test_file_path = self.config.ingested_test_dir.join(file_name);
        train.write_csv(&train_file_path).await?;
        test.write_csv(&test_file_path).await?;

        info!(
            train = %train_file_path.display(),
            test = %test_file_path.display(),
            train_rows = train.n_rows(),
            test_rows = test.n_rows(),
            current_year = year,
            "Dataset split into train and test"
        );

        Ok(
            DataIngestionArtifact::new(raw_file_path, train_file_path, test_file_path)
                .with_rows(train.n_rows(), test.n_rows()),
        )
    }

    /// Downloads then splits.
    ///
    /// # Errors
    ///
    /// Returns the first error of either step.
    pub async fn run(&self) -> Result<DataIngestionArtifact, PipelineError> {
        let raw_file_path = self.download().await?;
        self.split(&raw_file_path).await
    }
}

#[async_trait]
impl Stage for DataIngestion {
    type Input = ();
    type Output = DataIngestionArtifact;

    fn name(&self) -> StageName {
        StageName::Ingestion
    }

    async fn execute(&self, _input: &Self::Input) -> StageResult<Self::Output> {
        self.run()
            .await
            .map_err(|e| StageFailure::new(StageName::Ingestion, e))
    }
}
