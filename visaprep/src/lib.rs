//! # Visaprep
//!
//! Data preparation for the visa approval dataset.
//!
//! A run executes three stages in order, each consuming the artifact of the
//! one before it:
//!
//! - **Ingestion**: download the raw CSV, derive `company_age`, binarize
//!   `case_status` and write a seeded train/test split
//! - **Validation**: check both splits against the dataset schema and write a
//!   JSON report
//! - **Transformation**: cap outliers, fit the grouped column transformer on
//!   the train split, rebalance with SMOTE+ENN and persist `.npy` matrices
//!   plus the fitted transformer
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use visaprep::prelude::*;
//! use std::sync::Arc;
//!
//! let provider = ConfigProvider::from_file("config/config.yaml", ".")?;
//! let mut pipeline = ConfiguredPipeline::from_config(&provider, Arc::new(LoggingEventSink::default()))?;
//! let summary = pipeline.run().await;
//! assert!(summary.succeeded());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod ingestion;
pub mod observability;
pub mod pipeline;
pub mod schema;
pub mod stages;
pub mod table;
pub mod testing;
pub mod transformation;
pub mod utils;
pub mod validation;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        ConfigProvider, DataIngestionConfig, DataTransformationConfig, DataValidationConfig,
        TrainingPipelineConfig,
    };
    pub use crate::core::{
        Artifact, DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact,
        PipelineEvent, StageName, StageStatus,
    };
    pub use crate::errors::{
        ConfigError, DataFormatError, DownloadError, ErrorKind, FailureSummary,
        MissingArtifactError, PipelineError, SchemaMismatchError, SerializationError,
        StageFailure, ValidationError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::ingestion::{DataIngestion, Downloader, HttpDownloader};
    pub use crate::pipeline::{ConfiguredPipeline, Pipeline, PipelineState, RunSummary};
    pub use crate::schema::{ColumnGroup, ColumnType, DatasetSchema};
    pub use crate::stages::{Stage, StageRecord, StageResult};
    pub use crate::table::{Column, Table, Value};
    pub use crate::transformation::{
        ColumnTransformer, DataTransformation, FittedColumnTransformer, TransformationInput,
    };
    pub use crate::utils::{iso_timestamp, Timestamp};
    pub use crate::validation::{DataValidation, SchemaValidator, ValidationCheck};
}
