//! Configuration for the pipeline stages.
//!
//! A single YAML file holds one section per stage plus pipeline-wide
//! settings. [`ConfigProvider`] parses it once and hands out resolved,
//! immutable stage records.

mod entity;
mod provider;

pub use entity::{
    DataIngestionConfig, DataTransformationConfig, DataValidationConfig, TrainingPipelineConfig,
};
pub use provider::ConfigProvider;
