//! Testing utilities for visaprep pipelines.
//!
//! This module provides:
//! - Scripted stages for driving the orchestrator
//! - Dataset, schema and configuration fixtures
//! - Assertions over run summaries

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_run_failed_at, assert_run_succeeded, assert_stage_statuses};
pub use fixtures::{
    config_yaml, visa_raw_csv, VISA_FILE_NAME, VISA_RAW_HEADER, VISA_SCHEMA_YAML,
};
pub use mocks::ScriptedStage;
