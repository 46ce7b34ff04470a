//! Pipeline orchestration.
//!
//! This module provides:
//! - The run state machine
//! - The sequential orchestrator and its run summary

mod orchestrator;
mod state;

pub use orchestrator::{ConfiguredPipeline, Pipeline, RunSummary};
pub use state::PipelineState;
