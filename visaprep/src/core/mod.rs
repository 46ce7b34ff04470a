//! Core domain types shared by every stage.
//!
//! - Stage names and statuses
//! - The three stage artifacts
//! - Pipeline lifecycle events

mod artifact;
mod event;
mod status;

pub use artifact::{
    Artifact, DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact,
};
pub use event::PipelineEvent;
pub use status::{StageName, StageStatus};
