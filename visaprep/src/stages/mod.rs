//! Stage trait and execution records.
//!
//! Stages are the units of work the orchestrator sequences. Each consumes
//! the artifact of its predecessor and produces exactly one artifact of its
//! own, or a [`StageFailure`].

mod record;

pub use record::StageRecord;

use crate::core::{Artifact, StageName};
use crate::errors::StageFailure;
use async_trait::async_trait;
use std::fmt::Debug;

/// Outcome of a stage.
pub type StageResult<T> = Result<T, StageFailure>;

/// Trait for pipeline stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// What the stage consumes.
    type Input: Send + Sync;

    /// The artifact the stage produces.
    type Output: Artifact + Clone;

    /// Returns the name of the stage.
    fn name(&self) -> StageName;

    /// Executes the stage.
    ///
    /// # Errors
    ///
    /// Returns a [`StageFailure`] enriched with this stage's name when any
    /// underlying operation fails.
    async fn execute(&self, input: &Self::Input) -> StageResult<Self::Output>;
}
