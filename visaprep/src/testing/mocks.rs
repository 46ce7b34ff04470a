//! Scripted stages for driving the orchestrator in tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use crate::core::{Artifact, StageName};
use crate::errors::{PipelineError, StageFailure};
use crate::stages::{Stage, StageResult};

type ErrorFactory = Arc<dyn Fn() -> PipelineError + Send + Sync>;

/// A stage that returns a fixed artifact or a fixed error and records every
/// input it receives.
pub struct ScriptedStage<I, O> {
    name: StageName,
    output: Option<O>,
    error: Option<ErrorFactory>,
    inputs: Mutex<Vec<I>>,
}

impl<I, O> ScriptedStage<I, O> {
    /// Creates a stage that succeeds with `output`.
    #[must_use]
    pub fn succeeding(name: StageName, output: O) -> Self {
        Self {
            name,
            output: Some(output),
            error: None,
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Creates a stage that fails with `error`.
    #[must_use]
    pub fn failing<E>(name: StageName, error: E) -> Self
    where
        E: Into<PipelineError> + Clone + Send + Sync + 'static,
    {
        Self {
            name,
            output: None,
            error: Some(Arc::new(move || error.clone().into())),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Returns how many times the stage ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inputs.lock().len()
    }
}

impl<I: Clone, O> ScriptedStage<I, O> {
    /// Returns every input the stage received.
    #[must_use]
    pub fn recorded_inputs(&self) -> Vec<I> {
        self.inputs.lock().clone()
    }
}

impl<I, O> fmt::Debug for ScriptedStage<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedStage")
            .field("name", &self.name)
            .field("fails", &self.error.is_some())
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl<I, O> Stage for ScriptedStage<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Artifact + Clone + 'static,
{
    type Input = I;
    type Output = O;

    fn name(&self) -> StageName {
        self.name
    }

    async fn execute(&self, input: &Self::Input) -> StageResult<Self::Output> {
        self.inputs.lock().push(input.clone());
        match (&self.output, &self.error) {
            (Some(output), _) => Ok(output.clone()),
            (None, Some(error)) => Err(StageFailure::new(self.name, error())),
            (None, None) => Err(StageFailure::new(
                self.name,
                crate::errors::ConfigError::new("scripted stage has no outcome"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataIngestionArtifact;
    use crate::errors::{DownloadError, ErrorKind};

    #[tokio::test]
    async fn test_succeeding_stage_records_input() {
        let artifact = DataIngestionArtifact::new("raw.csv", "train.csv", "test.csv");
        let stage: ScriptedStage<(), _> = ScriptedStage::succeeding(StageName::Ingestion, artifact.clone());

        let out = stage.execute(&()).await.unwrap();

        assert_eq!(out, artifact);
        assert_eq!(stage.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_stage() {
        let stage: ScriptedStage<(), DataIngestionArtifact> = ScriptedStage::failing(
            StageName::Ingestion,
            DownloadError::new("http://x", "unreachable"),
        );

        let failure = stage.execute(&()).await.unwrap_err();

        assert_eq!(failure.kind(), ErrorKind::Download);
        assert_eq!(failure.stage, StageName::Ingestion);
    }
}
