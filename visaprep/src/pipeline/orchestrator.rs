//! Sequential orchestrator for the three stages.

use super::state::PipelineState;
use crate::config::ConfigProvider;
use crate::core::{
    Artifact, DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact,
    PipelineEvent, StageName,
};
use crate::errors::{MissingArtifactError, PipelineError, StageFailure};
use crate::events::EventSink;
use crate::ingestion::DataIngestion;
use crate::observability::StageTimer;
use crate::stages::{Stage, StageRecord, StageResult};
use crate::transformation::{DataTransformation, TransformationInput};
use crate::validation::DataValidation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// What a run did, in a form suitable for printing as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique id of the run.
    pub run_id: String,
    /// Pipeline name from the configuration.
    pub pipeline_name: String,
    /// Final state.
    pub state: PipelineState,
    /// One record per executed stage.
    pub stages: Vec<StageRecord>,
    /// Total wall time in milliseconds.
    pub duration_ms: f64,
    /// The transformation artifact on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<DataTransformationArtifact>,
}

impl RunSummary {
    /// Returns true if every stage finished.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Transformed
    }
}

/// The stages wired from configuration.
pub type ConfiguredPipeline = Pipeline<DataIngestion, DataValidation, DataTransformation>;

/// Runs ingestion, validation and transformation in order.
///
/// Each stage receives the artifacts of the stages before it; the first
/// failure ends the run and later stages never execute.
pub struct Pipeline<I, V, T> {
    name: String,
    ingestion: I,
    validation: V,
    transformation: T,
    sink: Arc<dyn EventSink>,
    state: PipelineState,
    records: Vec<StageRecord>,
}

impl<I, V, T> Pipeline<I, V, T>
where
    I: Stage<Input = (), Output = DataIngestionArtifact>,
    V: Stage<Input = DataIngestionArtifact, Output = DataValidationArtifact>,
    T: Stage<Input = TransformationInput, Output = DataTransformationArtifact>,
{
    /// Creates a pipeline from explicit stages.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        ingestion: I,
        validation: V,
        transformation: T,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            name: name.into(),
            ingestion,
            validation,
            transformation,
            sink,
            state: PipelineState::Created,
            records: Vec::new(),
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Returns the records of the stages executed so far.
    #[must_use]
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Executes every stage and returns the run summary. A failed run is
    /// reported through the summary's state, not as an error.
    pub async fn run(&mut self) -> RunSummary {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("pipeline_run", run_id = %run_id, pipeline = %self.name);
        let start = Instant::now();

        self.state = PipelineState::Created;
        self.records.clear();
        self.sink
            .emit(&PipelineEvent::pipeline_started(&run_id, &self.name))
            .await;

        let outcome = self.run_stages().instrument(span.clone()).await;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        let _entered = span.enter();
        let artifact = match outcome {
            Ok(artifact) => {
                info!(duration_ms, "Pipeline completed");
                self.sink
                    .try_emit(&PipelineEvent::pipeline_completed(&run_id, duration_ms));
                Some(artifact)
            }
            Err(failure) => {
                let summary = failure.summary();
                error!(
                    stage = %summary.stage,
                    kind = %summary.kind,
                    location = %summary.location,
                    error = %summary.detail,
                    "Pipeline failed"
                );
                self.sink
                    .try_emit(&PipelineEvent::pipeline_failed(&run_id, &summary));
                self.state = PipelineState::fail(summary);
                None
            }
        };

        RunSummary {
            run_id,
            pipeline_name: self.name.clone(),
            state: self.state.clone(),
            stages: self.records.clone(),
            duration_ms,
            artifact,
        }
    }

    async fn run_stages(&mut self) -> StageResult<DataTransformationArtifact> {
        let ingestion =
            execute_stage(&self.ingestion, &(), self.sink.as_ref(), &mut self.records).await?;
        self.advance(StageName::Ingestion)?;

        let validation = execute_stage(
            &self.validation,
            &ingestion,
            self.sink.as_ref(),
            &mut self.records,
        )
        .await?;
        self.advance(StageName::Validation)?;

        let input = TransformationInput {
            ingestion,
            validation,
        };
        let transformation = execute_stage(
            &self.transformation,
            &input,
            self.sink.as_ref(),
            &mut self.records,
        )
        .await?;
        self.advance(StageName::Transformation)?;

        Ok(transformation)
    }

    #[track_caller]
    fn advance(&mut self, stage: StageName) -> StageResult<()> {
        match self.state.advance(stage) {
            Some(next) => {
                self.state = next;
                Ok(())
            }
            None => Err(StageFailure::new(
                stage,
                MissingArtifactError::new(
                    stage,
                    format!("{stage} cannot complete from state {}", self.state),
                ),
            )),
        }
    }
}

impl<I: fmt::Debug, V: fmt::Debug, T: fmt::Debug> fmt::Debug for Pipeline<I, V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("ingestion", &self.ingestion)
            .field("validation", &self.validation)
            .field("transformation", &self.transformation)
            .field("state", &self.state)
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl ConfiguredPipeline {
    /// Wires the three stages from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any stage section is missing or invalid, or
    /// `DownloadError` if the HTTP client cannot be built.
    pub fn from_config(
        provider: &ConfigProvider,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, PipelineError> {
        let pipeline = provider.get_training_pipeline_config()?;
        Ok(Self::new(
            pipeline.pipeline_name,
            DataIngestion::new(provider.get_ingestion_config()?)?,
            DataValidation::new(provider.get_validation_config()?),
            DataTransformation::new(provider.get_transformation_config()?),
            sink,
        ))
    }
}

/// Runs one stage, records the outcome and emits lifecycle events.
///
/// An artifact whose success flag is false is treated as a failure so it is
/// never forwarded.
async fn execute_stage<S: Stage>(
    stage: &S,
    input: &S::Input,
    sink: &dyn EventSink,
    records: &mut Vec<StageRecord>,
) -> StageResult<S::Output> {
    let name = stage.name();
    sink.emit(&PipelineEvent::stage_started(name)).await;
    info!(stage = %name, "Stage started");
    let timer = StageTimer::start();

    let result = stage
        .execute(input)
        .instrument(info_span!("stage", stage = %name))
        .await
        .and_then(|artifact| {
            if artifact.succeeded() {
                Ok(artifact)
            } else {
                Err(StageFailure::new(
                    name,
                    MissingArtifactError::new(
                        name,
                        format!("{name} returned an unsuccessful artifact: {}", artifact.message()),
                    ),
                ))
            }
        });

    match result {
        Ok(artifact) => {
            let duration_ms = timer.elapsed_ms();
            info!(stage = %name, duration_ms, "Stage completed");
            records.push(StageRecord::completed(name, timer.started_at(), artifact.to_dict()));
            sink.emit(&PipelineEvent::stage_completed(name, duration_ms)).await;
            Ok(artifact)
        }
        Err(failure) => {
            let summary = failure.summary();
            error!(stage = %name, kind = %summary.kind, error = %summary.detail, "Stage failed");
            records.push(StageRecord::failed(name, timer.started_at(), summary.clone()));
            sink.emit(&PipelineEvent::stage_failed(&summary)).await;
            Err(failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageStatus;
    use crate::errors::{DataFormatError, ErrorKind, FileValidationFailure, ValidationError};
    use crate::events::CollectingEventSink;
    use crate::testing::{
        assert_run_failed_at, assert_run_succeeded, assert_stage_statuses, ScriptedStage,
    };
    use crate::validation::ValidationCheck;
    use pretty_assertions::assert_eq;

    type Scripted = Pipeline<
        ScriptedStage<(), DataIngestionArtifact>,
        ScriptedStage<DataIngestionArtifact, DataValidationArtifact>,
        ScriptedStage<TransformationInput, DataTransformationArtifact>,
    >;

    fn ingestion_artifact() -> DataIngestionArtifact {
        DataIngestionArtifact::new(
            "/a/raw/Visadataset.csv",
            "/a/train/Visadataset.csv",
            "/a/test/Visadataset.csv",
        )
    }

    fn validation_artifact() -> DataValidationArtifact {
        DataValidationArtifact::new("/cfg/schema.yaml", "/a/report.json")
    }

    fn transformation_artifact() -> DataTransformationArtifact {
        DataTransformationArtifact::new("/a/t/train.npy", "/a/t/test.npy", "/a/p.bin")
    }

    fn pipeline(
        validation: ScriptedStage<DataIngestionArtifact, DataValidationArtifact>,
        sink: Arc<CollectingEventSink>,
    ) -> Scripted {
        Pipeline::new(
            "visa",
            ScriptedStage::succeeding(StageName::Ingestion, ingestion_artifact()),
            validation,
            ScriptedStage::succeeding(StageName::Transformation, transformation_artifact()),
            sink,
        )
    }

    #[tokio::test]
    async fn test_successful_run() {
        let sink = Arc::new(CollectingEventSink::new());
        let mut pipeline = pipeline(
            ScriptedStage::succeeding(StageName::Validation, validation_artifact()),
            sink.clone(),
        );

        let summary = pipeline.run().await;

        assert_run_succeeded(&summary);
        assert_stage_statuses(
            &summary,
            &[
                (StageName::Ingestion, StageStatus::Ok),
                (StageName::Validation, StageStatus::Ok),
                (StageName::Transformation, StageStatus::Ok),
            ],
        );
        assert_eq!(summary.artifact, Some(transformation_artifact()));
        assert_eq!(sink.events_of_type("stage.completed").len(), 3);
        assert_eq!(sink.event_types().last().map(String::as_str), Some("pipeline.completed"));
    }

    #[tokio::test]
    async fn test_transformation_receives_ingestion_paths() {
        let sink = Arc::new(CollectingEventSink::new());
        let mut pipeline = pipeline(
            ScriptedStage::succeeding(StageName::Validation, validation_artifact()),
            sink,
        );

        pipeline.run().await;

        let inputs = pipeline.transformation.recorded_inputs();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].ingestion, ingestion_artifact());
        assert_eq!(inputs[0].validation, validation_artifact());
        assert_eq!(pipeline.validation.recorded_inputs(), vec![ingestion_artifact()]);
    }

    #[tokio::test]
    async fn test_failure_stops_later_stages() {
        let sink = Arc::new(CollectingEventSink::new());
        let error = ValidationError::new(vec![FileValidationFailure {
            split: "test".to_string(),
            file: "/a/test/Visadataset.csv".into(),
            failed_checks: vec![ValidationCheck::ColumnCount],
        }]);
        let mut pipeline = pipeline(
            ScriptedStage::failing(StageName::Validation, error),
            sink.clone(),
        );

        let summary = pipeline.run().await;

        assert_run_failed_at(&summary, StageName::Validation, ErrorKind::Validation);
        assert_eq!(pipeline.transformation.call_count(), 0);
        assert_stage_statuses(
            &summary,
            &[
                (StageName::Ingestion, StageStatus::Ok),
                (StageName::Validation, StageStatus::Fail),
            ],
        );
        assert!(summary.artifact.is_none());
        assert_eq!(sink.events_of_type("stage.failed").len(), 1);
        assert_eq!(sink.events_of_type("pipeline.failed").len(), 1);
    }

    #[tokio::test]
    async fn test_unsuccessful_artifact_is_not_forwarded() {
        let sink = Arc::new(CollectingEventSink::new());
        let mut flagged = validation_artifact();
        flagged.is_validated = false;
        let mut pipeline = pipeline(
            ScriptedStage::succeeding(StageName::Validation, flagged),
            sink,
        );

        let summary = pipeline.run().await;

        assert_run_failed_at(&summary, StageName::Validation, ErrorKind::MissingArtifact);
        assert_eq!(pipeline.transformation.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rerun_resets_state() {
        let sink = Arc::new(CollectingEventSink::new());
        let mut pipeline = Pipeline::new(
            "visa",
            ScriptedStage::<(), DataIngestionArtifact>::failing(
                StageName::Ingestion,
                DataFormatError::missing_column("yr_of_estab"),
            ),
            ScriptedStage::succeeding(StageName::Validation, validation_artifact()),
            ScriptedStage::succeeding(StageName::Transformation, transformation_artifact()),
            sink,
        );

        let first = pipeline.run().await;
        let second = pipeline.run().await;

        assert_ne!(first.run_id, second.run_id);
        assert_eq!(second.stages.len(), 1);
        assert_run_failed_at(&second, StageName::Ingestion, ErrorKind::DataFormat);
    }

    #[tokio::test]
    async fn test_summary_serializes() {
        let sink = Arc::new(CollectingEventSink::new());
        let mut pipeline = pipeline(
            ScriptedStage::succeeding(StageName::Validation, validation_artifact()),
            sink,
        );

        let summary = pipeline.run().await;
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["state"]["state"], "transformed");
        assert_eq!(json["stages"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["pipeline_name"], "visa");
    }
}
