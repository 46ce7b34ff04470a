//! Assertions over run summaries and stage records.

use crate::core::{StageName, StageStatus};
use crate::errors::ErrorKind;
use crate::pipeline::{PipelineState, RunSummary};

/// Asserts that the run finished every stage.
pub fn assert_run_succeeded(summary: &RunSummary) {
    assert_eq!(
        summary.state,
        PipelineState::Transformed,
        "expected a completed run, got {}",
        summary.state
    );
}

/// Asserts that the run failed at `stage` with an error of `kind`.
pub fn assert_run_failed_at(summary: &RunSummary, stage: StageName, kind: ErrorKind) {
    match &summary.state {
        PipelineState::Failed { failure } => {
            assert_eq!(failure.stage, stage, "failed at the wrong stage");
            assert_eq!(failure.kind, kind, "wrong error kind: {}", failure.detail);
        }
        other => panic!("expected a failed run, got {other}"),
    }
}

/// Asserts the stages that ran, in order, and their statuses.
pub fn assert_stage_statuses(summary: &RunSummary, expected: &[(StageName, StageStatus)]) {
    let actual: Vec<(StageName, StageStatus)> =
        summary.stages.iter().map(|r| (r.stage, r.status)).collect();
    assert_eq!(actual, expected);
}
