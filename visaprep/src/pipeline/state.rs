//! Pipeline run state machine.

use crate::core::StageName;
use crate::errors::FailureSummary;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a pipeline run stands.
///
/// `Created → Ingested → Validated → Transformed`, or `Failed` from any
/// non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    /// No stage has run.
    #[default]
    Created,
    /// Ingestion produced its artifact.
    Ingested,
    /// Validation passed.
    Validated,
    /// Transformation finished. Terminal.
    Transformed,
    /// A stage failed. Terminal.
    Failed {
        /// The enriched failure.
        failure: FailureSummary,
    },
}

impl PipelineState {
    /// The stage that must run next, if any.
    #[must_use]
    pub const fn next_stage(&self) -> Option<StageName> {
        match self {
            Self::Created => Some(StageName::Ingestion),
            Self::Ingested => Some(StageName::Validation),
            Self::Validated => Some(StageName::Transformation),
            Self::Transformed | Self::Failed { .. } => None,
        }
    }

    /// Returns true once the run has finished, successfully or not.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.next_stage().is_none()
    }

    /// The state reached when `stage` completes, or `None` if `stage` is not
    /// the one expected next.
    #[must_use]
    pub fn advance(&self, stage: StageName) -> Option<Self> {
        if self.next_stage() != Some(stage) {
            return None;
        }
        Some(match stage {
            StageName::Ingestion => Self::Ingested,
            StageName::Validation => Self::Validated,
            StageName::Transformation => Self::Transformed,
        })
    }

    /// The failed state for `failure`.
    #[must_use]
    pub const fn fail(failure: FailureSummary) -> Self {
        Self::Failed { failure }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Ingested => write!(f, "ingested"),
            Self::Validated => write!(f, "validated"),
            Self::Transformed => write!(f, "transformed"),
            Self::Failed { failure } => write!(f, "failed at {}", failure.stage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn failure() -> FailureSummary {
        FailureSummary {
            stage: StageName::Validation,
            kind: ErrorKind::Validation,
            detail: "column_count".to_string(),
            location: "src/validation/stage.rs:1:1".to_string(),
        }
    }

    #[test]
    fn test_happy_path() {
        let mut state = PipelineState::default();
        for stage in StageName::ALL {
            state = state.advance(stage).unwrap();
        }
        assert_eq!(state, PipelineState::Transformed);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_out_of_order_transition_rejected() {
        assert!(PipelineState::Created.advance(StageName::Validation).is_none());
        assert!(PipelineState::Validated.advance(StageName::Ingestion).is_none());
        assert!(PipelineState::fail(failure())
            .advance(StageName::Transformation)
            .is_none());
    }

    #[test]
    fn test_failed_is_terminal() {
        let state = PipelineState::fail(failure());
        assert!(state.is_terminal());
        assert_eq!(state.to_string(), "failed at data_validation");
    }

    #[test]
    fn test_serializes_with_tag() {
        let json = serde_json::to_value(PipelineState::Ingested).unwrap();
        assert_eq!(json, serde_json::json!({"state": "ingested"}));
    }
}
