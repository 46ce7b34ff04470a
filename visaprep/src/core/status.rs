//! Stage name and status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three stages of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Download and split the raw dataset.
    Ingestion,
    /// Check the splits against the schema.
    Validation,
    /// Fit and apply the preprocessing transformer.
    Transformation,
}

impl StageName {
    /// All stages in execution order.
    pub const ALL: [Self; 3] = [Self::Ingestion, Self::Validation, Self::Transformation];

    /// Returns the stable string form used in logs and events.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ingestion => "data_ingestion",
            Self::Validation => "data_validation",
            Self::Transformation => "data_transformation",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The execution status of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage has not started.
    Pending,
    /// Stage is currently running.
    Running,
    /// Stage completed successfully.
    Ok,
    /// Stage failed.
    Fail,
}

impl Default for StageStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Ok => write!(f, "ok"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ok | Self::Fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_name_display() {
        assert_eq!(StageName::Ingestion.to_string(), "data_ingestion");
        assert_eq!(StageName::Validation.to_string(), "data_validation");
        assert_eq!(StageName::Transformation.to_string(), "data_transformation");
    }

    #[test]
    fn test_stage_name_order() {
        assert!(StageName::Ingestion < StageName::Validation);
        assert!(StageName::Validation < StageName::Transformation);
        assert_eq!(StageName::ALL[2], StageName::Transformation);
    }

    #[test]
    fn test_stage_status_is_terminal() {
        assert!(StageStatus::Ok.is_terminal());
        assert!(StageStatus::Fail.is_terminal());
        assert!(!StageStatus::Pending.is_terminal());
        assert!(!StageStatus::Running.is_terminal());
    }

    #[test]
    fn test_stage_status_serialize() {
        let json = serde_json::to_string(&StageStatus::Fail).unwrap();
        assert_eq!(json, r#""fail""#);

        let deserialized: StageStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, StageStatus::Fail);
    }

    #[test]
    fn test_stage_name_serialize() {
        let json = serde_json::to_string(&StageName::Transformation).unwrap();
        assert_eq!(json, r#""transformation""#);
    }
}
