//! Per-stage execution records kept by the orchestrator.

use crate::core::{StageName, StageStatus};
use crate::errors::FailureSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What happened when a stage ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub stage: StageName,
    /// Final status.
    pub status: StageStatus,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage ended.
    pub ended_at: DateTime<Utc>,
    /// The produced artifact as a dictionary.
    #[serde(default)]
    pub artifact: HashMap<String, serde_json::Value>,
    /// The failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureSummary>,
}

impl StageRecord {
    /// Creates a completed record.
    #[must_use]
    pub fn completed(
        stage: StageName,
        started_at: DateTime<Utc>,
        artifact: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            stage,
            status: StageStatus::Ok,
            started_at,
            ended_at: Utc::now(),
            artifact,
            error: None,
        }
    }

    /// Creates a failed record.
    #[must_use]
    pub fn failed(stage: StageName, started_at: DateTime<Utc>, error: FailureSummary) -> Self {
        Self {
            stage,
            status: StageStatus::Fail,
            started_at,
            ended_at: Utc::now(),
            artifact: HashMap::new(),
            error: Some(error),
        }
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_microseconds().unwrap_or(0) as f64 / 1000.0
    }

    /// Returns true if the stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == StageStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_completed_record() {
        let started = Utc::now();
        let mut artifact = HashMap::new();
        artifact.insert("is_ingested".to_string(), serde_json::json!(true));

        let record = StageRecord::completed(StageName::Ingestion, started, artifact);

        assert!(record.is_success());
        assert!(record.duration_ms() >= 0.0);
        assert!(record.error.is_none());
    }

    #[test]
    fn test_failed_record_serialization() {
        let summary = FailureSummary {
            stage: StageName::Validation,
            kind: ErrorKind::Validation,
            detail: "bad".to_string(),
            location: "x.rs:1:1".to_string(),
        };
        let record = StageRecord::failed(StageName::Validation, Utc::now(), summary);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "fail");
        assert_eq!(json["error"]["kind"], "validation");
    }
}
