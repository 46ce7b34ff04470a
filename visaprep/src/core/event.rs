//! Lifecycle events emitted by the orchestrator.

use super::StageName;
use crate::errors::FailureSummary;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An event describing progress of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// The event type (e.g., "stage.started", "pipeline.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (ISO 8601).
    pub timestamp: String,

    /// The event payload data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl PipelineEvent {
    /// Creates a new event with no data.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: crate::utils::iso_timestamp(),
            data: HashMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Returns a data field by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Creates a "pipeline.started" event.
    #[must_use]
    pub fn pipeline_started(run_id: &str, pipeline_name: &str) -> Self {
        Self::new("pipeline.started")
            .add_data("run_id", serde_json::json!(run_id))
            .add_data("pipeline", serde_json::json!(pipeline_name))
    }

    /// Creates a "pipeline.completed" event.
    #[must_use]
    pub fn pipeline_completed(run_id: &str, duration_ms: f64) -> Self {
        Self::new("pipeline.completed")
            .add_data("run_id", serde_json::json!(run_id))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// Creates a "pipeline.failed" event.
    #[must_use]
    pub fn pipeline_failed(run_id: &str, failure: &FailureSummary) -> Self {
        Self::new("pipeline.failed")
            .add_data("run_id", serde_json::json!(run_id))
            .add_data("stage", serde_json::json!(failure.stage.as_str()))
            .add_data("kind", serde_json::json!(failure.kind))
    }

    /// Creates a "stage.started" event.
    #[must_use]
    pub fn stage_started(stage: StageName) -> Self {
        Self::new("stage.started").add_data("stage", serde_json::json!(stage.as_str()))
    }

    /// Creates a "stage.completed" event.
    #[must_use]
    pub fn stage_completed(stage: StageName, duration_ms: f64) -> Self {
        Self::new("stage.completed")
            .add_data("stage", serde_json::json!(stage.as_str()))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// Creates a "stage.failed" event.
    #[must_use]
    pub fn stage_failed(failure: &FailureSummary) -> Self {
        Self::new("stage.failed")
            .add_data("stage", serde_json::json!(failure.stage.as_str()))
            .add_data("kind", serde_json::json!(failure.kind))
            .add_data("error", serde_json::json!(failure.detail))
            .add_data("location", serde_json::json!(failure.location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_event_add_data() {
        let event = PipelineEvent::new("test.event")
            .add_data("foo", serde_json::json!("bar"))
            .add_data("count", serde_json::json!(42));

        assert_eq!(event.data.len(), 2);
        assert_eq!(event.get("count"), Some(&serde_json::json!(42)));
    }

    #[test]
    fn test_stage_started() {
        let event = PipelineEvent::stage_started(StageName::Ingestion);
        assert_eq!(event.event_type, "stage.started");
        assert_eq!(event.get("stage"), Some(&serde_json::json!("data_ingestion")));
    }

    #[test]
    fn test_stage_failed_carries_kind() {
        let summary = FailureSummary {
            stage: StageName::Validation,
            kind: ErrorKind::Validation,
            detail: "train file failed".to_string(),
            location: "src/validation/stage.rs:10:5".to_string(),
        };

        let event = PipelineEvent::stage_failed(&summary);
        assert_eq!(event.get("kind"), Some(&serde_json::json!("validation")));
        assert_eq!(event.get("error"), Some(&serde_json::json!("train file failed")));
    }

    #[test]
    fn test_event_serialization() {
        let event = PipelineEvent::pipeline_completed("run-1", 12.5);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "pipeline.completed");
        assert_eq!(json["data"]["run_id"], "run-1");
    }
}
