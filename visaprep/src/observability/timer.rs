use crate::utils::Timestamp;
use chrono::Utc;
use std::time::Instant;

/// Measures one stage execution.
#[derive(Debug)]
pub struct StageTimer {
    start: Instant,
    started_at: Timestamp,
}

impl StageTimer {
    /// Starts timing now.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Wall-clock start.
    #[must_use]
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}
