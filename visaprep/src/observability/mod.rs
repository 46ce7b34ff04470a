//! Logging setup and stage timing.

mod logging;
mod timer;

pub use logging::{init_logging, log_file_name, LoggingOptions, DEFAULT_FILTER};
pub use timer::StageTimer;
