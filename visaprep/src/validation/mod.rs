//! Schema validation of the ingested splits.

mod stage;
mod validator;

pub use stage::{DataValidation, SplitReport, ValidationReport};
pub use validator::{FileCheckReport, SchemaValidator, ValidationCheck, NULL_SENTINEL};
