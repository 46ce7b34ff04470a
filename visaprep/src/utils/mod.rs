//! Small shared helpers.

pub mod timestamps;

pub use timestamps::{current_year, file_stamp, format_iso8601, iso_timestamp, Timestamp};
