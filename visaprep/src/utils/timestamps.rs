//! Timestamp helpers.

use chrono::{DateTime, Datelike, Utc};

/// A UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC time as an ISO 8601 formatted string.
///
/// Format: `YYYY-MM-DDTHH:MM:SS.ffffff+00:00`
///
/// # Examples
///
/// ```
/// use visaprep::utils::iso_timestamp;
///
/// let ts = iso_timestamp();
/// assert!(ts.contains('T'));
/// assert!(ts.ends_with("+00:00"));
/// ```
#[must_use]
pub fn iso_timestamp() -> String {
    format_iso8601(&Utc::now())
}

/// Formats a timestamp as ISO 8601 string.
#[must_use]
pub fn format_iso8601(dt: &Timestamp) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Returns the current UTC calendar year.
#[must_use]
pub fn current_year() -> i64 {
    i64::from(Utc::now().year())
}

/// Returns a filesystem-safe stamp such as `10_18_2026_14_03_59`.
#[must_use]
pub fn file_stamp(dt: &Timestamp) -> String {
    dt.format("%m_%d_%Y_%H_%M_%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso_timestamp_format() {
        let ts = iso_timestamp();
        assert!(ts.contains('T'));
        assert!(ts.ends_with("+00:00"));
    }

    #[test]
    fn test_format_iso8601() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_iso8601(&dt), "2024-03-09T07:05:01.000000+00:00");
    }

    #[test]
    fn test_file_stamp_has_no_separators() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let stamp = file_stamp(&dt);

        assert_eq!(stamp, "03_09_2024_07_05_01");
        assert!(!stamp.contains(':'));
    }

    #[test]
    fn test_current_year_is_plausible() {
        assert!(current_year() >= 2024);
    }
}
