//! Name synthesis helpers: response sanitizing, timestamp fallback names,
//! and the no-network offline heuristic.
//!
//! Every generated base name starts with a `YYYY-MM-DD` date taken from the
//! moment of analysis, never from the file's modification time.

mod offline;
mod sanitize;

pub use offline::{SizeBucket, is_generic_stem, offline_name, strip_date_prefix};
pub use sanitize::{MAX_LEN_EN, MAX_LEN_ZH, max_len, sanitize};

use chrono::{DateTime, Local};

/// `YYYY-MM-DD` for the given instant.
pub fn date_prefix(now: &DateTime<Local>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Deterministic name used when analysis is unavailable or fails:
/// `{YYYY-MM-DD}_image_{YYYYMMDDHHMMSS}`.
pub fn fallback_name(now: &DateTime<Local>) -> String {
    format!("{}_image_{}", date_prefix(now), now.format("%Y%m%d%H%M%S"))
}

/// Prefix an already sanitized name with the date of `now`.
pub fn dated(name: &str, now: &DateTime<Local>) -> String {
    format!("{}_{name}", date_prefix(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap()
    }

    #[test]
    fn date_prefix_format() {
        assert_eq!(date_prefix(&fixed()), "2024-03-09");
    }

    #[test]
    fn date_prefix_uses_local_calendar_day() {
        let just_after_midnight = Local.with_ymd_and_hms(2024, 3, 9, 0, 30, 0).unwrap();
        let just_before_midnight = Local.with_ymd_and_hms(2024, 3, 9, 23, 30, 0).unwrap();
        assert_eq!(date_prefix(&just_after_midnight), "2024-03-09");
        assert_eq!(date_prefix(&just_before_midnight), "2024-03-09");
    }

    #[test]
    fn fallback_name_format() {
        assert_eq!(fallback_name(&fixed()), "2024-03-09_image_20240309070502");
    }

    #[test]
    fn dated_name() {
        assert_eq!(dated("cat", &fixed()), "2024-03-09_cat");
    }
}
