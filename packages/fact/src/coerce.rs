//! Per-field coercion policy.
//!
//! | Field kind | Invalid input becomes |
//! |---|---|
//! | measure (AQI, population) | `None` |
//! | count (cases, deaths, registrations) | `0` |
//! | calendar integer (year, week) | `None` |
//! | date | `None` |
//! | text | `None` when blank |
//!
//! Negative numbers count as invalid.

use airpure_source::parsing;
use chrono::NaiveDate;

/// Floating point measure.
#[must_use]
pub fn measure(cell: Option<&str>) -> Option<f64> {
    cell.and_then(parsing::parse_decimal)
}

/// Integer count. Never null.
#[must_use]
pub fn count(cell: Option<&str>) -> i64 {
    cell.and_then(parsing::parse_whole).unwrap_or(0)
}

/// Integer calendar attribute such as a year or week.
#[must_use]
pub fn calendar_int(cell: Option<&str>) -> Option<i32> {
    cell.and_then(parsing::parse_small_whole)
}

/// Date in the dataset's format.
#[must_use]
pub fn date(cell: Option<&str>, format: &str) -> Option<NaiveDate> {
    cell.and_then(|s| parsing::parse_date(s, format))
}

/// Trimmed text, `None` when blank or absent.
#[must_use]
pub fn text(cell: Option<&str>) -> Option<String> {
    cell.and_then(parsing::non_blank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_measure_is_null() {
        assert_eq!(measure(Some("NA")), None);
        assert_eq!(measure(Some("")), None);
        assert_eq!(measure(None), None);
        assert_eq!(measure(Some("-5")), None);
        assert_eq!(measure(Some("151")), Some(151.0));
    }

    #[test]
    fn non_numeric_count_is_zero_never_null() {
        assert_eq!(count(Some("abc")), 0);
        assert_eq!(count(Some("")), 0);
        assert_eq!(count(None), 0);
        assert_eq!(count(Some("-2")), 0);
        assert_eq!(count(Some("12.0")), 12);
        assert_eq!(count(Some("7")), 7);
    }

    #[test]
    fn calendar_ints_are_nullable() {
        assert_eq!(calendar_int(Some("2023")), Some(2023));
        assert_eq!(calendar_int(Some("2023.0")), Some(2023));
        assert_eq!(calendar_int(Some("week 3")), None);
    }

    #[test]
    fn dates_use_dataset_format() {
        assert_eq!(
            date(Some("05-03-2024"), "%d-%m-%Y"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(date(Some("2024-03-05"), "%d-%m-%Y"), None);
        assert_eq!(
            date(Some("2024-03-05"), "%Y-%m-%d"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
    }

    #[test]
    fn blank_text_is_null() {
        assert_eq!(text(Some(" PM2.5 ")), Some("PM2.5".to_string()));
        assert_eq!(text(Some("")), None);
        assert_eq!(text(None), None);
    }
}
