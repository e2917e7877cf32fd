//! Shared parsing utilities for source cells.
//!
//! Every helper returns `None` for blank or unparseable input. Numeric
//! helpers also reject negative and non-finite values; no measure in the
//! source datasets can legitimately be negative.

use chrono::NaiveDate;

/// Parses a date with the given `chrono` format string.
#[must_use]
pub fn parse_date(s: &str, format: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, format).ok()
}

/// Parses a non-negative decimal number.
#[must_use]
pub fn parse_decimal(s: &str) -> Option<f64> {
    let value = s.trim().parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Parses a non-negative whole number. Fractional input is accepted and
/// truncated, so `"12.0"` and `"12.7"` both yield `12`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_whole(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(value) = s.parse::<i64>() {
        return (value >= 0).then_some(value);
    }
    let value = parse_decimal(s)?.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    (value < 9_223_372_036_854_775_808.0).then(|| value as i64)
}

/// Parses a non-negative whole number that must fit in an `i32`, such as a
/// year or week number.
#[must_use]
pub fn parse_small_whole(s: &str) -> Option<i32> {
    parse_whole(s).and_then(|v| i32::try_from(v).ok())
}

/// Returns the trimmed text, or `None` if it is blank.
#[must_use]
pub fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_day_first_dates() {
        assert_eq!(
            parse_date("31-12-2024", "%d-%m-%Y"),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
        assert_eq!(
            parse_date(" 01-02-2023 ", "%d-%m-%Y"),
            NaiveDate::from_ymd_opt(2023, 2, 1)
        );
    }

    #[test]
    fn rejects_invalid_dates() {
        assert!(parse_date("", "%d-%m-%Y").is_none());
        assert!(parse_date("2024-12-31", "%d-%m-%Y").is_none());
        assert!(parse_date("31-02-2024", "%d-%m-%Y").is_none());
        assert!(parse_date("n/a", "%d-%m-%Y").is_none());
    }

    #[test]
    fn parses_decimals() {
        assert_eq!(parse_decimal("312"), Some(312.0));
        assert_eq!(parse_decimal(" 41.5 "), Some(41.5));
        assert_eq!(parse_decimal("0"), Some(0.0));
    }

    #[test]
    fn rejects_bad_decimals() {
        assert!(parse_decimal("").is_none());
        assert!(parse_decimal("N/A").is_none());
        assert!(parse_decimal("-3").is_none());
        assert!(parse_decimal("NaN").is_none());
        assert!(parse_decimal("inf").is_none());
    }

    #[test]
    fn parses_whole_numbers_with_truncation() {
        assert_eq!(parse_whole("12"), Some(12));
        assert_eq!(parse_whole("12.0"), Some(12));
        assert_eq!(parse_whole("12.7"), Some(12));
        assert_eq!(parse_whole(" 7 "), Some(7));
    }

    #[test]
    fn rejects_bad_whole_numbers() {
        assert!(parse_whole("").is_none());
        assert!(parse_whole("twelve").is_none());
        assert!(parse_whole("-1").is_none());
        assert!(parse_whole("1e30").is_none());
    }

    #[test]
    fn small_whole_must_fit_i32() {
        assert_eq!(parse_small_whole("2024"), Some(2024));
        assert_eq!(parse_small_whole("2024.0"), Some(2024));
        assert!(parse_small_whole("99999999999").is_none());
    }

    #[test]
    fn blank_text_is_none() {
        assert_eq!(non_blank("  Delhi "), Some("Delhi".to_string()));
        assert!(non_blank("   ").is_none());
    }
}
