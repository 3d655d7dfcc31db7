//! Canonical text form of timestamps and dates.
//!
//! Timestamps are rendered as fixed-width RFC 3339 UTC with microsecond
//! precision (`2026-01-29T09:15:00.000000Z`), so comparing the text compares
//! the instants.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use super::error::DomainError;

/// Render a timestamp in its canonical stored form.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
///
/// # Errors
/// Returns [`DomainError::InvalidTimestamp`] if the text is not RFC 3339.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| DomainError::InvalidTimestamp {
            value: text.to_string(),
        })
}

/// Render a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
/// Returns [`DomainError::InvalidDate`] for any other shape.
pub fn parse_date(text: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| DomainError::InvalidDate {
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_text_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2026, 1, 29, 9, 15, 0).unwrap();
        let text = format_timestamp(&whole);
        assert_eq!(text, "2026-01-29T09:15:00.000000Z");
        assert_eq!(parse_timestamp(&text).unwrap(), whole);
    }

    #[test]
    fn timestamp_text_orders_like_instants() {
        let early = Utc.with_ymd_and_hms(2026, 1, 29, 9, 15, 0).unwrap();
        let late = early + chrono::Duration::milliseconds(1);
        assert!(format_timestamp(&early) < format_timestamp(&late));
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let parsed = parse_timestamp("2026-01-29T14:45:00+05:30").unwrap();
        assert_eq!(format_timestamp(&parsed), "2026-01-29T09:15:00.000000Z");
    }

    #[test]
    fn bad_text_is_rejected() {
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_date("29/01/2026").is_err());
        assert_eq!(
            format_date(&parse_date("2026-01-29").unwrap()),
            "2026-01-29"
        );
    }
}
