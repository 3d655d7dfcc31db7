//! Merged, time-ordered view of a session's events and orders.
//!
//! A [`Timeline`] owns both sources, each sorted by `(timestamp, row_id)`,
//! and [`Timeline::iter`] merges them lazily. Iteration can be restarted any
//! number of times. When an event and an order share a timestamp the event
//! comes first; within one source the lower row id comes first.

use std::io;
use std::iter::{FusedIterator, Peekable};
use std::slice;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::SessionId;
use super::time::format_timestamp;

/// Header line of the CSV export.
pub const CSV_HEADER: &str = "source,timestamp,action,leg_number,symbol,details";

text_enum! {
    /// Which record kind a timeline row came from.
    TimelineSource, "timeline source" {
        Event => "EVENT",
        Order => "ORDER",
    }
}

/// One row of the merged timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub source: TimelineSource,
    pub timestamp: DateTime<Utc>,
    /// Event type for events, order type for orders.
    pub action: String,
    pub leg_number: Option<i32>,
    pub symbol: Option<String>,
    pub details: String,
    /// Row id within the source table.
    pub row_id: i32,
}

impl TimelineEntry {
    /// Build an event row; details are the event description.
    pub fn event(
        row_id: i32,
        timestamp: DateTime<Utc>,
        event_type: impl Into<String>,
        leg_number: Option<i32>,
        symbol: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            source: TimelineSource::Event,
            timestamp,
            action: event_type.into(),
            leg_number,
            symbol,
            details: description.unwrap_or_default(),
            row_id,
        }
    }

    /// Build an order row with synthesized status/price details.
    pub fn order(
        row_id: i32,
        timestamp: DateTime<Utc>,
        order_type: impl Into<String>,
        leg_number: Option<i32>,
        symbol: Option<String>,
        status: Option<&str>,
        execution_price: Option<f64>,
    ) -> Self {
        Self {
            source: TimelineSource::Order,
            timestamp,
            action: order_type.into(),
            leg_number,
            symbol,
            details: order_details(status, execution_price),
            row_id,
        }
    }

    fn sort_key(&self) -> (DateTime<Utc>, i32) {
        (self.timestamp, self.row_id)
    }
}

/// Details text of an order row.
///
/// Downstream exports parse this exact shape:
/// `status=<status-or-empty>; exec_price=<price-or-NULL>`.
#[must_use]
pub fn order_details(status: Option<&str>, execution_price: Option<f64>) -> String {
    let price = execution_price.map_or_else(|| "NULL".to_string(), format_real);
    format!("status={}; exec_price={}", status.unwrap_or(""), price)
}

/// Format a REAL the way SQLite renders it as text (`%!.15g`).
///
/// Fifteen significant digits with trailing zeros dropped, but at least one
/// digit after the point. Decimal exponents below -4 or from 15 up switch to
/// exponent form with a signed two-digit exponent (`1.0e-05`, `1.0e+15`).
#[must_use]
pub fn format_real(value: f64) -> String {
    if value == 0.0 {
        return "0.0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    // Exponent after rounding to 15 significant digits.
    let scientific = format!("{value:.14e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..15).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{sign}{:02}", trim_fraction(mantissa), exponent.abs());
    }

    let decimals = (14 - exponent).max(0) as usize;
    trim_fraction(&format!("{value:.decimals$}"))
}

fn trim_fraction(text: &str) -> String {
    let mut text = text.to_string();
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').len();
        text.truncate(trimmed);
        if text.ends_with('.') {
            text.push('0');
        }
    } else {
        text.push_str(".0");
    }
    text
}

/// Merged events and orders of one session.
#[derive(Debug, Clone)]
pub struct Timeline {
    session_id: SessionId,
    events: Vec<TimelineEntry>,
    orders: Vec<TimelineEntry>,
}

impl Timeline {
    /// Build a timeline from unsorted event and order rows.
    #[must_use]
    pub fn new(
        session_id: SessionId,
        mut events: Vec<TimelineEntry>,
        mut orders: Vec<TimelineEntry>,
    ) -> Self {
        events.sort_by_key(TimelineEntry::sort_key);
        orders.sort_by_key(TimelineEntry::sort_key);
        Self {
            session_id,
            events,
            orders,
        }
    }

    /// Empty timeline, used for unknown sessions.
    #[must_use]
    pub fn empty(session_id: SessionId) -> Self {
        Self::new(session_id, Vec::new(), Vec::new())
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Total rows: events plus orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len() + self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate rows in timeline order.
    #[must_use]
    pub fn iter(&self) -> TimelineIter<'_> {
        TimelineIter {
            events: self.events.iter().peekable(),
            orders: self.orders.iter().peekable(),
        }
    }

    /// Render the timeline as CSV text, header included.
    ///
    /// # Errors
    /// Fails only if a row cannot be serialized.
    pub fn to_csv(&self) -> csv::Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write the CSV export to `writer`.
    ///
    /// The header is written even when the timeline is empty.
    ///
    /// # Errors
    /// Propagates serialization and write failures.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut out = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        out.write_record(CSV_HEADER.split(','))?;
        for entry in self {
            out.serialize(CsvRow::from(entry))?;
        }
        out.flush()?;
        Ok(())
    }
}

/// One CSV record; field order matches [`CSV_HEADER`].
#[derive(Serialize)]
struct CsvRow<'a> {
    source: TimelineSource,
    timestamp: String,
    action: &'a str,
    leg_number: Option<i32>,
    symbol: Option<&'a str>,
    details: &'a str,
}

impl<'a> From<&'a TimelineEntry> for CsvRow<'a> {
    fn from(entry: &'a TimelineEntry) -> Self {
        Self {
            source: entry.source,
            timestamp: format_timestamp(&entry.timestamp),
            action: &entry.action,
            leg_number: entry.leg_number,
            symbol: entry.symbol.as_deref(),
            details: &entry.details,
        }
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a TimelineEntry;
    type IntoIter = TimelineIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy two-way merge over a [`Timeline`].
#[derive(Debug, Clone)]
pub struct TimelineIter<'a> {
    events: Peekable<slice::Iter<'a, TimelineEntry>>,
    orders: Peekable<slice::Iter<'a, TimelineEntry>>,
}

impl<'a> Iterator for TimelineIter<'a> {
    type Item = &'a TimelineEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let take_order = match (self.events.peek(), self.orders.peek()) {
            (Some(event), Some(order)) => order.timestamp < event.timestamp,
            (Some(_), None) => false,
            (None, _) => true,
        };
        if take_order {
            self.orders.next()
        } else {
            self.events.next()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.events.len() + self.orders.len();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TimelineIter<'_> {}

impl FusedIterator for TimelineIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 29, 9, 15, 0).unwrap() + chrono::Duration::seconds(seconds)
    }

    fn event(row_id: i32, seconds: i64) -> TimelineEntry {
        TimelineEntry::event(row_id, at(seconds), "SL_UPDATED", Some(1), None, None)
    }

    fn order(row_id: i32, seconds: i64) -> TimelineEntry {
        TimelineEntry::order(
            row_id,
            at(seconds),
            "ENTRY",
            Some(1),
            None,
            Some("EXECUTED"),
            Some(150.5),
        )
    }

    #[test]
    fn order_details_format() {
        assert_eq!(
            order_details(Some("EXECUTED"), Some(150.5)),
            "status=EXECUTED; exec_price=150.5"
        );
        assert_eq!(
            order_details(Some("PENDING"), None),
            "status=PENDING; exec_price=NULL"
        );
        assert_eq!(order_details(None, None), "status=; exec_price=NULL");
    }

    #[test]
    fn real_formatting_matches_sqlite_text() {
        assert_eq!(format_real(100.0), "100.0");
        assert_eq!(format_real(150.5), "150.5");
        assert_eq!(format_real(0.1), "0.1");
        assert_eq!(format_real(-42.25), "-42.25");
        assert_eq!(format_real(1.0 / 3.0), "0.333333333333333");
        assert_eq!(format_real(0.0), "0.0");
    }

    #[test]
    fn real_formatting_switches_to_exponent_outside_fixed_range() {
        assert_eq!(format_real(0.00001), "1.0e-05");
        assert_eq!(format_real(0.0001), "0.0001");
        assert_eq!(format_real(1e15), "1.0e+15");
        assert_eq!(format_real(123_456_789_012_345.0), "123456789012345.0");
        assert_eq!(format_real(-2.5e-7), "-2.5e-07");
        assert_eq!(format_real(9.999_999_999_999_999e14), "1.0e+15");
    }

    #[test]
    fn merge_interleaves_by_timestamp() {
        let timeline = Timeline::new(
            SessionId::new("S1"),
            vec![event(2, 30), event(1, 10)],
            vec![order(1, 20)],
        );

        let sources: Vec<_> = timeline.iter().map(|e| (e.source, e.timestamp)).collect();
        assert_eq!(
            sources,
            vec![
                (TimelineSource::Event, at(10)),
                (TimelineSource::Order, at(20)),
                (TimelineSource::Event, at(30)),
            ]
        );
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.iter().len(), 3);
    }

    #[test]
    fn ties_put_events_before_orders_then_row_id() {
        let timeline = Timeline::new(
            SessionId::new("S1"),
            vec![event(5, 10), event(4, 10)],
            vec![order(2, 10), order(1, 10)],
        );

        let keys: Vec<_> = timeline.iter().map(|e| (e.source, e.row_id)).collect();
        assert_eq!(
            keys,
            vec![
                (TimelineSource::Event, 4),
                (TimelineSource::Event, 5),
                (TimelineSource::Order, 1),
                (TimelineSource::Order, 2),
            ]
        );
    }

    #[test]
    fn iteration_is_restartable() {
        let timeline = Timeline::new(SessionId::new("S1"), vec![event(1, 1)], vec![order(1, 2)]);
        let first: Vec<_> = timeline.iter().cloned().collect();
        let second: Vec<_> = timeline.iter().cloned().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn csv_quotes_fields_with_commas() {
        let entry = TimelineEntry::event(
            1,
            at(0),
            "EXIT_EXECUTED",
            Some(2),
            Some("NIFTY26JAN24500CE".to_string()),
            Some("Leg 2 exited: SL_HIT, PnL -120".to_string()),
        );
        let timeline = Timeline::new(SessionId::new("S1"), vec![entry], vec![order(1, 5)]);
        let csv = timeline.to_csv().unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "EVENT,2026-01-29T09:15:00.000000Z,EXIT_EXECUTED,2,NIFTY26JAN24500CE,\"Leg 2 exited: SL_HIT, PnL -120\""
        );
        assert_eq!(
            lines[2],
            "ORDER,2026-01-29T09:15:05.000000Z,ENTRY,1,,status=EXECUTED; exec_price=150.5"
        );
    }

    #[test]
    fn csv_escapes_quotes_and_line_breaks() {
        let entry = TimelineEntry::event(
            7,
            at(0),
            "ERROR",
            None,
            None,
            Some("broker said \"no\"\nretrying".to_string()),
        );
        let timeline = Timeline::new(SessionId::new("S1"), vec![entry], Vec::new());

        assert_eq!(
            timeline.to_csv().unwrap(),
            format!(
                "{CSV_HEADER}\nEVENT,2026-01-29T09:15:00.000000Z,ERROR,,,\"broker said \"\"no\"\"\nretrying\"\n"
            )
        );
    }

    #[test]
    fn empty_timeline_has_only_header() {
        let timeline = Timeline::empty(SessionId::new("missing"));
        assert!(timeline.is_empty());
        assert_eq!(timeline.to_csv().unwrap(), format!("{CSV_HEADER}\n"));
    }
}
