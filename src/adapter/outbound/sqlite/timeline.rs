//! SQLite timeline projection.
//!
//! Reads a session's events and orders in one read transaction so both
//! halves of the merge come from the same committed state.

use diesel::prelude::*;

use super::database::connection::{checkout, DbPool};
use super::database::schema::{events, orders};
use super::session::session_key;
use crate::domain::time::parse_timestamp;
use crate::domain::{SessionId, Timeline, TimelineEntry};
use crate::error::Result;
use crate::port::outbound::report::TimelineReader;

type EventColumns = (i32, String, String, Option<i32>, Option<String>, Option<String>);
type OrderColumns = (
    i32,
    String,
    String,
    Option<i32>,
    String,
    String,
    Option<f64>,
);

/// SQLite-backed timeline reader.
#[derive(Clone)]
pub struct SqliteTimelineReader {
    pool: DbPool,
}

impl SqliteTimelineReader {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn load(conn: &mut SqliteConnection, session: &SessionId) -> Result<Timeline> {
        let Some(key) = session_key(conn, session)? else {
            return Ok(Timeline::empty(session.clone()));
        };

        let event_rows: Vec<EventColumns> = events::table
            .filter(events::session_id.eq(key))
            .select((
                events::id,
                events::event_time,
                events::event_type,
                events::leg_number,
                events::symbol,
                events::description,
            ))
            .load(conn)?;
        let order_rows: Vec<OrderColumns> = orders::table
            .filter(orders::session_id.eq(key))
            .select((
                orders::id,
                orders::order_time,
                orders::order_type,
                orders::leg_number,
                orders::symbol,
                orders::status,
                orders::execution_price,
            ))
            .load(conn)?;

        let events = event_rows
            .into_iter()
            .map(|(id, time, event_type, leg, symbol, description)| -> Result<TimelineEntry> {
                Ok(TimelineEntry::event(
                    id,
                    parse_timestamp(&time)?,
                    event_type,
                    leg,
                    symbol,
                    description,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let orders = order_rows
            .into_iter()
            .map(|(id, time, order_type, leg, symbol, status, price)| -> Result<TimelineEntry> {
                let status = (!status.is_empty()).then_some(status.as_str());
                Ok(TimelineEntry::order(
                    id,
                    parse_timestamp(&time)?,
                    order_type,
                    leg,
                    Some(symbol),
                    status,
                    price,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Timeline::new(session.clone(), events, orders))
    }
}

impl TimelineReader for SqliteTimelineReader {
    fn timeline(&self, session: &SessionId) -> Result<Timeline> {
        let mut conn = checkout(&self.pool)?;
        conn.transaction(|conn| Self::load(conn, session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::event::SqliteEventStore;
    use crate::adapter::outbound::sqlite::order::SqliteOrderStore;
    use crate::adapter::outbound::sqlite::session::SqliteSessionStore;
    use crate::adapter::outbound::sqlite::testing::temp_pool;
    use crate::domain::event::SL_UPDATED;
    use crate::domain::{
        NewEvent, NewOrder, NewSession, OrderExecution, OrderSide, OrderType, TimelineSource,
    };
    use crate::port::outbound::store::{EventStore, OrderStore, SessionStore};
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn merges_events_and_orders_by_time() {
        let (_dir, pool) = temp_pool();
        let session = SessionId::new("S1");
        let expiry = NaiveDate::from_ymd_opt(2026, 1, 29).unwrap();
        SqliteSessionStore::new(pool.clone())
            .create(&NewSession::new("S1", "NIFTY", expiry))
            .await
            .unwrap();
        let at = |second| Utc.with_ymd_and_hms(2026, 1, 29, 9, 15, second).unwrap();

        let events = SqliteEventStore::new(pool.clone());
        let orders = SqliteOrderStore::new(pool.clone());
        events
            .append(&session, &NewEvent::new("STRATEGY_START").at(at(0)))
            .await
            .unwrap();
        let entry = orders
            .place(
                &session,
                &NewOrder::new(OrderType::Entry, "NIFTY26JAN24500CE", OrderSide::Buy, 75)
                    .for_leg(1)
                    .at(at(5)),
            )
            .await
            .unwrap();
        orders
            .record_execution(entry.id, &OrderExecution::executed(dec!(150.5), 75))
            .await
            .unwrap();
        events
            .append(
                &session,
                &NewEvent::new(SL_UPDATED)
                    .for_leg(1, "NIFTY26JAN24500CE")
                    .describe("SL moved to 140")
                    .at(at(9)),
            )
            .await
            .unwrap();

        let timeline = SqliteTimelineReader::new(pool).timeline(&session).unwrap();
        let rows: Vec<_> = timeline
            .iter()
            .map(|e| (e.source, e.action.as_str(), e.details.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                (TimelineSource::Event, "STRATEGY_START", ""),
                (
                    TimelineSource::Order,
                    "ENTRY",
                    "status=EXECUTED; exec_price=150.5"
                ),
                (TimelineSource::Event, "SL_UPDATED", "SL moved to 140"),
            ]
        );
    }

    #[test]
    fn unknown_session_is_empty() {
        let (_dir, pool) = temp_pool();
        let timeline = SqliteTimelineReader::new(pool)
            .timeline(&SessionId::new("missing"))
            .unwrap();
        assert!(timeline.is_empty());
    }
}
