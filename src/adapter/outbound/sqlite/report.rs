//! SQLite read-side report adapter.
//!
//! Session summaries, expiry-day aggregates, and crash detection for the
//! CLI. Crash marking writes, but goes through here because it is driven by
//! the same detection query.

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use tracing::{info, warn};

use super::database::connection::{checkout, database_error, DbPool};
use super::database::model::{PositionRow, SessionRow};
use super::database::schema::{positions, sessions};
use super::event::insert_event;
use super::session::append_note;
use crate::domain::event::CRASH_DETECTED;
use crate::domain::time::{format_date, format_timestamp};
use crate::domain::{
    CrashedSession, ExpiryPerformance, LegSummary, NewEvent, Position, PositionId, PositionStatus,
    Session, SessionId, SessionStatus, SessionSummary,
};
use crate::error::{Error, Result};
use crate::port::outbound::report::SessionReportReader;

fn positions_of(conn: &mut SqliteConnection, keys: &[i32]) -> Result<Vec<Position>> {
    let rows: Vec<PositionRow> = positions::table
        .filter(positions::session_id.eq_any(keys))
        .order((
            positions::session_id.asc(),
            positions::leg_number.asc(),
            positions::id.asc(),
        ))
        .select(PositionRow::as_select())
        .load(conn)
        .map_err(|e| database_error("position", e))?;
    rows.into_iter().map(Position::try_from).collect()
}

/// SQLite report reader for session summaries and crash recovery.
#[derive(Clone)]
pub struct SqliteReportReader {
    pool: DbPool,
}

impl SqliteReportReader {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl SessionReportReader for SqliteReportReader {
    fn summary(&self, session: &SessionId) -> Result<Option<SessionSummary>> {
        let mut conn = checkout(&self.pool)?;
        conn.transaction(|conn| -> Result<Option<SessionSummary>> {
            let row: Option<SessionRow> = sessions::table
                .filter(sessions::session_id.eq(session.as_str()))
                .select(SessionRow::as_select())
                .first(conn)
                .optional()?;
            let Some(row) = row else {
                return Ok(None);
            };
            let session = Session::try_from(row)?;
            let positions = positions_of(conn, &[session.key.value()])?;
            Ok(Some(SessionSummary::build(&session, &positions)))
        })
    }

    fn expiry_performance(&self, expiry_date: NaiveDate) -> Result<Option<ExpiryPerformance>> {
        let mut conn = checkout(&self.pool)?;
        conn.transaction(|conn| -> Result<Option<ExpiryPerformance>> {
            let rows: Vec<SessionRow> = sessions::table
                .filter(sessions::expiry_date.eq(format_date(&expiry_date)))
                .order((sessions::session_date.asc(), sessions::id.asc()))
                .select(SessionRow::as_select())
                .load(conn)?;
            if rows.is_empty() {
                return Ok(None);
            }

            let sessions = rows
                .into_iter()
                .map(Session::try_from)
                .collect::<Result<Vec<_>>>()?;
            let keys: Vec<i32> = sessions.iter().map(|s| s.key.value()).collect();
            let positions = positions_of(conn, &keys)?;

            Ok(Some(ExpiryPerformance {
                expiry_date,
                num_sessions: sessions.len(),
                total_positions: positions.len(),
                total_orders: sessions
                    .iter()
                    .map(|s| i64::from(s.counters.orders_executed))
                    .sum(),
                net_pnl: positions.iter().map(|p| p.realized_pnl).sum(),
                sessions: sessions.into_iter().map(|s| s.session_id).collect(),
            }))
        })
    }

    fn crashed_sessions(&self) -> Result<Vec<CrashedSession>> {
        let mut conn = checkout(&self.pool)?;
        conn.transaction(|conn| -> Result<Vec<CrashedSession>> {
            let rows: Vec<SessionRow> = sessions::table
                .filter(sessions::status.eq(SessionStatus::Running.as_str()))
                .filter(
                    sessions::id.eq_any(
                        positions::table
                            .filter(positions::status.eq(PositionStatus::Active.as_str()))
                            .select(positions::session_id),
                    ),
                )
                .order((sessions::session_date.asc(), sessions::id.asc()))
                .select(SessionRow::as_select())
                .load(conn)?;

            let mut crashed = Vec::with_capacity(rows.len());
            for row in rows {
                let session = Session::try_from(row)?;
                let positions = positions_of(conn, &[session.key.value()])?;
                let active: Vec<&Position> = positions
                    .iter()
                    .filter(|p| p.status == PositionStatus::Active)
                    .collect();
                crashed.push(CrashedSession {
                    key: session.key,
                    session_id: session.session_id,
                    expiry_date: session.expiry_date,
                    start_time: session.start_time,
                    active_positions: active.iter().map(|p| p.id).collect(),
                    legs: active.into_iter().map(LegSummary::from).collect(),
                });
            }
            Ok(crashed)
        })
    }

    fn mark_crashed(&self, ids: &[SessionId], reason: &str) -> Result<usize> {
        let mut conn = checkout(&self.pool)?;
        let note = format!("[CRASHED] {reason}");

        let marked = conn.transaction(|conn| -> Result<usize> {
            let mut marked = 0;
            for id in ids {
                let current: Option<(i32, Option<String>)> = sessions::table
                    .filter(sessions::session_id.eq(id.as_str()))
                    .select((sessions::id, sessions::notes))
                    .first(conn)
                    .optional()?;
                let Some((key, notes)) = current else {
                    warn!(session_id = %id, "Cannot mark unknown session as crashed");
                    continue;
                };

                let now = format_timestamp(&Utc::now());
                diesel::update(sessions::table.find(key))
                    .set((
                        sessions::status.eq(SessionStatus::Crashed.as_str()),
                        sessions::end_time.eq(Some(now.clone())),
                        sessions::notes.eq(Some(append_note(notes.as_deref(), &note))),
                        sessions::updated_at.eq(Some(now)),
                    ))
                    .execute(conn)?;
                insert_event(
                    conn,
                    key,
                    &NewEvent::new(CRASH_DETECTED).describe(note.clone()),
                )?;
                marked += 1;
            }
            Ok(marked)
        })?;

        info!(marked, reason, "Marked sessions as crashed");
        Ok(marked)
    }

    fn mark_recovered(&self, ids: &[PositionId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut conn = checkout(&self.pool)?;
        let keys: Vec<i32> = ids.iter().map(PositionId::value).collect();
        let now = format_timestamp(&Utc::now());

        let updated = diesel::update(positions::table.filter(positions::id.eq_any(&keys)))
            .set((
                positions::status.eq(PositionStatus::Recovered.as_str()),
                positions::updated_at.eq(Some(now)),
            ))
            .execute(&mut conn)
            .map_err(|e| database_error("position", e))?;

        info!(updated, "Marked positions as recovered");
        Ok(updated)
    }
}

impl SqliteReportReader {
    /// Summary of `session`, failing when it does not exist.
    pub fn require_summary(&self, session: &SessionId) -> Result<SessionSummary> {
        self.summary(session)?.ok_or_else(|| Error::NotFound {
            entity: "session",
            id: session.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::event::SqliteEventStore;
    use crate::adapter::outbound::sqlite::position::SqlitePositionStore;
    use crate::adapter::outbound::sqlite::session::SqliteSessionStore;
    use crate::adapter::outbound::sqlite::testing::temp_pool;
    use crate::domain::{EventFilter, NewPosition, NewSession, PositionEntry, PositionExit};
    use crate::port::outbound::store::{EventStore, PositionStore, SessionStore};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 29).unwrap()
    }

    async fn session_with_legs(pool: &DbPool, id: &str, pnl: &[Decimal]) -> Vec<PositionId> {
        SqliteSessionStore::new(pool.clone())
            .create(&NewSession::new(id, "NIFTY", expiry()).with_contract(50, 75))
            .await
            .unwrap();
        let positions = SqlitePositionStore::new(pool.clone());
        let session = SessionId::new(id);

        let mut ids = Vec::new();
        for (leg, realized) in pnl.iter().enumerate() {
            let position = positions
                .open(&session, &NewPosition::new(leg as i32 + 1, format!("LEG{leg}")))
                .await
                .unwrap();
            positions
                .record_entry(
                    position.id,
                    &PositionEntry {
                        time: Utc::now(),
                        price: dec!(100),
                        quantity: 75,
                        order_id: None,
                        current_sl: dec!(90),
                        lock_profit: dec!(0),
                    },
                )
                .await
                .unwrap();
            if !realized.is_zero() {
                positions
                    .record_exit(
                        position.id,
                        &PositionExit {
                            time: Utc::now(),
                            price: dec!(100) + *realized,
                            quantity: Some(75),
                            order_id: None,
                            reason: "TARGET".into(),
                            realized_pnl: *realized,
                            pnl_percentage: dec!(0),
                        },
                    )
                    .await
                    .unwrap();
            }
            ids.push(position.id);
        }
        ids
    }

    #[tokio::test]
    async fn summary_counts_legs_and_sums_realized_pnl() {
        let (_dir, pool) = temp_pool();
        session_with_legs(&pool, "s1", &[dec!(250), dec!(-100), dec!(0)]).await;

        let summary = SqliteReportReader::new(pool)
            .summary(&SessionId::new("s1"))
            .unwrap()
            .unwrap();
        assert_eq!(summary.total_positions, 3);
        assert_eq!(summary.closed_positions, 2);
        assert_eq!(summary.active_positions, 1);
        assert_eq!(summary.net_pnl, dec!(150));
        assert_eq!(summary.legs[0].leg_number, 1);
    }

    #[test]
    fn summary_of_unknown_session_is_none() {
        let (_dir, pool) = temp_pool();
        let reader = SqliteReportReader::new(pool);
        assert!(reader.summary(&SessionId::new("nope")).unwrap().is_none());
        assert!(matches!(
            reader.require_summary(&SessionId::new("nope")),
            Err(Error::NotFound { entity: "session", .. })
        ));
    }

    #[tokio::test]
    async fn expiry_performance_aggregates_sessions() {
        let (_dir, pool) = temp_pool();
        session_with_legs(&pool, "a", &[dec!(100)]).await;
        session_with_legs(&pool, "b", &[dec!(-40), dec!(10)]).await;

        let reader = SqliteReportReader::new(pool);
        let performance = reader.expiry_performance(expiry()).unwrap().unwrap();
        assert_eq!(performance.num_sessions, 2);
        assert_eq!(performance.total_positions, 3);
        assert_eq!(performance.net_pnl, dec!(70));

        let other = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();
        assert!(reader.expiry_performance(other).unwrap().is_none());
    }

    #[tokio::test]
    async fn crash_detection_and_marking() {
        let (_dir, pool) = temp_pool();
        let open_legs = session_with_legs(&pool, "live", &[dec!(0), dec!(0)]).await;
        session_with_legs(&pool, "flat", &[dec!(20)]).await;
        let sessions = SqliteSessionStore::new(pool.clone());
        session_with_legs(&pool, "done", &[dec!(0)]).await;
        sessions
            .update_status(&SessionId::new("done"), SessionStatus::Completed, None)
            .await
            .unwrap();

        let reader = SqliteReportReader::new(pool.clone());
        let crashed = reader.crashed_sessions().unwrap();
        assert_eq!(crashed.len(), 1);
        assert_eq!(crashed[0].session_id.as_str(), "live");
        assert_eq!(crashed[0].active_positions, open_legs);

        let marked = reader
            .mark_crashed(&[SessionId::new("live"), SessionId::new("ghost")], "power loss")
            .unwrap();
        assert_eq!(marked, 1);

        let live = sessions.get(&SessionId::new("live")).await.unwrap().unwrap();
        assert_eq!(live.status, SessionStatus::Crashed);
        assert!(live.end_time.is_some());
        assert_eq!(live.notes.as_deref(), Some("[CRASHED] power loss"));

        let events = SqliteEventStore::new(pool.clone())
            .list(&EventFilter::for_session("live").with_type(CRASH_DETECTED))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert!(reader.crashed_sessions().unwrap().is_empty());

        assert_eq!(reader.mark_recovered(&open_legs).unwrap(), 2);
        let position = SqlitePositionStore::new(pool)
            .get(open_legs[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(position.status, PositionStatus::Recovered);
    }
}
