//! SQLite retention and cascading purge.
//!
//! Each policy selects a set of session keys and hands it to
//! [`cascade_delete`], which removes dependents before their owners:
//! snapshots, orders, events, positions, then sessions. Selection and
//! deletion run inside one `BEGIN IMMEDIATE` transaction, so concurrent
//! writers wait and readers keep seeing the pre-purge state until commit.

use std::time::Instant;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use tracing::{info, warn};

use super::database::connection::{checkout, DbPool};
use super::database::schema::{events, orders, position_snapshots, positions, sessions};
use super::session::session_key;
use crate::domain::error::DomainError;
use crate::domain::time::format_timestamp;
use crate::domain::{PurgeReport, SessionId};
use crate::error::{Error, Result};
use crate::port::outbound::retention::RetentionStore;

/// Default number of ids per `IN (...)` list.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Delete the sessions with keys `session_ids` and everything they own.
///
/// Must run inside a transaction; a failure part-way leaves earlier chunks
/// deleted until the caller rolls back.
pub fn cascade_delete(
    conn: &mut SqliteConnection,
    session_ids: &[i32],
    chunk_size: usize,
) -> QueryResult<PurgeReport> {
    let chunk_size = chunk_size.max(1);
    let mut report = PurgeReport::default();

    for chunk in session_ids.chunks(chunk_size) {
        let position_ids: Vec<i32> = positions::table
            .filter(positions::session_id.eq_any(chunk))
            .select(positions::id)
            .load(conn)?;
        for positions_chunk in position_ids.chunks(chunk_size) {
            report.snapshots += diesel::delete(
                position_snapshots::table
                    .filter(position_snapshots::position_id.eq_any(positions_chunk)),
            )
            .execute(conn)?;
        }

        report.orders +=
            diesel::delete(orders::table.filter(orders::session_id.eq_any(chunk))).execute(conn)?;
        report.events +=
            diesel::delete(events::table.filter(events::session_id.eq_any(chunk))).execute(conn)?;
        report.positions += diesel::delete(positions::table.filter(positions::session_id.eq_any(chunk)))
            .execute(conn)?;
        report.sessions +=
            diesel::delete(sessions::table.filter(sessions::id.eq_any(chunk))).execute(conn)?;
    }

    Ok(report)
}

/// Delete every row of every ledger table, dependents first.
fn truncate_tables(conn: &mut SqliteConnection) -> QueryResult<PurgeReport> {
    Ok(PurgeReport {
        snapshots: diesel::delete(position_snapshots::table).execute(conn)?,
        orders: diesel::delete(orders::table).execute(conn)?,
        events: diesel::delete(events::table).execute(conn)?,
        positions: diesel::delete(positions::table).execute(conn)?,
        sessions: diesel::delete(sessions::table).execute(conn)?,
    })
}

/// SQLite-backed retention engine.
#[derive(Clone)]
pub struct SqliteRetention {
    pool: DbPool,
    chunk_size: usize,
}

impl SqliteRetention {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override how many ids go into one delete statement.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Run `purge` in an immediate transaction, rolling back on any failure.
    fn run<F>(&self, policy: &'static str, purge: F) -> Result<PurgeReport>
    where
        F: FnOnce(&mut SqliteConnection, usize) -> QueryResult<PurgeReport>,
    {
        let mut conn = checkout(&self.pool)?;
        let started = Instant::now();
        let chunk_size = self.chunk_size;

        let report = conn
            .immediate_transaction::<_, DieselError, _>(|conn| purge(conn, chunk_size))
            .map_err(|e| {
                warn!(policy, error = %e, "Purge rolled back");
                Error::TransactionAborted(format!("{policy}: {e}"))
            })?;

        info!(
            policy,
            deleted_sessions = report.sessions,
            deleted_positions = report.positions,
            deleted_snapshots = report.snapshots,
            deleted_orders = report.orders,
            deleted_events = report.events,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Purge committed"
        );
        Ok(report)
    }

    fn purge_before_sync(&self, cutoff: DateTime<Utc>) -> Result<PurgeReport> {
        let cutoff = format_timestamp(&cutoff);
        self.run("purge_before", |conn, chunk_size| {
            let ids: Vec<i32> = sessions::table
                .filter(sessions::session_date.lt(&cutoff))
                .select(sessions::id)
                .load(conn)?;
            cascade_delete(conn, &ids, chunk_size)
        })
    }

    fn keep_last_sync(&self, index_symbol: &str, keep: u32) -> Result<PurgeReport> {
        if index_symbol.trim().is_empty() {
            return Err(DomainError::EmptyIndexSymbol.into());
        }
        if keep == 0 {
            return Err(DomainError::NonPositiveRetention { count: 0 }.into());
        }

        self.run("keep_last", |conn, chunk_size| {
            // Newest first; equal session dates favour the later insert.
            let ranked: Vec<i32> = sessions::table
                .filter(sessions::index_symbol.eq(index_symbol))
                .order((sessions::session_date.desc(), sessions::id.desc()))
                .select(sessions::id)
                .load(conn)?;
            let expired: Vec<i32> = ranked.into_iter().skip(keep as usize).collect();
            cascade_delete(conn, &expired, chunk_size)
        })
    }

    fn delete_session_sync(&self, id: &SessionId) -> Result<PurgeReport> {
        self.run("delete_session", |conn, chunk_size| {
            let ids: Vec<i32> = session_key(conn, id)?.into_iter().collect();
            cascade_delete(conn, &ids, chunk_size)
        })
    }
}

impl RetentionStore for SqliteRetention {
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<PurgeReport> {
        self.purge_before_sync(cutoff)
    }

    async fn keep_last(&self, index_symbol: &str, keep: u32) -> Result<PurgeReport> {
        self.keep_last_sync(index_symbol, keep)
    }

    async fn delete_session(&self, id: &SessionId) -> Result<PurgeReport> {
        self.delete_session_sync(id)
    }

    async fn truncate_all(&self) -> Result<PurgeReport> {
        self.run("truncate_all", |conn, _| truncate_tables(conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::testing::{count_rows, seed_session, temp_pool};
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, 3, 45, 0).unwrap()
    }

    #[tokio::test]
    async fn cascade_counts_every_table() {
        let (_dir, pool) = temp_pool();
        seed_session(&pool, "a", "NIFTY", day(1), 2).await;
        let retention = SqliteRetention::new(pool.clone());

        let report = retention.delete_session(&SessionId::new("a")).await.unwrap();
        assert_eq!(report.sessions, 1);
        assert_eq!(report.positions, 2);
        assert_eq!(report.snapshots, 2);
        assert_eq!(report.orders, 2);
        assert_eq!(report.events, 2);
        assert_eq!(count_rows(&pool).total(), 0);
    }

    #[tokio::test]
    async fn small_chunks_delete_everything() {
        let (_dir, pool) = temp_pool();
        for (i, id) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
            seed_session(&pool, id, "NIFTY", day(i as u32 + 1), 3).await;
        }

        let report = SqliteRetention::new(pool.clone())
            .with_chunk_size(2)
            .truncate_all()
            .await
            .unwrap();
        assert_eq!(report.sessions, 5);
        assert_eq!(report.positions, 15);
        assert_eq!(count_rows(&pool).total(), 0);
    }

    #[tokio::test]
    async fn keep_last_rejects_zero_before_touching_rows() {
        let (_dir, pool) = temp_pool();
        seed_session(&pool, "a", "NIFTY", day(1), 1).await;

        let err = SqliteRetention::new(pool.clone())
            .keep_last("NIFTY", 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Domain(DomainError::NonPositiveRetention { count: 0 })
        ));
        assert_eq!(count_rows(&pool).sessions, 1);
    }

    #[tokio::test]
    async fn keep_last_breaks_date_ties_by_newest_insert() {
        let (_dir, pool) = temp_pool();
        seed_session(&pool, "older-insert", "NIFTY", day(5), 0).await;
        seed_session(&pool, "newer-insert", "NIFTY", day(5), 0).await;

        SqliteRetention::new(pool.clone())
            .keep_last("NIFTY", 1)
            .await
            .unwrap();

        let mut conn = pool.get().unwrap();
        let left: Vec<String> = sessions::table
            .select(sessions::session_id)
            .load(&mut conn)
            .unwrap();
        assert_eq!(left, vec!["newer-insert".to_string()]);
    }
}
