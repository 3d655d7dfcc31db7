use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use legbook::adapter::outbound::sqlite::database::schema::{
    events, orders, position_snapshots, positions, sessions,
};
use legbook::adapter::outbound::sqlite::{Database, DbPool};
use legbook::domain::{
    NewEvent, NewOrder, NewPosition, NewSession, NewSnapshot, OrderSide, OrderType, PurgeReport,
    SessionId,
};
use legbook::infrastructure::config::database::DatabaseConfig;
use legbook::port::outbound::store::{EventStore, OrderStore, PositionStore, SessionStore};
use rust_decimal_macros::dec;
use tempfile::TempDir;

/// Temporary, migrated SQLite database for integration tests.
pub struct TempDb {
    _dir: TempDir,
    path: PathBuf,
    db: Database,
}

impl TempDb {
    pub fn create() -> Self {
        Self::create_with(|_| {})
    }

    /// Like [`TempDb::create`], with `configure` applied to the database
    /// settings before opening.
    pub fn create_with(configure: impl FnOnce(&mut DatabaseConfig)) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("legbook.db");
        let mut config = DatabaseConfig::at(path.to_string_lossy());
        configure(&mut config);
        let db = Database::open(&config).expect("open database");
        Self {
            _dir: dir,
            path,
            db,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run raw SQL against the database, e.g. to install a failing trigger.
    pub fn execute(&self, sql: &str) {
        let mut conn = self.db.pool().get().expect("get sqlite connection");
        diesel::sql_query(sql).execute(&mut conn).expect("execute sql");
    }

    /// Session `id` with `legs` positions, each with one snapshot, one
    /// entry order and one event.
    pub async fn seed_session(
        &self,
        id: &str,
        index_symbol: &str,
        session_date: DateTime<Utc>,
        legs: i32,
    ) {
        self.db
            .sessions()
            .create(
                &NewSession::new(id, index_symbol, session_date.date_naive())
                    .with_contract(50, 75)
                    .with_session_date(session_date),
            )
            .await
            .expect("create session");

        let session = SessionId::new(id);
        for leg in 1..=legs {
            let symbol = format!("{index_symbol}-LEG{leg}");
            let position = self
                .db
                .positions()
                .open(&session, &NewPosition::new(leg, &symbol))
                .await
                .expect("open position");
            self.db
                .positions()
                .append_snapshot(position.id, &NewSnapshot::new("TICK").with_price(dec!(101.5)))
                .await
                .expect("append snapshot");
            self.db
                .orders()
                .place(
                    &session,
                    &NewOrder::new(OrderType::Entry, &symbol, OrderSide::Buy, 75)
                        .for_leg(leg)
                        .at(session_date),
                )
                .await
                .expect("place order");
            self.db
                .events()
                .append(
                    &session,
                    &NewEvent::new("ORDER_PLACED")
                        .at(session_date)
                        .for_leg(leg, &symbol),
                )
                .await
                .expect("append event");
        }
    }

    /// Current row count of every ledger table, read in one transaction.
    pub fn counts(&self) -> PurgeReport {
        read_counts(self.db.pool())
    }

    /// External ids of the stored sessions, sorted.
    pub fn session_ids(&self) -> Vec<String> {
        let mut conn = self.db.pool().get().expect("get sqlite connection");
        sessions::table
            .select(sessions::session_id)
            .order(sessions::session_id.asc())
            .load(&mut conn)
            .expect("load session ids")
    }
}

/// Row count of every ledger table from a single read snapshot.
pub fn read_counts(pool: &DbPool) -> PurgeReport {
    let mut conn = pool.get().expect("get sqlite connection");
    conn.transaction(|conn| Ok::<_, diesel::result::Error>(count_rows(conn)))
        .expect("read counts")
}

fn count_rows(conn: &mut SqliteConnection) -> PurgeReport {
    let count = |n: i64| usize::try_from(n).expect("non-negative count");
    PurgeReport {
        sessions: count(sessions::table.count().get_result(conn).expect("count")),
        positions: count(positions::table.count().get_result(conn).expect("count")),
        snapshots: count(
            position_snapshots::table
                .count()
                .get_result(conn)
                .expect("count"),
        ),
        orders: count(orders::table.count().get_result(conn).expect("count")),
        events: count(events::table.count().get_result(conn).expect("count")),
    }
}
