//! Database connection management using Diesel ORM.
//!
//! Provides connection pooling, migration support, and per-connection
//! SQLite configuration.

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{Error, Result};
use crate::infrastructure::config::database::DatabaseConfig;

/// Embedded database migrations compiled from the migrations/ directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Type alias for a SQLite connection pool.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// A connection checked out of a [`DbPool`].
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Pragmas applied to every pooled connection when it is opened.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout_ms: u32,
    wal: bool,
}

impl ConnectionOptions {
    fn apply(&self, conn: &mut SqliteConnection) -> std::result::Result<(), DieselError> {
        let mut pragmas = format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout_ms
        );
        if self.wal {
            pragmas.push_str(" PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;");
        }
        conn.batch_execute(&pragmas)
    }
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        self.apply(conn).map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Create a connection pool for the configured database.
///
/// File databases run in WAL mode so readers keep seeing the last committed
/// state while a purge holds the write lock.
///
/// # Errors
/// Returns an error if the pool cannot be created.
pub fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let memory = config.is_memory();
    let options = ConnectionOptions {
        busy_timeout_ms: config.busy_timeout_ms,
        wal: !memory,
    };
    let max_size = if memory { 1 } else { config.pool_size };

    let manager = ConnectionManager::<SqliteConnection>::new(&config.path);
    Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(options))
        .build(manager)
        .map_err(|e| Error::Connection(e.to_string()))
}

/// Run all pending database migrations.
///
/// # Errors
/// Returns an error if migrations fail.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = checkout(pool)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Database(e.to_string()))?;
    Ok(())
}

/// Check a connection out of the pool.
///
/// # Errors
/// Returns [`Error::Connection`] if no connection becomes available.
pub fn checkout(pool: &DbPool) -> Result<DbConnection> {
    pool.get().map_err(|e| Error::Connection(e.to_string()))
}

/// Map a Diesel error onto the crate taxonomy.
///
/// Foreign-key failures mean a row referenced an owner that does not exist.
pub fn database_error(entity: &'static str, error: DieselError) -> Error {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            Error::ReferentialIntegrity {
                entity,
                reference: info.message().to_string(),
            }
        }
        other => Error::Database(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::prelude::*;
    use diesel::sql_types::{BigInt, Integer, Text};

    #[derive(diesel::QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(diesel::QueryableByName)]
    struct PragmaValue {
        #[diesel(sql_type = Integer)]
        value: i32,
    }

    #[derive(diesel::QueryableByName)]
    struct TableCount {
        #[diesel(sql_type = BigInt)]
        count: i64,
    }

    fn memory_pool() -> DbPool {
        create_pool(&DatabaseConfig::at(":memory:")).unwrap()
    }

    #[test]
    fn memory_pool_is_single_connection() {
        let config = DatabaseConfig {
            pool_size: 8,
            ..DatabaseConfig::at(":memory:")
        };
        let pool = create_pool(&config).unwrap();
        assert_eq!(pool.max_size(), 1);
    }

    #[test]
    fn run_migrations_creates_tables() {
        let pool = memory_pool();
        run_migrations(&pool).unwrap();

        let mut conn = pool.get().unwrap();
        let tables: Vec<String> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name",
        )
        .load::<TableName>(&mut conn)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();

        assert_eq!(
            tables,
            vec!["events", "orders", "position_snapshots", "positions", "sessions"]
        );
    }

    #[test]
    fn run_migrations_is_idempotent() {
        let pool = memory_pool();
        run_migrations(&pool).unwrap();
        run_migrations(&pool).unwrap();

        let mut conn = pool.get().unwrap();
        let count = diesel::sql_query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type='table' AND name='sessions'",
        )
        .get_result::<TableCount>(&mut conn)
        .unwrap()
        .count;
        assert_eq!(count, 1);
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let pool = memory_pool();
        run_migrations(&pool).unwrap();
        let mut conn = pool.get().unwrap();

        let enabled = diesel::sql_query("SELECT foreign_keys AS value FROM pragma_foreign_keys")
            .get_result::<PragmaValue>(&mut conn)
            .unwrap()
            .value;
        assert_eq!(enabled, 1);

        let orphan = diesel::sql_query(
            "INSERT INTO events (session_id, event_time, event_type, created_at) \
             VALUES (999, '2026-01-29T09:15:00.000000Z', 'ERROR', '2026-01-29T09:15:00.000000Z')",
        )
        .execute(&mut conn)
        .unwrap_err();
        assert!(matches!(
            database_error("event", orphan),
            Error::ReferentialIntegrity { entity: "event", .. }
        ));
    }

    #[test]
    fn file_pool_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let pool = create_pool(&DatabaseConfig::at(path.to_string_lossy())).unwrap();
        let mut conn = pool.get().unwrap();

        #[derive(diesel::QueryableByName)]
        struct JournalMode {
            #[diesel(sql_type = Text)]
            journal_mode: String,
        }

        let mode = diesel::sql_query("SELECT journal_mode FROM pragma_journal_mode")
            .get_result::<JournalMode>(&mut conn)
            .unwrap()
            .journal_mode;
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
