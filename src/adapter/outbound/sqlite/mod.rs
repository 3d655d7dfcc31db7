//! SQLite persistence adapters.
//!
//! Diesel-backed implementations of the session, position, order, event,
//! retention, and report ports, all sharing one connection pool.

pub mod database;
pub mod event;
pub mod order;
pub mod position;
pub mod report;
pub mod retention;
pub mod session;
pub mod timeline;

pub use database::connection::DbPool;
pub use event::SqliteEventStore;
pub use order::SqliteOrderStore;
pub use position::SqlitePositionStore;
pub use report::SqliteReportReader;
pub use retention::SqliteRetention;
pub use session::SqliteSessionStore;
pub use timeline::SqliteTimelineReader;

use tracing::info;

use crate::error::Result;
use crate::infrastructure::config::database::DatabaseConfig;

/// An opened, migrated session database.
///
/// Cheap to clone; every adapter handed out shares the same pool.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    delete_chunk_size: usize,
}

impl Database {
    /// Build the pool for `config` and apply pending migrations.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let pool = database::connection::create_pool(config)?;
        database::connection::run_migrations(&pool)?;
        info!(path = %config.path, pool_size = config.pool_size, "Opened database");
        Ok(Self {
            pool,
            delete_chunk_size: config.delete_chunk_size,
        })
    }

    #[must_use]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    #[must_use]
    pub fn sessions(&self) -> SqliteSessionStore {
        SqliteSessionStore::new(self.pool.clone())
    }

    #[must_use]
    pub fn positions(&self) -> SqlitePositionStore {
        SqlitePositionStore::new(self.pool.clone())
    }

    #[must_use]
    pub fn orders(&self) -> SqliteOrderStore {
        SqliteOrderStore::new(self.pool.clone())
    }

    #[must_use]
    pub fn events(&self) -> SqliteEventStore {
        SqliteEventStore::new(self.pool.clone())
    }

    #[must_use]
    pub fn timeline(&self) -> SqliteTimelineReader {
        SqliteTimelineReader::new(self.pool.clone())
    }

    #[must_use]
    pub fn retention(&self) -> SqliteRetention {
        SqliteRetention::new(self.pool.clone()).with_chunk_size(self.delete_chunk_size)
    }

    #[must_use]
    pub fn reports(&self) -> SqliteReportReader {
        SqliteReportReader::new(self.pool.clone())
    }
}
