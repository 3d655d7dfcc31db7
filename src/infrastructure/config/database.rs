//! SQLite database configuration.

use serde::Deserialize;

/// Database location and connection pool settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,
    /// Maximum pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// How long a connection waits on a locked database (milliseconds).
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,
    /// Id list size for chunked cascade deletes.
    #[serde(default = "default_delete_chunk_size")]
    pub delete_chunk_size: usize,
}

fn default_path() -> String {
    "legbook.db".to_string()
}

fn default_pool_size() -> u32 {
    5
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_delete_chunk_size() -> usize {
    500
}

impl DatabaseConfig {
    /// Config for the database at `path` with default pool settings.
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// True for a private in-memory database.
    ///
    /// Every connection to `:memory:` opens a separate database, so such a
    /// pool is limited to one connection.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
            delete_chunk_size: default_delete_chunk_size(),
        }
    }
}
