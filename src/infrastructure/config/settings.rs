//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; the `DATABASE_URL` environment
//! variable overrides the database path.
//!
//! # Example
//!
//! ```no_run
//! use legbook::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::database::DatabaseConfig;
use super::logging::LoggingConfig;
use super::retention::RetentionConfig;
use crate::error::{ConfigError, Result};

/// Environment variable that overrides `database.path`.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

const LOG_FORMATS: &[&str] = &["pretty", "json"];

/// Main application configuration.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// SQLite location and pool settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Policies for `purge auto`.
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML content is malformed
    /// - Validation fails (e.g., a zero pool size)
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file is unreadable or invalid.
    #[allow(clippy::result_large_err)]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::load(path);
        }
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.database.path = url.strip_prefix("sqlite://").unwrap_or(url).to_string();
            }
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.path",
            }
            .into());
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.pool_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.database.busy_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.busy_timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.database.delete_chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.delete_chunk_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("must be one of {}", LOG_FORMATS.join(", ")),
            }
            .into());
        }

        if self.retention.max_age_days == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "retention.max_age_days",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        for (index_symbol, keep) in &self.retention.keep_last {
            if index_symbol.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "retention.keep_last",
                    reason: "index symbol cannot be empty".to_string(),
                }
                .into());
            }
            if *keep == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "retention.keep_last",
                    reason: format!("{index_symbol} must keep at least 1 session"),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
