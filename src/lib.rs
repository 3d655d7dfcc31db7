//! Legbook - session ledger for multi-leg options strategies.
//!
//! Persists strategy sessions, their leg positions, position snapshots,
//! broker orders, and audit events in an embedded SQLite database, and
//! provides a merged event/order timeline and transactional retention.
//!
//! # Architecture
//!
//! - [`domain`] - Storage-agnostic record types, timeline merge, retention policies
//! - [`port`] - Store, retention, and report traits
//! - [`adapter::outbound::sqlite`] - Diesel implementations of the ports
//! - [`adapter::inbound::cli`] - The `legbook` command line
//! - [`infrastructure::config`] - TOML configuration and logging setup
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use legbook::adapter::outbound::sqlite::Database;
//! use legbook::domain::NewSession;
//! use legbook::infrastructure::config::database::DatabaseConfig;
//! use legbook::port::outbound::store::SessionStore;
//!
//! # async fn demo() -> legbook::error::Result<()> {
//! let db = Database::open(&DatabaseConfig::at("legbook.db"))?;
//! let expiry = NaiveDate::from_ymd_opt(2026, 1, 29).unwrap();
//! db.sessions()
//!     .create(&NewSession::new("nifty-0129", "NIFTY", expiry).with_contract(50, 75))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;
