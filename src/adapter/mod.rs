//! Implementations of ports (hexagonal adapters).
//!
//! - [`inbound`] - the `legbook` command-line interface
//! - [`outbound`] - SQLite persistence

pub mod inbound;
pub mod outbound;
