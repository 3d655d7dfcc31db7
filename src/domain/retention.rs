//! Retention policies and purge outcomes.

use std::fmt;
use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::DomainError;
use super::id::SessionId;

/// Which sessions a purge removes. Dependents always go with their session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Sessions dated strictly before the cutoff.
    Before(DateTime<Utc>),
    /// All but the `keep` most recent sessions of one index.
    KeepLast { index_symbol: String, keep: u32 },
    /// One session by external id. Unknown ids are a no-op.
    Session(SessionId),
    /// Every row of every table.
    Truncate,
}

impl RetentionPolicy {
    /// Keep-last policy with its arguments checked.
    ///
    /// # Errors
    /// Rejects an empty index symbol and a zero count.
    pub fn keep_last(index_symbol: impl Into<String>, keep: u32) -> Result<Self, DomainError> {
        let index_symbol = index_symbol.into();
        if index_symbol.trim().is_empty() {
            return Err(DomainError::EmptyIndexSymbol);
        }
        if keep == 0 {
            return Err(DomainError::NonPositiveRetention { count: 0 });
        }
        Ok(Self::KeepLast { index_symbol, keep })
    }

    /// Short name used in logs and CLI output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            RetentionPolicy::Before(_) => "purge_before",
            RetentionPolicy::KeepLast { .. } => "keep_last",
            RetentionPolicy::Session(_) => "delete_session",
            RetentionPolicy::Truncate => "truncate_all",
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionPolicy::Before(cutoff) => write!(f, "sessions before {}", cutoff.to_rfc3339()),
            RetentionPolicy::KeepLast { index_symbol, keep } => {
                write!(f, "all but the last {keep} {index_symbol} sessions")
            }
            RetentionPolicy::Session(id) => write!(f, "session {id}"),
            RetentionPolicy::Truncate => f.write_str("every session"),
        }
    }
}

/// Rows removed by one purge, per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub sessions: usize,
    pub positions: usize,
    pub snapshots: usize,
    pub orders: usize,
    pub events: usize,
}

impl PurgeReport {
    /// Total rows removed across all tables.
    #[must_use]
    pub fn total(&self) -> usize {
        self.sessions + self.positions + self.snapshots + self.orders + self.events
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl AddAssign for PurgeReport {
    fn add_assign(&mut self, other: Self) {
        self.sessions += other.sessions;
        self.positions += other.positions;
        self.snapshots += other.snapshots;
        self.orders += other.orders;
        self.events += other.events;
    }
}
