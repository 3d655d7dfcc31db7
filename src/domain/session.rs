//! Strategy sessions: one row per strategy run.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::id::{SessionId, SessionKey};

text_enum! {
    /// Lifecycle status of a session.
    SessionStatus, "session status" {
        /// Strategy is executing.
        Running => "RUNNING",
        /// Strategy finished normally.
        Completed => "COMPLETED",
        /// Strategy stopped on an error.
        Error => "ERROR",
        /// Strategy was stopped by the operator.
        Interrupted => "INTERRUPTED",
        /// Process died while the session was running.
        Crashed => "CRASHED",
    }
}

impl SessionStatus {
    /// True once the session will no longer be mutated by strategy execution.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Running)
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::Running
    }
}

/// Aggregate order and leg counters kept on a session.
///
/// Also used as an increment when strategy execution bumps the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounters {
    pub orders_placed: i32,
    pub orders_executed: i32,
    pub orders_rejected: i32,
    pub legs_opened: i32,
    pub legs_closed: i32,
}

impl SessionCounters {
    /// Counter increment for a single placed order.
    #[must_use]
    pub fn order_placed() -> Self {
        Self {
            orders_placed: 1,
            ..Self::default()
        }
    }

    /// Counter increment for a single executed order.
    #[must_use]
    pub fn order_executed() -> Self {
        Self {
            orders_executed: 1,
            ..Self::default()
        }
    }

    /// Counter increment for a single rejected order.
    #[must_use]
    pub fn order_rejected() -> Self {
        Self {
            orders_rejected: 1,
            ..Self::default()
        }
    }

    /// Counter increment for a leg being opened.
    #[must_use]
    pub fn leg_opened() -> Self {
        Self {
            legs_opened: 1,
            ..Self::default()
        }
    }

    /// Counter increment for a leg being closed.
    #[must_use]
    pub fn leg_closed() -> Self {
        Self {
            legs_closed: 1,
            ..Self::default()
        }
    }
}

/// A persisted strategy session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub key: SessionKey,
    pub session_id: SessionId,
    pub index_symbol: String,
    pub strike_diff: i32,
    pub lot_size: i32,
    pub expiry_date: NaiveDate,
    pub status: SessionStatus,
    pub counters: SessionCounters,
    pub net_pnl: Decimal,
    pub notes: Option<String>,
    pub session_date: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for creating a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub session_id: SessionId,
    pub index_symbol: String,
    pub expiry_date: NaiveDate,
    pub strike_diff: i32,
    pub lot_size: i32,
    pub session_date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl NewSession {
    /// Start a session for `index_symbol` expiring on `expiry_date`, dated now.
    pub fn new(
        session_id: impl Into<SessionId>,
        index_symbol: impl Into<String>,
        expiry_date: NaiveDate,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            index_symbol: index_symbol.into(),
            expiry_date,
            strike_diff: 0,
            lot_size: 0,
            session_date: Utc::now(),
            notes: None,
        }
    }

    /// Set the strike spacing and lot size of the traded index.
    #[must_use]
    pub fn with_contract(mut self, strike_diff: i32, lot_size: i32) -> Self {
        self.strike_diff = strike_diff;
        self.lot_size = lot_size;
        self
    }

    /// Override the session date (defaults to now).
    #[must_use]
    pub fn with_session_date(mut self, session_date: DateTime<Utc>) -> Self {
        self.session_date = session_date;
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Read filter for sessions. Results are ordered newest-first by session date.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub index_symbol: Option<String>,
    pub status: Option<SessionStatus>,
    pub expiry_date: Option<NaiveDate>,
    /// Inclusive lower bound on session date.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on session date.
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl SessionFilter {
    #[must_use]
    pub fn for_index(index_symbol: impl Into<String>) -> Self {
        Self {
            index_symbol: Some(index_symbol.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry_date: NaiveDate) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    /// Restrict to sessions dated in `[from, to)`.
    #[must_use]
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in SessionStatus::ALL {
            assert_eq!(status.as_str().parse::<SessionStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(
            "completed".parse::<SessionStatus>().unwrap(),
            SessionStatus::Completed
        );
    }

    #[test]
    fn only_running_is_non_terminal() {
        assert!(!SessionStatus::Running.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Crashed.is_terminal());
    }

    #[test]
    fn new_session_defaults() {
        let expiry = NaiveDate::from_ymd_opt(2026, 1, 29).unwrap();
        let session = NewSession::new("s1", "NIFTY", expiry).with_contract(50, 75);

        assert_eq!(session.session_id.as_str(), "s1");
        assert_eq!(session.strike_diff, 50);
        assert_eq!(session.lot_size, 75);
        assert!(session.notes.is_none());
    }
}
