//! Append-only audit events of a session.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::{EventId, SessionId, SessionKey};

pub const STRATEGY_START: &str = "STRATEGY_START";
pub const STRATEGY_STOP: &str = "STRATEGY_STOP";
pub const ENTRY_CONDITION_MET: &str = "ENTRY_CONDITION_MET";
pub const WAIT_TRADE_CONFIRMED: &str = "WAIT_TRADE_CONFIRMED";
pub const WAIT_TRADE_FAILED: &str = "WAIT_TRADE_FAILED";
pub const ORDER_PLACED: &str = "ORDER_PLACED";
pub const ORDER_EXECUTED: &str = "ORDER_EXECUTED";
pub const POSITION_ACTIVE: &str = "POSITION_ACTIVE";
pub const SL_UPDATED: &str = "SL_UPDATED";
pub const PROFIT_LOCK_UPDATED: &str = "PROFIT_LOCK_UPDATED";
pub const EXIT_EXECUTED: &str = "EXIT_EXECUTED";
pub const CRASH_DETECTED: &str = "CRASH_DETECTED";
pub const ERROR: &str = "ERROR";

/// A persisted audit event.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: EventId,
    pub session: SessionKey,
    pub event_time: DateTime<Utc>,
    pub event_type: String,
    pub leg_number: Option<i32>,
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// Input for appending an event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub event_type: String,
    pub event_time: DateTime<Utc>,
    pub leg_number: Option<i32>,
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub data: Option<serde_json::Value>,
}

impl NewEvent {
    /// Event of `event_type` stamped now.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            event_time: Utc::now(),
            leg_number: None,
            symbol: None,
            description: None,
            data: None,
        }
    }

    #[must_use]
    pub fn at(mut self, event_time: DateTime<Utc>) -> Self {
        self.event_time = event_time;
        self
    }

    #[must_use]
    pub fn for_leg(mut self, leg_number: i32, symbol: impl Into<String>) -> Self {
        self.leg_number = Some(leg_number);
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Read filter for events. Results are chronological by event time.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub session: Option<SessionId>,
    pub event_type: Option<String>,
    /// Inclusive lower bound on event time.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on event time.
    pub to: Option<DateTime<Utc>>,
}

impl EventFilter {
    #[must_use]
    pub fn for_session(session: impl Into<SessionId>) -> Self {
        Self {
            session: Some(session.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    #[must_use]
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }
}
