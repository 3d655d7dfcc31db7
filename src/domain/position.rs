//! Leg positions and their append-only snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::id::{PositionId, SessionId, SessionKey, SnapshotId};

/// Snapshot tag written when a risk update moved the stop loss.
pub const SNAPSHOT_SL_UPDATED: &str = "SL_UPDATED";

/// Snapshot tag written when a risk update left the stop loss unchanged.
pub const SNAPSHOT_PROFIT_UPDATED: &str = "PROFIT_UPDATED";

text_enum! {
    /// Status of a leg position.
    PositionStatus, "position status" {
        /// Waiting for entry conditions.
        Waiting => "WAITING",
        /// Entry price known, order not yet confirmed.
        Entered => "ENTERED",
        /// Position is open and being managed.
        Active => "ACTIVE",
        /// Position has been exited.
        Closed => "CLOSED",
        /// Position was picked up again after a crash.
        Recovered => "RECOVERED",
    }
}

impl PositionStatus {
    /// Returns true if the position still carries exposure.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(
            self,
            PositionStatus::Entered | PositionStatus::Active | PositionStatus::Recovered
        )
    }
}

/// One strategy leg within a session.
#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pub id: PositionId,
    pub session: SessionKey,
    pub leg_number: i32,
    pub symbol: String,
    pub status: PositionStatus,

    pub entry_time: Option<DateTime<Utc>>,
    pub entry_price: Option<Decimal>,
    pub entry_quantity: Option<i32>,
    pub entry_order_id: Option<String>,
    pub atm_strike: Option<i32>,
    pub itm_level: Option<i32>,

    pub exit_time: Option<DateTime<Utc>>,
    pub exit_price: Option<Decimal>,
    pub exit_quantity: Option<i32>,
    pub exit_order_id: Option<String>,
    pub exit_reason: Option<String>,

    pub current_sl: Option<Decimal>,
    pub lock_profit: Decimal,
    pub current_price: Option<Decimal>,

    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub pnl_percentage: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for opening a leg.
#[derive(Debug, Clone)]
pub struct NewPosition {
    pub leg_number: i32,
    pub symbol: String,
    pub atm_strike: Option<i32>,
    pub strike: Option<i32>,
    pub entry_price: Option<Decimal>,
    pub quantity: Option<i32>,
}

impl NewPosition {
    pub fn new(leg_number: i32, symbol: impl Into<String>) -> Self {
        Self {
            leg_number,
            symbol: symbol.into(),
            atm_strike: None,
            strike: None,
            entry_price: None,
            quantity: None,
        }
    }

    /// Record the ATM strike at entry and the strike actually traded.
    #[must_use]
    pub fn with_strikes(mut self, atm_strike: i32, strike: i32) -> Self {
        self.atm_strike = Some(atm_strike);
        self.strike = Some(strike);
        self
    }

    #[must_use]
    pub fn with_entry(mut self, entry_price: Decimal, quantity: i32) -> Self {
        self.entry_price = Some(entry_price);
        self.quantity = Some(quantity);
        self
    }

    /// Initial status: entered when an entry price is already known.
    #[must_use]
    pub fn initial_status(&self) -> PositionStatus {
        if self.entry_price.is_some() {
            PositionStatus::Entered
        } else {
            PositionStatus::Waiting
        }
    }

    /// Number of strikes between the traded strike and ATM.
    ///
    /// `None` when either strike is unknown or the spacing is not positive.
    #[must_use]
    pub fn itm_level(&self, strike_diff: i32) -> Option<i32> {
        match (self.atm_strike, self.strike) {
            (Some(atm), Some(strike)) if strike_diff > 0 => Some((strike - atm).abs() / strike_diff),
            _ => None,
        }
    }
}

/// Confirmed entry of a leg.
#[derive(Debug, Clone)]
pub struct PositionEntry {
    pub time: DateTime<Utc>,
    pub price: Decimal,
    pub quantity: i32,
    pub order_id: Option<String>,
    pub current_sl: Decimal,
    pub lock_profit: Decimal,
}

/// Exit of a leg.
#[derive(Debug, Clone)]
pub struct PositionExit {
    pub time: DateTime<Utc>,
    pub price: Decimal,
    pub quantity: Option<i32>,
    pub order_id: Option<String>,
    pub reason: String,
    pub realized_pnl: Decimal,
    pub pnl_percentage: Decimal,
}

/// Mark-to-market update for an open leg.
#[derive(Debug, Clone, Copy)]
pub struct PositionMark {
    pub current_price: Decimal,
    pub unrealized_pnl: Decimal,
    pub pnl_percentage: Decimal,
}

/// Read filter for positions. Results are ordered by session, leg, then id.
#[derive(Debug, Clone, Default)]
pub struct PositionFilter {
    pub session: Option<SessionId>,
    pub status: Option<PositionStatus>,
    pub symbol: Option<String>,
}

impl PositionFilter {
    #[must_use]
    pub fn for_session(session: impl Into<SessionId>) -> Self {
        Self {
            session: Some(session.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: PositionStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }
}

/// Point-in-time observation of a position. Never mutated once stored.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub position_id: PositionId,
    pub timestamp: DateTime<Utc>,
    pub event_type: Option<String>,
    pub current_price: Option<Decimal>,
    pub current_sl: Option<Decimal>,
    pub lock_profit: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
    pub pnl_percentage: Option<Decimal>,
    pub notes: Option<String>,
}

/// Input for appending a snapshot.
#[derive(Debug, Clone, Default)]
pub struct NewSnapshot {
    pub timestamp: Option<DateTime<Utc>>,
    pub event_type: Option<String>,
    pub current_price: Option<Decimal>,
    pub current_sl: Option<Decimal>,
    pub lock_profit: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
    pub pnl_percentage: Option<Decimal>,
    pub notes: Option<String>,
}

impl NewSnapshot {
    /// Snapshot tagged with `event_type`, stamped when stored.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: Some(event_type.into()),
            ..Self::default()
        }
    }

    /// Capture the current state of `position`.
    #[must_use]
    pub fn of(position: &Position, event_type: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            event_type: Some(event_type.into()),
            current_price: position.current_price,
            current_sl: position.current_sl,
            lock_profit: Some(position.lock_profit),
            unrealized_pnl: Some(position.unrealized_pnl),
            pnl_percentage: Some(position.pnl_percentage),
            notes: None,
        }
    }

    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_price(mut self, current_price: Decimal) -> Self {
        self.current_price = Some(current_price);
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
