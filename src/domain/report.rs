//! Read-side session reports.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::id::{PositionId, SessionId, SessionKey};
use super::position::{Position, PositionStatus};
use super::session::{Session, SessionStatus};

/// Per-leg line of a session summary.
#[derive(Debug, Clone, Serialize)]
pub struct LegSummary {
    pub leg_number: i32,
    pub symbol: String,
    pub entry_price: Option<Decimal>,
    pub exit_price: Option<Decimal>,
    pub realized_pnl: Decimal,
    pub pnl_percentage: Decimal,
    pub status: PositionStatus,
}

impl From<&Position> for LegSummary {
    fn from(position: &Position) -> Self {
        Self {
            leg_number: position.leg_number,
            symbol: position.symbol.clone(),
            entry_price: position.entry_price,
            exit_price: position.exit_price,
            realized_pnl: position.realized_pnl,
            pnl_percentage: position.pnl_percentage,
            status: position.status,
        }
    }
}

/// Summary of one session and its legs.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub index_symbol: String,
    pub expiry_date: NaiveDate,
    pub status: SessionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_positions: usize,
    pub closed_positions: usize,
    pub active_positions: usize,
    pub total_orders: i32,
    /// Sum of realized P&L over the session's positions.
    pub net_pnl: Decimal,
    pub legs: Vec<LegSummary>,
}

impl SessionSummary {
    /// Summarize `session` from its positions.
    #[must_use]
    pub fn build(session: &Session, positions: &[Position]) -> Self {
        Self {
            session_id: session.session_id.clone(),
            index_symbol: session.index_symbol.clone(),
            expiry_date: session.expiry_date,
            status: session.status,
            start_time: session.start_time,
            end_time: session.end_time,
            total_positions: positions.len(),
            closed_positions: positions
                .iter()
                .filter(|p| p.status == PositionStatus::Closed)
                .count(),
            active_positions: positions
                .iter()
                .filter(|p| p.status == PositionStatus::Active)
                .count(),
            total_orders: session.counters.orders_executed,
            net_pnl: positions.iter().map(|p| p.realized_pnl).sum(),
            legs: positions.iter().map(LegSummary::from).collect(),
        }
    }
}

/// Aggregate over every session of one expiry date.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiryPerformance {
    pub expiry_date: NaiveDate,
    pub num_sessions: usize,
    pub total_positions: usize,
    pub total_orders: i64,
    pub net_pnl: Decimal,
    pub sessions: Vec<SessionId>,
}

/// A session left `RUNNING` with open legs, typically after a process crash.
#[derive(Debug, Clone, Serialize)]
pub struct CrashedSession {
    pub key: SessionKey,
    pub session_id: SessionId,
    pub expiry_date: NaiveDate,
    pub start_time: Option<DateTime<Utc>>,
    pub active_positions: Vec<PositionId>,
    pub legs: Vec<LegSummary>,
}
