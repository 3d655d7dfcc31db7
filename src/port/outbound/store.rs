//! Persistence ports for the five session ledger record kinds.
//!
//! Child records are addressed by their owning session's external
//! [`SessionId`]. Writing a child for a session that does not exist fails
//! with [`Error::ReferentialIntegrity`](crate::error::Error::ReferentialIntegrity).

use std::future::Future;

use rust_decimal::Decimal;

use crate::domain::{
    Event, EventFilter, NewEvent, NewOrder, NewPosition, NewSession, NewSnapshot, Order,
    OrderExecution, OrderFilter, OrderId, Position, PositionEntry, PositionExit, PositionFilter,
    PositionId, PositionMark, Session, SessionCounters, SessionFilter, SessionId, SessionStatus,
    Snapshot,
};
use crate::error::Result;

/// Storage operations for sessions.
pub trait SessionStore: Send + Sync {
    /// Create a session with status `RUNNING` and start time now.
    fn create(&self, session: &NewSession) -> impl Future<Output = Result<Session>> + Send;

    /// Get a session by external ID.
    fn get(&self, id: &SessionId) -> impl Future<Output = Result<Option<Session>>> + Send;

    /// List sessions matching `filter`, newest session date first.
    fn list(&self, filter: &SessionFilter) -> impl Future<Output = Result<Vec<Session>>> + Send;

    /// Set the status, appending `note` to the notes on its own line.
    ///
    /// Terminal statuses also stamp the end time. Returns false if the
    /// session does not exist.
    fn update_status(
        &self,
        id: &SessionId,
        status: SessionStatus,
        note: Option<&str>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Add `delta` to the session's counters.
    fn increment_counters(
        &self,
        id: &SessionId,
        delta: &SessionCounters,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Overwrite the session's net P&L.
    fn set_net_pnl(&self, id: &SessionId, pnl: Decimal)
        -> impl Future<Output = Result<bool>> + Send;
}

/// Storage operations for leg positions and their snapshots.
pub trait PositionStore: Send + Sync {
    /// Open a leg in `session`.
    fn open(
        &self,
        session: &SessionId,
        position: &NewPosition,
    ) -> impl Future<Output = Result<Position>> + Send;

    /// Get a position by row ID.
    fn get(&self, id: PositionId) -> impl Future<Output = Result<Option<Position>>> + Send;

    /// List positions matching `filter`, ordered by session, leg, then id.
    fn list(&self, filter: &PositionFilter)
        -> impl Future<Output = Result<Vec<Position>>> + Send;

    /// Record the confirmed entry; the position becomes `ACTIVE`.
    fn record_entry(
        &self,
        id: PositionId,
        entry: &PositionEntry,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Mark an open leg to market.
    fn update_mark(
        &self,
        id: PositionId,
        mark: &PositionMark,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Move the stop loss and profit lock, appending a snapshot of the change.
    fn update_risk(
        &self,
        id: PositionId,
        current_sl: Decimal,
        lock_profit: Decimal,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Record the exit; the position becomes `CLOSED`.
    fn record_exit(
        &self,
        id: PositionId,
        exit: &PositionExit,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Append a snapshot of `position`.
    fn append_snapshot(
        &self,
        position: PositionId,
        snapshot: &NewSnapshot,
    ) -> impl Future<Output = Result<Snapshot>> + Send;

    /// Snapshots of a position, oldest first.
    fn snapshots(&self, position: PositionId)
        -> impl Future<Output = Result<Vec<Snapshot>>> + Send;

    /// Orders placed for `leg_number` of `session`, oldest first.
    ///
    /// This is a logical join on `(session, leg_number)`: the result may be
    /// non-empty even when no position exists for the leg.
    fn orders_for_leg(
        &self,
        session: &SessionId,
        leg_number: i32,
    ) -> impl Future<Output = Result<Vec<Order>>> + Send;
}

/// Storage operations for orders.
pub trait OrderStore: Send + Sync {
    /// Record an order for `session` with status `PENDING`.
    fn place(
        &self,
        session: &SessionId,
        order: &NewOrder,
    ) -> impl Future<Output = Result<Order>> + Send;

    /// Get an order by row ID.
    fn get(&self, id: OrderId) -> impl Future<Output = Result<Option<Order>>> + Send;

    /// List orders matching `filter`, oldest order time first.
    fn list(&self, filter: &OrderFilter) -> impl Future<Output = Result<Vec<Order>>> + Send;

    /// Apply a broker execution report.
    fn record_execution(
        &self,
        id: OrderId,
        execution: &OrderExecution,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Mark the order `REJECTED` with the broker's message.
    fn record_rejection(
        &self,
        id: OrderId,
        message: &str,
    ) -> impl Future<Output = Result<bool>> + Send;
}

/// Storage operations for audit events.
pub trait EventStore: Send + Sync {
    /// Append an event to `session`.
    fn append(
        &self,
        session: &SessionId,
        event: &NewEvent,
    ) -> impl Future<Output = Result<Event>> + Send;

    /// List events matching `filter`, oldest first.
    fn list(&self, filter: &EventFilter) -> impl Future<Output = Result<Vec<Event>>> + Send;
}
