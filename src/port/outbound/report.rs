//! Read-side reporting ports.

use chrono::NaiveDate;

use crate::domain::{
    CrashedSession, ExpiryPerformance, PositionId, SessionId, SessionSummary, Timeline,
};
use crate::error::Result;

/// Builds the merged event/order timeline of a session.
pub trait TimelineReader: Send + Sync {
    /// Timeline of `session`. Unknown sessions yield an empty timeline.
    fn timeline(&self, session: &SessionId) -> Result<Timeline>;
}

/// Summaries and crash recovery over stored sessions.
///
/// Implementations run against the same store as the write ports, so a
/// report reflects the last committed state.
pub trait SessionReportReader: Send + Sync {
    /// Summary of one session, or `None` if it does not exist.
    fn summary(&self, session: &SessionId) -> Result<Option<SessionSummary>>;

    /// Aggregate over every session of `expiry_date`, or `None` if there are none.
    fn expiry_performance(&self, expiry_date: NaiveDate) -> Result<Option<ExpiryPerformance>>;

    /// Sessions still `RUNNING` that own `ACTIVE` positions.
    fn crashed_sessions(&self) -> Result<Vec<CrashedSession>>;

    /// Mark sessions `CRASHED` and log a crash event for each.
    ///
    /// Returns the number of sessions updated.
    fn mark_crashed(&self, sessions: &[SessionId], reason: &str) -> Result<usize>;

    /// Flag positions as `RECOVERED`. Returns the number updated.
    fn mark_recovered(&self, positions: &[PositionId]) -> Result<usize>;
}
