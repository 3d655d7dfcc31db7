//! Retention port.
//!
//! Every purge removes whole sessions together with their positions,
//! snapshots, orders and events, inside one write-exclusive transaction.
//! Either every targeted row is gone afterwards or nothing changed.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::domain::{PurgeReport, RetentionPolicy, SessionId};
use crate::error::Result;

/// Cascading purge of stored sessions.
pub trait RetentionStore: Send + Sync {
    /// Delete every session whose session date is strictly before `cutoff`.
    fn purge_before(&self, cutoff: DateTime<Utc>)
        -> impl Future<Output = Result<PurgeReport>> + Send;

    /// Keep the `keep` most recent sessions of `index_symbol`, delete the rest.
    ///
    /// Sessions of other indexes are untouched.
    fn keep_last(
        &self,
        index_symbol: &str,
        keep: u32,
    ) -> impl Future<Output = Result<PurgeReport>> + Send;

    /// Delete one session. An unknown id returns an empty report.
    fn delete_session(&self, id: &SessionId) -> impl Future<Output = Result<PurgeReport>> + Send;

    /// Delete every row of every table.
    fn truncate_all(&self) -> impl Future<Output = Result<PurgeReport>> + Send;

    /// Run the purge described by `policy`.
    fn apply(&self, policy: &RetentionPolicy) -> impl Future<Output = Result<PurgeReport>> + Send {
        async move {
            match policy {
                RetentionPolicy::Before(cutoff) => self.purge_before(*cutoff).await,
                RetentionPolicy::KeepLast { index_symbol, keep } => {
                    self.keep_last(index_symbol, *keep).await
                }
                RetentionPolicy::Session(id) => self.delete_session(id).await,
                RetentionPolicy::Truncate => self.truncate_all().await,
            }
        }
    }
}
