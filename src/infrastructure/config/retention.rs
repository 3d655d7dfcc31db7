//! Scheduled retention configuration.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::domain::RetentionPolicy;

/// Policies applied by `legbook purge auto`.
///
/// ```toml
/// [retention]
/// max_age_days = 90
///
/// [retention.keep_last]
/// NIFTY = 20
/// BANKNIFTY = 10
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetentionConfig {
    /// Delete sessions whose session date is older than this many days.
    #[serde(default)]
    pub max_age_days: Option<u32>,
    /// Sessions to keep per index symbol.
    #[serde(default)]
    pub keep_last: BTreeMap<String, u32>,
}

impl RetentionConfig {
    /// True when no automatic policy is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max_age_days.is_none() && self.keep_last.is_empty()
    }

    /// Policies to apply at `now`: the age cutoff first, then each index in
    /// symbol order.
    #[must_use]
    pub fn policies(&self, now: DateTime<Utc>) -> Vec<RetentionPolicy> {
        let age = self
            .max_age_days
            .map(|days| RetentionPolicy::Before(now - Duration::days(i64::from(days))));
        let keep = self
            .keep_last
            .iter()
            .map(|(index_symbol, keep)| RetentionPolicy::KeepLast {
                index_symbol: index_symbol.clone(),
                keep: *keep,
            });
        age.into_iter().chain(keep).collect()
    }
}
