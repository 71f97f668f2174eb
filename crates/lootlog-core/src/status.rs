//! Sync status reporting.
//!
//! The engine pushes status transitions and per-page merge notices out through
//! [`SyncObserver`]; it never reads them back.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::merge::PageMerge;
use crate::stats::CaseStats;

/// Externally visible state of a sync run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Idle,
    Fetching,
    RateLimited,
    Finished,
    Error,
}

impl SyncStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::RateLimited => "rate_limited",
            Self::Finished => "finished",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sink for engine notifications
pub trait SyncObserver: Send + Sync {
    fn status_changed(&self, status: SyncStatus);

    /// Called after a page merge has been persisted, with stats recomputed
    /// over the full event list.
    fn page_merged(&self, _merge: &PageMerge, _stats: &CaseStats) {}
}

/// Observer that only logs transitions
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn status_changed(&self, status: SyncStatus) {
        tracing::debug!(%status, "sync status changed");
    }

    fn page_merged(&self, merge: &PageMerge, stats: &CaseStats) {
        tracing::debug!(
            direction = %merge.direction,
            added = merge.added.len(),
            total = stats.total,
            "page merged"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SyncStatus::RateLimited).unwrap(),
            "\"rate_limited\""
        );
        assert_eq!(SyncStatus::RateLimited.to_string(), "rate_limited");
    }
}
