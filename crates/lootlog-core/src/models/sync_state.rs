//! Persisted sync state model

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{Cursor, HistoryEvent, HistoryId};

/// Everything persisted for one identity between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Known events, newest first
    pub events: Vec<HistoryEvent>,
    /// Resume point for walking further into the past; `None` once the
    /// oldest page has been consumed
    pub cursor: Option<Cursor>,
    /// Last successful persistence (unix ms)
    pub last_sync_at: i64,
    /// Gap-fill left unfinished by an interrupted run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_gap: Option<PendingGap>,
}

/// Where an interrupted gap-fill picks up again.
///
/// Events between `next` and `anchor` have not been fetched yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingGap {
    /// Stored event the missing events go in front of; `None` appends
    pub anchor: Option<HistoryId>,
    /// First page not fetched yet
    pub next: Cursor,
}

impl SyncState {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Newest stored event, if any
    pub fn newest(&self) -> Option<&HistoryEvent> {
        self.events.first()
    }

    /// Position of an event by id
    pub fn position_of(&self, id: &HistoryId) -> Option<usize> {
        self.events.iter().position(|event| &event.history_id == id)
    }

    /// Set of all stored ids
    pub fn known_ids(&self) -> HashSet<&HistoryId> {
        self.events.iter().map(|event| &event.history_id).collect()
    }

    /// Check that no two events share an id
    pub fn has_unique_ids(&self) -> bool {
        self.known_ids().len() == self.events.len()
    }
}
