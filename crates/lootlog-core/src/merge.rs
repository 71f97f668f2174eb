//! Merge decisions for one fetched page.
//!
//! [`plan`] is pure: given the partitioned page and its continuation cursor
//! it decides what to splice into the stored events and whether the phase
//! goes on. [`apply`] performs the splice on a [`SyncState`].

use std::fmt;

use serde::Serialize;

use crate::dedup::Partition;
use crate::models::{Cursor, HistoryEvent, SyncState};
use crate::util::unix_millis_now;

/// Which way through history a phase walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Catch up on events newer than the stored ones
    GapFill,
    /// Walk past the oldest stored page into older history
    Extend,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GapFill => "gap_fill",
            Self::Extend => "extend",
        })
    }
}

/// Why a phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every candidate on the page was already stored
    AllKnown,
    /// A page mixing stored and unseen events was merged
    Seam,
    /// The remote returned no continuation cursor
    EndOfHistory,
    /// Extension met events that are already stored
    ReachedStored,
    /// The run was cancelled
    Cancelled,
}

/// What to do with the stored resume cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorUpdate {
    Keep,
    Set(Option<Cursor>),
}

/// Events to insert and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub direction: Direction,
    pub events: Vec<HistoryEvent>,
    /// Insertion index; `None` appends
    pub at: Option<usize>,
    pub cursor: CursorUpdate,
}

/// Continuation after a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    Continue(Cursor),
    Stop(StopReason),
}

impl Next {
    fn from_cursor(cursor: Option<Cursor>) -> Self {
        cursor.map_or(Self::Stop(StopReason::EndOfHistory), Self::Continue)
    }
}

/// Outcome of planning one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to merge; phase ends
    Stop(StopReason),
    /// Nothing to merge; fetch the next page
    Advance(Cursor),
    /// Merge, persist, then continue or stop
    Merge(Splice, Next),
}

/// Record of a persisted merge, handed to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMerge {
    pub direction: Direction,
    /// Index of the first inserted event
    pub position: usize,
    pub added: Vec<HistoryEvent>,
}

/// Decide how one page is merged.
pub fn plan(direction: Direction, partition: Partition, page_cursor: Option<Cursor>) -> Step {
    match direction {
        Direction::GapFill => plan_gap_fill(partition, page_cursor),
        Direction::Extend => plan_extend(partition, page_cursor),
    }
}

fn plan_gap_fill(partition: Partition, page_cursor: Option<Cursor>) -> Step {
    if partition.is_empty() {
        return page_cursor.map_or(Step::Stop(StopReason::EndOfHistory), Step::Advance);
    }
    if partition.is_all_known() {
        return Step::Stop(StopReason::AllKnown);
    }

    let next = if partition.is_seam() {
        Next::Stop(StopReason::Seam)
    } else {
        Next::from_cursor(page_cursor)
    };

    Step::Merge(
        Splice {
            direction: Direction::GapFill,
            at: Some(partition.anchor_index),
            events: partition.novel,
            cursor: CursorUpdate::Keep,
        },
        next,
    )
}

fn plan_extend(partition: Partition, page_cursor: Option<Cursor>) -> Step {
    if partition.has_duplicate() {
        return Step::Stop(StopReason::ReachedStored);
    }

    Step::Merge(
        Splice {
            direction: Direction::Extend,
            at: None,
            events: partition.novel,
            cursor: CursorUpdate::Set(page_cursor.clone()),
        },
        Next::from_cursor(page_cursor),
    )
}

/// Splice events into `state` and stamp the sync time.
pub fn apply(state: &mut SyncState, splice: Splice) -> PageMerge {
    let position = splice
        .at
        .map_or(state.events.len(), |at| at.min(state.events.len()));

    state
        .events
        .splice(position..position, splice.events.iter().cloned());
    if let CursorUpdate::Set(cursor) = splice.cursor {
        state.cursor = cursor;
    }
    state.last_sync_at = unix_millis_now();

    PageMerge {
        direction: splice.direction,
        position,
        added: splice.events,
    }
}
