//! Overlap detection between a fetched page and the stored events.

use std::collections::HashSet;

use crate::models::{HistoryEvent, HistoryId, SyncState};

/// A page split into events we have not stored yet and the overlap count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Unknown events, in page order
    pub novel: Vec<HistoryEvent>,
    /// How many candidates were already stored
    pub known_count: usize,
    /// Where gap-fill inserts into the stored events
    pub anchor_index: usize,
}

impl Partition {
    pub const fn has_duplicate(&self) -> bool {
        self.known_count > 0
    }

    /// No candidates at all
    pub fn is_empty(&self) -> bool {
        self.novel.is_empty() && self.known_count == 0
    }

    /// Page straddles the boundary between stored and unseen events
    pub fn is_seam(&self) -> bool {
        self.has_duplicate() && !self.novel.is_empty()
    }

    pub fn is_all_known(&self) -> bool {
        self.has_duplicate() && self.novel.is_empty()
    }
}

/// Split `candidates` into novel and known events by history id.
///
/// `anchor` is the id gap-fill inserts in front of; when it is absent or no
/// longer stored the insertion point is the end of the list. A candidate
/// repeated within the same page is kept once.
pub fn partition(
    candidates: Vec<HistoryEvent>,
    known: &SyncState,
    anchor: Option<&HistoryId>,
) -> Partition {
    let known_ids = known.known_ids();
    let mut seen_in_page: HashSet<HistoryId> = HashSet::new();
    let mut novel = Vec::with_capacity(candidates.len());
    let mut known_count = 0;

    for candidate in candidates {
        if known_ids.contains(&candidate.history_id) {
            known_count += 1;
        } else if seen_in_page.insert(candidate.history_id.clone()) {
            novel.push(candidate);
        }
    }

    let anchor_index = anchor
        .and_then(|id| known.position_of(id))
        .unwrap_or(known.events.len());

    Partition {
        novel,
        known_count,
        anchor_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutcomeItem;

    fn event(id: &str) -> HistoryEvent {
        HistoryEvent::new(id, "Dreams & Nightmares Case", OutcomeItem::default())
    }

    fn state(ids: &[&str]) -> SyncState {
        SyncState {
            events: ids.iter().map(|id| event(id)).collect(),
            ..Default::default()
        }
    }

    fn ids(events: &[HistoryEvent]) -> Vec<&str> {
        events.iter().map(|e| e.history_id.as_str()).collect()
    }

    #[test]
    fn splits_novel_from_known_preserving_order() {
        let known = state(&["c", "b", "a"]);
        let part = partition(
            vec![event("e"), event("d"), event("c"), event("b")],
            &known,
            Some(&HistoryId::new("c")),
        );
        assert_eq!(ids(&part.novel), vec!["e", "d"]);
        assert_eq!(part.known_count, 2);
        assert_eq!(part.anchor_index, 0);
        assert!(part.is_seam());
        assert!(!part.is_all_known());
    }

    #[test]
    fn anchor_defaults_to_end() {
        let known = state(&["b", "a"]);
        assert_eq!(partition(vec![event("x")], &known, None).anchor_index, 2);
        assert_eq!(
            partition(vec![event("x")], &known, Some(&HistoryId::new("gone"))).anchor_index,
            2
        );
    }

    #[test]
    fn classifies_pages() {
        let known = state(&["a"]);
        assert!(partition(vec![event("a")], &known, None).is_all_known());
        assert!(partition(vec![], &known, None).is_empty());
        let fresh = partition(vec![event("z")], &known, None);
        assert!(!fresh.has_duplicate());
        assert!(!fresh.is_seam());
    }

    #[test]
    fn repeated_candidate_is_kept_once() {
        let part = partition(vec![event("x"), event("x"), event("y")], &state(&[]), None);
        assert_eq!(ids(&part.novel), vec!["x", "y"]);
        assert_eq!(part.known_count, 0);
    }
}
