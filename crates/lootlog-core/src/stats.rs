//! Aggregate statistics over the stored event list.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{HistoryEvent, OutcomeItem};

const MIL_SPEC_COLOR: &str = "4b69ff";
const RESTRICTED_COLOR: &str = "8847ff";
const CLASSIFIED_COLOR: &str = "d32ce6";
const COVERT_COLOR: &str = "eb4b4b";
const SPECIAL_MARKER: char = '★';
const QUALITY_CATEGORY: &str = "Quality";
const STATTRAK_TAG: &str = "StatTrak™";

/// Rarity tier derived from an item's tag colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RarityTier {
    MilSpec,
    Restricted,
    Classified,
    Covert,
    /// Covert grade carrying the special marker in its name
    Special,
}

impl RarityTier {
    pub fn of(item: &OutcomeItem) -> Option<Self> {
        if item.has_tag_color(COVERT_COLOR) {
            if item.name.contains(SPECIAL_MARKER) {
                Some(Self::Special)
            } else {
                Some(Self::Covert)
            }
        } else if item.has_tag_color(CLASSIFIED_COLOR) {
            Some(Self::Classified)
        } else if item.has_tag_color(RESTRICTED_COLOR) {
            Some(Self::Restricted)
        } else if item.has_tag_color(MIL_SPEC_COLOR) {
            Some(Self::MilSpec)
        } else {
            None
        }
    }
}

pub fn is_stat_trak(item: &OutcomeItem) -> bool {
    item.has_tag(QUALITY_CATEGORY, STATTRAK_TAG)
}

/// Summary of all stored unlocks
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseStats {
    pub total: usize,
    pub mil_spec: usize,
    pub restricted: usize,
    pub classified: usize,
    pub covert: usize,
    pub special: usize,
    pub stat_trak: usize,
    pub most_opened_group: Option<String>,
    /// Unlocks since the newest special outcome; `total` if there was none
    pub since_last_special: usize,
    pub estimated_cost: f64,
}

impl CaseStats {
    /// Project the statistics of a newest-first event list.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_events(events: &[HistoryEvent], unit_cost: f64) -> Self {
        let mut stats = Self {
            total: events.len(),
            ..Default::default()
        };

        for event in events {
            match RarityTier::of(&event.outcome_item) {
                Some(RarityTier::MilSpec) => stats.mil_spec += 1,
                Some(RarityTier::Restricted) => stats.restricted += 1,
                Some(RarityTier::Classified) => stats.classified += 1,
                Some(RarityTier::Covert) => stats.covert += 1,
                Some(RarityTier::Special) => stats.special += 1,
                None => {}
            }
            if is_stat_trak(&event.outcome_item) {
                stats.stat_trak += 1;
            }
        }

        stats.most_opened_group = most_frequent_group(events);
        stats.since_last_special = events
            .iter()
            .position(|event| RarityTier::of(&event.outcome_item) == Some(RarityTier::Special))
            .unwrap_or(events.len());
        stats.estimated_cost = stats.total as f64 * unit_cost;

        stats
    }

    /// Percentage of all unlocks that `count` represents
    #[allow(clippy::cast_precision_loss)]
    pub fn share(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }
}

/// Most frequent group; ties go to the group that appears first.
fn most_frequent_group(events: &[HistoryEvent]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for event in events {
        *counts.entry(event.group_name.as_str()).or_default() += 1;
    }
    let max = counts.values().copied().max()?;
    events
        .iter()
        .map(|event| event.group_name.as_str())
        .find(|group| counts.get(group) == Some(&max))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::ItemTag;

    fn item(name: &str, color: &str, stat_trak: bool) -> OutcomeItem {
        let mut tags = vec![ItemTag {
            category: "Rarity".to_string(),
            color: Some(color.to_string()),
            ..Default::default()
        }];
        if stat_trak {
            tags.push(ItemTag {
                category: "Quality".to_string(),
                name: "StatTrak™".to_string(),
                color: Some("CF6A32".to_string()),
                ..Default::default()
            });
        }
        OutcomeItem {
            name: name.to_string(),
            tags,
            ..Default::default()
        }
    }

    fn event(id: &str, group: &str, outcome: OutcomeItem) -> HistoryEvent {
        HistoryEvent::new(id, group, outcome)
    }

    #[test]
    fn empty_history_has_zeroed_stats() {
        let stats = CaseStats::from_events(&[], 2.5);
        assert_eq!(stats, CaseStats::default());
        assert!(stats.share(0).abs() < f64::EPSILON);
    }

    #[test]
    fn counts_tiers_and_markers() {
        let events = vec![
            event("6", "Kilowatt Case", item("MP9 | Featherweight", "4b69ff", false)),
            event("5", "Kilowatt Case", item("★ Kukri Knife | Fade", "eb4b4b", false)),
            event("4", "Recoil Case", item("AWP | Chromatic Aberration", "eb4b4b", true)),
            event("3", "Recoil Case", item("Sawed-Off | Kiss♥Love", "d32ce6", false)),
            event("2", "Kilowatt Case", item("Glock-18 | Winterized", "8847ff", true)),
            event("1", "Recoil Case", item("★ Sport Gloves | Nocts", "eb4b4b", false)),
        ];

        let stats = CaseStats::from_events(&events, 2.5);
        assert_eq!(stats.total, 6);
        assert_eq!(stats.mil_spec, 1);
        assert_eq!(stats.restricted, 1);
        assert_eq!(stats.classified, 1);
        assert_eq!(stats.covert, 1);
        assert_eq!(stats.special, 2);
        assert_eq!(stats.stat_trak, 2);
        assert_eq!(stats.since_last_special, 1);
        assert!((stats.estimated_cost - 15.0).abs() < f64::EPSILON);
        assert!((stats.share(3) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn most_opened_group_prefers_first_seen_on_tie() {
        let events = vec![
            event("4", "Revolution Case", item("a", "4b69ff", false)),
            event("3", "Kilowatt Case", item("b", "4b69ff", false)),
            event("2", "Kilowatt Case", item("c", "4b69ff", false)),
            event("1", "Revolution Case", item("d", "4b69ff", false)),
        ];
        let stats = CaseStats::from_events(&events, 2.5);
        assert_eq!(stats.most_opened_group.as_deref(), Some("Revolution Case"));
    }

    #[test]
    fn since_last_special_is_zero_or_total() {
        let newest_special = vec![
            event("2", "Case", item("★ Bayonet | Doppler", "eb4b4b", false)),
            event("1", "Case", item("x", "4b69ff", false)),
        ];
        assert_eq!(CaseStats::from_events(&newest_special, 1.0).since_last_special, 0);

        let none_special = vec![
            event("2", "Case", item("x", "4b69ff", false)),
            event("1", "Case", item("y", "8847ff", false)),
        ];
        assert_eq!(CaseStats::from_events(&none_special, 1.0).since_last_special, 2);
    }
}
