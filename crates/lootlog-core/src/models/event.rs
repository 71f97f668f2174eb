//! History event model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of one event in a user's history stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(String);

impl HistoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HistoryId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Classification tag attached to an item description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTag {
    #[serde(default)]
    pub internal_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Description of the item an event produced.
///
/// Never used for identity; duplicates are detected by [`HistoryId`] only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeItem {
    pub name: String,
    #[serde(default)]
    pub market_hash_name: String,
    #[serde(default)]
    pub name_color: String,
    #[serde(default)]
    pub background_color: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default, rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub tags: Vec<ItemTag>,
    #[serde(default)]
    pub classid: String,
    #[serde(default)]
    pub instanceid: String,
}

impl OutcomeItem {
    /// Whether any tag carries the given color code (case-insensitive, no `#`)
    pub fn has_tag_color(&self, color: &str) -> bool {
        self.tags.iter().any(|tag| {
            tag.color
                .as_deref()
                .is_some_and(|value| value.trim_start_matches('#').eq_ignore_ascii_case(color))
        })
    }

    /// Whether any tag matches both category and display name
    pub fn has_tag(&self, category: &str, name: &str) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.category == category && tag.name == name)
    }
}

/// One completed container unlock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub history_id: HistoryId,
    /// Container that was opened
    pub group_name: String,
    /// Item received from it
    pub outcome_item: OutcomeItem,
}

impl HistoryEvent {
    pub fn new(
        history_id: impl Into<HistoryId>,
        group_name: impl Into<String>,
        outcome_item: OutcomeItem,
    ) -> Self {
        Self {
            history_id: history_id.into(),
            group_name: group_name.into(),
            outcome_item,
        }
    }
}

impl From<String> for HistoryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with_tags(tags: Vec<ItemTag>) -> OutcomeItem {
        OutcomeItem {
            name: "AK-47 | Redline".to_string(),
            tags,
            ..Default::default()
        }
    }

    #[test]
    fn tag_color_match_ignores_case_and_hash() {
        let item = item_with_tags(vec![ItemTag {
            category: "Rarity".to_string(),
            color: Some("#EB4B4B".to_string()),
            ..Default::default()
        }]);
        assert!(item.has_tag_color("eb4b4b"));
        assert!(!item.has_tag_color("d32ce6"));
    }

    #[test]
    fn has_tag_requires_category_and_name() {
        let item = item_with_tags(vec![ItemTag {
            category: "Quality".to_string(),
            name: "StatTrak™".to_string(),
            ..Default::default()
        }]);
        assert!(item.has_tag("Quality", "StatTrak™"));
        assert!(!item.has_tag("Rarity", "StatTrak™"));
    }

    #[test]
    fn outcome_item_reads_remote_description() {
        let payload = r#"{
            "icon_url": "abc",
            "name": "Glock-18 | Candy Apple",
            "market_hash_name": "Glock-18 | Candy Apple (Factory New)",
            "name_color": "D2D2D2",
            "type": "Mil-Spec Grade Pistol",
            "tradable": 1,
            "tags": [{"internal_name": "Rarity_Rare_Weapon", "name": "Mil-Spec Grade",
                      "category": "Rarity", "category_name": "Quality", "color": "4b69ff"}],
            "classid": "1",
            "instanceid": "0"
        }"#;
        let item: OutcomeItem = serde_json::from_str(payload).unwrap();
        assert_eq!(item.item_type, "Mil-Spec Grade Pistol");
        assert!(item.has_tag_color("4b69ff"));
    }
}
