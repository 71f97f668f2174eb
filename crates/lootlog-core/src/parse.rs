//! Turning raw history pages into candidate events.
//!
//! [`PageParser`] is the seam: the engine only needs an ordered, newest-first
//! list of events per page. [`UnlockParser`] is a best-effort implementation
//! for the inventory-history markup that keeps container unlocks and resolves
//! the received item against the page's description lookup.

use regex::Regex;

use crate::fetch::{ItemLookup, RawPage};
use crate::models::{HistoryEvent, OutcomeItem};
use crate::util::decode_html_entities;

/// Converts a raw page into candidate events, newest first.
///
/// Rows that cannot be resolved are dropped; parsing never fails a page.
pub trait PageParser: Send + Sync {
    fn parse(&self, page: &RawPage) -> Vec<HistoryEvent>;
}

const ROW_MARKER: &str = "class=\"tradehistoryrow\"";
const UNLOCK_DESCRIPTION: &str = "Unlocked a container";
const EXCLUDED_KEYWORDS: [&str; 2] = ["Sticker", "Souvenir"];

/// Parser for container-unlock rows
pub struct UnlockParser {
    app_id: String,
    description_re: Regex,
    plusminus_re: Regex,
    item_re: Regex,
    name_re: Regex,
    id_attr_re: Regex,
    classid_attr_re: Regex,
    instanceid_attr_re: Regex,
}

/// First item of a `+`/`-` group
#[derive(Debug, PartialEq, Eq)]
struct RowItem {
    id: Option<String>,
    name: String,
    classid: Option<String>,
    instanceid: Option<String>,
}

impl Default for UnlockParser {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_APP_ID)
    }
}

impl UnlockParser {
    pub fn new(app_id: u32) -> Self {
        Self {
            app_id: app_id.to_string(),
            description_re: Regex::new(
                r#"class="tradehistory_event_description"[^>]*>\s*([^<]*)"#,
            )
            .expect("Invalid regex"),
            plusminus_re: Regex::new(
                r#"class="tradehistory_items_plusminus"[^>]*>\s*([+-])\s*<"#,
            )
            .expect("Invalid regex"),
            item_re: Regex::new(r#"<[a-z]+\b([^>]*\bclass="history_item\b[^"]*"[^>]*)>"#)
                .expect("Invalid regex"),
            name_re: Regex::new(r#"class="history_item_name"[^>]*>\s*([^<]*)<"#)
                .expect("Invalid regex"),
            id_attr_re: Regex::new(r#"\bid="([^"]+)""#).expect("Invalid regex"),
            classid_attr_re: Regex::new(r#"\bdata-classid="([^"]+)""#).expect("Invalid regex"),
            instanceid_attr_re: Regex::new(r#"\bdata-instanceid="([^"]+)""#)
                .expect("Invalid regex"),
        }
    }

    fn parse_row(&self, row: &str, lookup: &ItemLookup) -> Option<HistoryEvent> {
        let description = self.description_re.captures(row)?.get(1)?.as_str();
        if !description.contains(UNLOCK_DESCRIPTION) {
            return None;
        }

        let given = self.group_item(row, '-');
        let received = self.group_item(row, '+');
        let (Some(given), Some(received)) = (given, received) else {
            tracing::debug!("Skipping unlock row without given/received items");
            return None;
        };

        let Some(history_id) = given.id else {
            tracing::debug!(container = %given.name, "Skipping unlock row without history id");
            return None;
        };

        if received.name.is_empty()
            || EXCLUDED_KEYWORDS
                .iter()
                .any(|keyword| received.name.contains(keyword))
        {
            return None;
        }

        let Some(outcome_item) = self.resolve_item(&received, lookup) else {
            tracing::debug!(item = %received.name, "Failed to find item data; dropping row");
            return None;
        };

        Some(HistoryEvent::new(history_id, given.name, outcome_item))
    }

    /// First item in the group introduced by the given `+`/`-` marker
    fn group_item(&self, row: &str, sign: char) -> Option<RowItem> {
        let markers: Vec<_> = self
            .plusminus_re
            .captures_iter(row)
            .filter_map(|cap| Some((cap.get(0)?, cap.get(1)?.as_str().starts_with(sign))))
            .collect();

        let index = markers.iter().position(|(_, matches)| *matches)?;
        let start = markers[index].0.end();
        let end = markers
            .get(index + 1)
            .map_or(row.len(), |(next, _)| next.start());
        let section = &row[start..end];

        let item = self.item_re.captures(section)?;
        let attrs = item.get(1)?.as_str();
        let after_item = &section[item.get(0)?.end()..];
        let name = self
            .name_re
            .captures(after_item)
            .and_then(|cap| cap.get(1))
            .map(|m| decode_html_entities(m.as_str().trim()))?;

        let attr = |re: &Regex| {
            re.captures(attrs)
                .and_then(|cap| cap.get(1))
                .map(|m| m.as_str().to_string())
        };

        Some(RowItem {
            id: attr(&self.id_attr_re),
            name,
            classid: attr(&self.classid_attr_re),
            instanceid: attr(&self.instanceid_attr_re),
        })
    }

    /// Look the item up by `classid_instanceid`, falling back to its name
    fn resolve_item(&self, item: &RowItem, lookup: &ItemLookup) -> Option<OutcomeItem> {
        let descriptions = lookup.get(&self.app_id)?;

        if let (Some(classid), Some(instanceid)) = (&item.classid, &item.instanceid) {
            if let Some(found) = descriptions.get(&format!("{classid}_{instanceid}")) {
                return Some(found.clone());
            }
        }

        descriptions
            .values()
            .find(|description| description.name == item.name)
            .cloned()
    }
}

impl PageParser for UnlockParser {
    fn parse(&self, page: &RawPage) -> Vec<HistoryEvent> {
        let events: Vec<_> = page
            .html
            .split(ROW_MARKER)
            .skip(1)
            .filter_map(|row| self.parse_row(row, &page.descriptions))
            .collect();
        tracing::debug!(events = events.len(), "parsed history page");
        events
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::models::ItemTag;

    fn unlock_row(history_id: &str, container: &str, received: &str, classid: &str) -> String {
        format!(
            r#"<div class="tradehistoryrow">
  <div class="tradehistory_date">Dec 1, 2024</div>
  <div class="tradehistory_content">
    <div class="tradehistory_event_description">
      Unlocked a container
    </div>
    <div class="tradehistory_items">
      <div class="tradehistory_items_plusminus">-</div>
      <div class="tradehistory_items_group">
        <span class="history_item economy_item_hoverable" id="{history_id}" data-appid="730">
          <span class="history_item_name" style="color: #D2D2D2;">{container}</span>
        </span>
        <span class="history_item economy_item_hoverable" id="{history_id}_key" data-appid="730">
          <span class="history_item_name">Kilowatt Case Key</span>
        </span>
      </div>
    </div>
    <div class="tradehistory_items">
      <div class="tradehistory_items_plusminus">+</div>
      <div class="tradehistory_items_group">
        <a class="history_item economy_item_hoverable" id="{history_id}_recv" data-classid="{classid}" data-instanceid="0">
          <span class="history_item_name" style="color: #4b69ff;">{received}</span>
        </a>
      </div>
    </div>
  </div>
</div>"#
        )
    }

    fn trade_row() -> &'static str {
        r#"<div class="tradehistoryrow">
  <div class="tradehistory_event_description">You traded with someone</div>
  <div class="tradehistory_items_plusminus">+</div>
  <div class="tradehistory_items_group">
    <span class="history_item" id="trade1"><span class="history_item_name">Thing</span></span>
  </div>
</div>"#
    }

    fn lookup(items: &[(&str, &str)]) -> ItemLookup {
        let entries: HashMap<String, OutcomeItem> = items
            .iter()
            .map(|(key, name)| {
                (
                    (*key).to_string(),
                    OutcomeItem {
                        name: (*name).to_string(),
                        tags: vec![ItemTag {
                            category: "Rarity".to_string(),
                            color: Some("4b69ff".to_string()),
                            ..Default::default()
                        }],
                        ..Default::default()
                    },
                )
            })
            .collect();
        HashMap::from([("730".to_string(), entries)])
    }

    #[test]
    fn parses_unlock_rows_in_page_order() {
        let html = [
            unlock_row("history1", "Kilowatt Case", "Glock-18 | Block-18", "11"),
            trade_row().to_string(),
            unlock_row("history2", "Revolution Case", "P90 | Neoqueen", "22"),
        ]
        .concat();
        let page = RawPage {
            html,
            descriptions: lookup(&[("11_0", "Glock-18 | Block-18"), ("22_0", "P90 | Neoqueen")]),
            cursor: None,
        };

        let events = UnlockParser::default().parse(&page);
        let summary: Vec<_> = events
            .iter()
            .map(|e| {
                (
                    e.history_id.as_str(),
                    e.group_name.as_str(),
                    e.outcome_item.name.as_str(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("history1", "Kilowatt Case", "Glock-18 | Block-18"),
                ("history2", "Revolution Case", "P90 | Neoqueen"),
            ]
        );
    }

    #[test]
    fn falls_back_to_name_lookup() {
        let page = RawPage {
            html: unlock_row("history1", "Kilowatt Case", "MAC-10 | Light Box", "999"),
            descriptions: lookup(&[("5_0", "MAC-10 | Light Box")]),
            cursor: None,
        };
        let events = UnlockParser::default().parse(&page);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome_item.name, "MAC-10 | Light Box");
    }

    #[test]
    fn drops_unresolvable_and_excluded_items() {
        let html = [
            unlock_row("history1", "Kilowatt Case", "Unknown Item", "1"),
            unlock_row("history2", "Capsule", "Sticker | Team Spirit", "2"),
            unlock_row("history3", "Souvenir Package", "Souvenir AWP | Safari Mesh", "3"),
        ]
        .concat();
        let page = RawPage {
            html,
            descriptions: lookup(&[
                ("2_0", "Sticker | Team Spirit"),
                ("3_0", "Souvenir AWP | Safari Mesh"),
            ]),
            cursor: None,
        };
        assert!(UnlockParser::default().parse(&page).is_empty());
    }

    #[test]
    fn decodes_entities_in_names() {
        let page = RawPage {
            html: unlock_row("history1", "Operation Breakout Weapon Case", "M4A1-S | Cyrex &amp; Co", "7"),
            descriptions: lookup(&[("7_0", "M4A1-S | Cyrex & Co")]),
            cursor: None,
        };
        let events = UnlockParser::default().parse(&page);
        assert_eq!(events[0].outcome_item.name, "M4A1-S | Cyrex & Co");
    }

    #[test]
    fn empty_page_yields_no_events() {
        assert!(UnlockParser::default().parse(&RawPage::default()).is_empty());
    }
}
