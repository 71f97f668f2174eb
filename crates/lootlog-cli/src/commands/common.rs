use std::env;
use std::path::{Path, PathBuf};

use lootlog_core::db::{Database, LibSqlStateStore};
use lootlog_core::models::{identity_from_profile_url, HistoryEvent, Identity};
use lootlog_core::stats::{is_stat_trak, RarityTier};
use lootlog_core::{CaseStats, StateStore, StoredIdentity, SyncState};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct EventListItem {
    pub history_id: String,
    pub group_name: String,
    pub item_name: String,
    pub rarity: Option<RarityTier>,
    pub stat_trak: bool,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("LOOTLOG_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lootlog")
        .join("lootlog.db")
}

pub async fn open_database(db_path: &Path) -> Result<Database, CliError> {
    Ok(Database::open(db_path).await?)
}

pub fn parse_identity(value: &str) -> Result<Identity, CliError> {
    value.parse().map_err(|_| CliError::MissingIdentity)
}

/// Explicit identity wins; otherwise derive it from the profile part of the history URL.
pub fn resolve_sync_identity(
    identity: Option<&str>,
    history_url: Option<&str>,
) -> Result<Identity, CliError> {
    if let Some(value) = identity.filter(|value| !value.trim().is_empty()) {
        return parse_identity(value);
    }
    history_url
        .and_then(identity_from_profile_url)
        .ok_or(CliError::MissingIdentity)
}

pub async fn load_state(db_path: &Path, identity: &Identity) -> Result<SyncState, CliError> {
    let db = open_database(db_path).await?;
    LibSqlStateStore::new(db.connection())
        .load(identity)
        .await?
        .ok_or_else(|| CliError::NoStoredHistory(identity.to_string()))
}

pub async fn list_identities(db_path: &Path) -> Result<Vec<StoredIdentity>, CliError> {
    let db = open_database(db_path).await?;
    Ok(LibSqlStateStore::new(db.connection())
        .list_identities()
        .await?)
}

pub fn event_to_list_item(event: &HistoryEvent) -> EventListItem {
    EventListItem {
        history_id: event.history_id.to_string(),
        group_name: event.group_name.clone(),
        item_name: event.outcome_item.name.clone(),
        rarity: RarityTier::of(&event.outcome_item),
        stat_trak: is_stat_trak(&event.outcome_item),
    }
}

pub const fn rarity_label(rarity: Option<RarityTier>) -> &'static str {
    match rarity {
        Some(RarityTier::MilSpec) => "mil-spec",
        Some(RarityTier::Restricted) => "restricted",
        Some(RarityTier::Classified) => "classified",
        Some(RarityTier::Covert) => "covert",
        Some(RarityTier::Special) => "special",
        None => "other",
    }
}

/// Newest `limit` events, optionally only special outcomes
pub fn recent_events(
    events: &[HistoryEvent],
    limit: usize,
    special_only: bool,
) -> Vec<&HistoryEvent> {
    events
        .iter()
        .filter(|event| {
            !special_only || RarityTier::of(&event.outcome_item) == Some(RarityTier::Special)
        })
        .take(limit)
        .collect()
}

pub fn format_event_lines<'a>(events: impl IntoIterator<Item = &'a HistoryEvent>) -> Vec<String> {
    events
        .into_iter()
        .map(|event| {
            let item = event_to_list_item(event);
            format!(
                "{}  {:<10}  {} <- {}",
                item.history_id,
                rarity_label(item.rarity),
                item.item_name,
                item.group_name
            )
        })
        .collect()
}

pub fn format_stats_lines(stats: &CaseStats) -> Vec<String> {
    let tier = |label: &str, count: usize| {
        format!("{label:<12} {count:>6}  ({:.2}%)", stats.share(count))
    };

    vec![
        format!("{:<12} {:>6}", "total", stats.total),
        tier("mil-spec", stats.mil_spec),
        tier("restricted", stats.restricted),
        tier("classified", stats.classified),
        tier("covert", stats.covert),
        tier("special", stats.special),
        tier("stattrak", stats.stat_trak),
        format!(
            "{:<12} {}",
            "most opened",
            stats.most_opened_group.as_deref().unwrap_or("-")
        ),
        format!("{:<12} {:>6}", "since special", stats.since_last_special),
        format!("{:<12} {:>9.2}", "spent (est.)", stats.estimated_cost),
    ]
}

pub fn format_identity_lines(identities: &[StoredIdentity], now_ms: i64) -> Vec<String> {
    identities
        .iter()
        .map(|row| {
            format!(
                "{}  {} events  synced {}",
                row.identity,
                row.event_count,
                format_relative_time(row.last_sync_at, now_ms)
            )
        })
        .collect()
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
