use std::path::Path;

use lootlog_core::{CaseStats, EngineConfig};

use crate::commands::common::{
    format_stats_lines, format_sync_timestamp, load_state, parse_identity,
};
use crate::error::CliError;

pub async fn run_stats(identity: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let identity = parse_identity(identity)?;
    let config = EngineConfig::from_env()?;
    let state = load_state(db_path, &identity).await?;
    let stats = CaseStats::from_events(&state.events, config.unit_cost);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "{identity} (last synced {})",
        format_sync_timestamp(state.last_sync_at)
    );
    for line in format_stats_lines(&stats) {
        println!("{line}");
    }
    if state.cursor.is_some() {
        println!("Older history has not been fully fetched yet.");
    }
    Ok(())
}
