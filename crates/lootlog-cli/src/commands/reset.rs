use std::path::Path;

use lootlog_core::db::LibSqlStateStore;
use lootlog_core::StateStore;

use crate::commands::common::{open_database, parse_identity};
use crate::error::CliError;

pub async fn run_reset(identity: &str, db_path: &Path) -> Result<bool, CliError> {
    let identity = parse_identity(identity)?;
    let db = open_database(db_path).await?;
    let removed = LibSqlStateStore::new(db.connection())
        .clear(&identity)
        .await?;

    if removed {
        println!("Cleared stored history for {identity}");
    } else {
        println!("No stored history for {identity}");
    }
    Ok(removed)
}
