use std::path::Path;

use lootlog_core::util::unix_millis_now;

use crate::commands::common::{format_identity_lines, list_identities};
use crate::error::CliError;

pub async fn run_identities(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let identities = list_identities(db_path).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&identities)?);
        return Ok(());
    }

    if identities.is_empty() {
        println!("No stored history.");
        return Ok(());
    }

    for line in format_identity_lines(&identities, unix_millis_now()) {
        println!("{line}");
    }
    Ok(())
}
