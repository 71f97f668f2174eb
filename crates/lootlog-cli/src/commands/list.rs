use std::path::Path;

use crate::commands::common::{
    event_to_list_item, format_event_lines, load_state, parse_identity, recent_events,
    EventListItem,
};
use crate::error::CliError;

pub async fn run_list(
    identity: &str,
    limit: usize,
    special_only: bool,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let identity = parse_identity(identity)?;
    let state = load_state(db_path, &identity).await?;
    let recent = recent_events(&state.events, limit, special_only);

    if as_json {
        let json_items = recent
            .iter()
            .map(|event| event_to_list_item(event))
            .collect::<Vec<EventListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        if recent.is_empty() && special_only {
            println!("No special outcomes stored for {identity}.");
        }
        for line in format_event_lines(recent) {
            println!("{line}");
        }
    }

    Ok(())
}
