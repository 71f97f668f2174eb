use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] lootlog_core::Error),
    #[error(transparent)]
    Config(#[from] lootlog_core::ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(
        "No identity given. Pass --identity, or a profile history URL via --url or LOOTLOG_HISTORY_URL."
    )]
    MissingIdentity,
    #[error("History URL must start with http:// or https://: {0}")]
    InvalidUrl(String),
    #[error("No stored history for {0}. Run `lootlog sync` first.")]
    NoStoredHistory(String),
}
