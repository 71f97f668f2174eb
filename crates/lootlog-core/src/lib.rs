//! lootlog-core - incremental sync of container-unlock history
//!
//! This crate contains the models, page fetching and parsing, the merge
//! engine, persistence and aggregate statistics used by the `lootlog` CLI.

pub mod config;
pub mod db;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod models;
pub mod parse;
pub mod stats;
pub mod status;
pub mod store;
pub mod sync;
pub mod util;

pub use config::{ConfigError, EngineConfig, RetryPolicy};
pub use error::{Error, Result};
pub use models::{Cursor, HistoryEvent, HistoryId, Identity, PendingGap, SyncState};
pub use stats::CaseStats;
pub use status::{SyncObserver, SyncStatus};
pub use store::{MemoryStateStore, StateStore, StoredIdentity};
pub use sync::{SyncEngine, SyncOutcome, SyncReport};
