//! Data models for lootlog

mod cursor;
mod event;
mod identity;
mod sync_state;

pub use cursor::Cursor;
pub use event::{HistoryEvent, HistoryId, ItemTag, OutcomeItem};
pub use identity::{identity_from_profile_url, Identity};
pub use sync_state::{PendingGap, SyncState};
