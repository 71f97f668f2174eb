pub mod common;
pub mod completions;
pub mod identities;
pub mod list;
pub mod reset;
pub mod stats;
pub mod sync;
