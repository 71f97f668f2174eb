//! Database layer for lootlog

mod connection;
mod migrations;
mod state_repository;

pub use connection::Database;
pub use state_repository::LibSqlStateStore;
