//! Error types for lootlog-core

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias using lootlog-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lootlog-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote answered with a non-success status other than rate limiting
    #[error("History endpoint returned HTTP {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    /// Remote answered 200 but flagged the page as unsuccessful
    #[error("History endpoint rejected the request: {0}")]
    RemoteRejected(String),

    /// Retry policy bound was reached while rate limited
    #[error("Still rate limited after {0} attempts")]
    RateLimitExhausted(u32),

    /// Another run for the same identity is in progress
    #[error("A sync is already running for {0}")]
    AlreadyRunning(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}
