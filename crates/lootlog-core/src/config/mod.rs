//! Engine configuration loaded from the environment.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_PAGE_SIZE: u32 = 2_000;
pub const DEFAULT_APP_ID: u32 = 730;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(15);
pub const DEFAULT_UNIT_COST: f64 = 2.5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Retry behavior for rate-limited page requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed wait between attempts
    pub backoff: Duration,
    /// Upper bound on attempts for one cursor; `None` retries forever
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_RATE_LIMIT_BACKOFF,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Whether another attempt is allowed after `attempts` rate-limited ones
    pub fn allows_retry(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }
}

/// Everything the sync engine and its HTTP source need
#[derive(Clone)]
pub struct EngineConfig {
    /// Inventory history page URL (without query)
    pub history_url: Option<String>,
    /// Session cookie sent with history requests
    pub cookie: Option<String>,
    pub page_size: u32,
    pub app_id: u32,
    /// Pause between successfully merged pages
    pub page_delay: Duration,
    pub retry: RetryPolicy,
    /// Estimated cost of one opened container
    pub unit_cost: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_url: None,
            cookie: None,
            page_size: DEFAULT_PAGE_SIZE,
            app_id: DEFAULT_APP_ID,
            page_delay: DEFAULT_PAGE_DELAY,
            retry: RetryPolicy::default(),
            unit_cost: DEFAULT_UNIT_COST,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EngineConfig")
            .field("history_url", &self.history_url)
            .field("cookie", &self.cookie.as_ref().map(|_| "[REDACTED]"))
            .field("page_size", &self.page_size)
            .field("app_id", &self.app_id)
            .field("page_delay", &self.page_delay)
            .field("retry", &self.retry)
            .field("unit_cost", &self.unit_cost)
            .finish()
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let history_url = optional_trimmed(&lookup, "LOOTLOG_HISTORY_URL")
            .map(|value| value.trim_end_matches('/').to_string());
        if let Some(url) = history_url.as_deref() {
            if !is_http_url(url) {
                return Err(ConfigError::Invalid(
                    "LOOTLOG_HISTORY_URL must start with http:// or https://".to_string(),
                ));
            }
        }

        let cookie = optional_trimmed(&lookup, "LOOTLOG_COOKIE");

        let page_size = parse_in_range(&lookup, "LOOTLOG_PAGE_SIZE", "2000", 1, 5_000)?;
        let page_size = u32::try_from(page_size)
            .map_err(|_| ConfigError::Invalid("LOOTLOG_PAGE_SIZE is out of range".to_string()))?;

        let app_id = value_or_default(&lookup, "LOOTLOG_APP_ID", "730")
            .parse::<u32>()
            .map_err(|_| {
                ConfigError::Invalid("LOOTLOG_APP_ID must be a positive integer".to_string())
            })?;

        let page_delay_ms = parse_in_range(&lookup, "LOOTLOG_PAGE_DELAY_MS", "500", 0, 60_000)?;
        let backoff_secs =
            parse_in_range(&lookup, "LOOTLOG_RATE_LIMIT_BACKOFF_SECS", "15", 1, 600)?;

        let max_attempts = optional_trimmed(&lookup, "LOOTLOG_RATE_LIMIT_MAX_ATTEMPTS")
            .map(|value| {
                value.parse::<u32>().ok().filter(|attempts| *attempts > 0).ok_or_else(|| {
                    ConfigError::Invalid(
                        "LOOTLOG_RATE_LIMIT_MAX_ATTEMPTS must be an integer >= 1".to_string(),
                    )
                })
            })
            .transpose()?;

        let unit_cost = value_or_default(&lookup, "LOOTLOG_UNIT_COST", "2.5")
            .parse::<f64>()
            .ok()
            .filter(|cost| cost.is_finite() && *cost >= 0.0)
            .ok_or_else(|| {
                ConfigError::Invalid("LOOTLOG_UNIT_COST must be a number >= 0".to_string())
            })?;

        Ok(Self {
            history_url,
            cookie,
            page_size,
            app_id,
            page_delay: Duration::from_millis(page_delay_ms),
            retry: RetryPolicy {
                backoff: Duration::from_secs(backoff_secs),
                max_attempts,
            },
            unit_cost,
        })
    }

    /// History URL, or an error naming the variable to set
    pub fn require_history_url(&self) -> Result<&str, ConfigError> {
        self.history_url
            .as_deref()
            .ok_or(ConfigError::MissingVar("LOOTLOG_HISTORY_URL"))
    }
}

fn optional_trimmed(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}

fn value_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: &str,
) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn parse_in_range(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: &str,
    min: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let value = value_or_default(lookup, name, default)
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(format!("{name} must be an integer in [{min}, {max}]")))?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid(format!("{name} must be in [{min}, {max}]")))
    }
}
