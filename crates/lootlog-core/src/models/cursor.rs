//! Pagination cursor model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque continuation token for the remote history pager.
///
/// The engine only compares cursors for equality and presence; ordering is
/// defined by the remote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor {
    /// Coarse timestamp component (unix seconds)
    pub time: i64,
    /// Fractional timestamp component
    #[serde(default)]
    pub time_frac: i64,
    /// Sequence component
    #[serde(rename = "s", default = "default_sequence")]
    pub sequence: String,
}

fn default_sequence() -> String {
    "0".to_string()
}

impl Cursor {
    /// Create a cursor from its three components
    pub fn new(time: i64, time_frac: i64, sequence: impl Into<String>) -> Self {
        Self {
            time,
            time_frac,
            sequence: sequence.into(),
        }
    }

    /// Synthetic cursor pointing at the present, used to start from the newest page
    #[must_use]
    pub fn now() -> Self {
        Self::new(chrono::Utc::now().timestamp(), 0, default_sequence())
    }

    /// Query pairs for a history page request
    pub fn query_pairs(&self) -> [(&'static str, String); 3] {
        [
            ("cursor[time]", self.time.to_string()),
            ("cursor[time_frac]", self.time_frac.to_string()),
            ("cursor[s]", self.sequence.clone()),
        ]
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}/{}", self.time, self.time_frac, self.sequence)
    }
}
