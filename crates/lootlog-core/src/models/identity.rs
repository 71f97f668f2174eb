//! User identity model

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::Error;

/// Key under which one user's sync state is stored
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.is_empty() {
            return Err(Error::InvalidInput("identity must not be empty".to_string()));
        }
        Ok(Self(value.to_string()))
    }
}

/// Extract the identity from a community profile URL.
///
/// Accepts both vanity (`/id/<name>`) and numeric (`/profiles/<steamid64>`) forms.
///
/// # Examples
///
/// ```
/// use lootlog_core::models::identity_from_profile_url;
///
/// let id = identity_from_profile_url("https://steamcommunity.com/id/gaben/inventoryhistory/");
/// assert_eq!(id.unwrap().as_str(), "gaben");
/// ```
pub fn identity_from_profile_url(url: &str) -> Option<Identity> {
    static PROFILE_RE: OnceLock<Regex> = OnceLock::new();
    let re = PROFILE_RE
        .get_or_init(|| Regex::new(r"/(?:id|profiles)/([^/?#]+)").expect("Invalid regex"));
    re.captures(url)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_identity() {
        let id: Identity = "  76561198000000000 ".parse().unwrap();
        assert_eq!(id.as_str(), "76561198000000000");
        assert!("   ".parse::<Identity>().is_err());
    }

    #[test]
    fn extracts_identity_from_profile_urls() {
        assert_eq!(
            identity_from_profile_url("https://steamcommunity.com/profiles/76561198000000000/inventoryhistory/?l=english")
                .unwrap()
                .as_str(),
            "76561198000000000"
        );
        assert_eq!(
            identity_from_profile_url("https://steamcommunity.com/id/someone").unwrap().as_str(),
            "someone"
        );
        assert!(identity_from_profile_url("https://steamcommunity.com/market/").is_none());
    }
}
