//! HTTP page source for the community inventory-history endpoint.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};

use super::{FetchOutcome, ItemLookup, PageSource, RawPage};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::models::Cursor;
use crate::util::compact_text;

const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct HttpPageSource {
    history_url: String,
    page_size: u32,
    app_id: u32,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpPageSource {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpPageSource")
            .field("history_url", &self.history_url)
            .field("page_size", &self.page_size)
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl HttpPageSource {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let history_url = config.require_history_url()?.to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(
            "x-requested-with",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        if let Some(cookie) = config.cookie.as_deref() {
            let mut value = HeaderValue::from_str(cookie).map_err(|_| {
                Error::InvalidInput("session cookie contains invalid characters".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            history_url,
            page_size: config.page_size,
            app_id: config.app_id,
            client,
        })
    }

    fn query(&self, cursor: &Cursor) -> Vec<(&'static str, String)> {
        let mut query = vec![("ajax", "1".to_string())];
        query.extend(cursor.query_pairs());
        query.push(("count", self.page_size.to_string()));
        query.push(("l", "english".to_string()));
        query.push(("app[]", self.app_id.to_string()));
        query
    }
}

impl PageSource for HttpPageSource {
    async fn fetch_page(&self, cursor: &Cursor) -> Result<FetchOutcome> {
        let response = self
            .client
            .get(&self.history_url)
            .query(&self.query(cursor))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(FetchOutcome::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RemoteStatus {
                status: status.as_u16(),
                body: compact_text(&body),
            });
        }

        let body = response.text().await?;
        parse_history_response(&body).map(FetchOutcome::Page)
    }
}

#[derive(Debug, Deserialize)]
struct HistoryPageResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    html: String,
    #[serde(default, deserialize_with = "lookup_or_empty")]
    descriptions: ItemLookup,
    #[serde(default)]
    cursor: Option<Cursor>,
    #[serde(default)]
    error: Option<String>,
}

/// The endpoint sends `[]` instead of `{}` when a page has no descriptions.
fn lookup_or_empty<'de, D>(deserializer: D) -> std::result::Result<ItemLookup, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LookupRepr {
        Map(ItemLookup),
        List(Vec<serde_json::Value>),
    }

    Ok(match Option::<LookupRepr>::deserialize(deserializer)? {
        Some(LookupRepr::Map(map)) => map,
        Some(LookupRepr::List(_)) | None => ItemLookup::new(),
    })
}

/// Parse a history page body.
///
/// Public for testability: callers can exercise parsing without network access.
pub fn parse_history_response(body: &str) -> Result<RawPage> {
    let response: HistoryPageResponse = serde_json::from_str(body)?;
    if !response.success {
        let reason = response
            .error
            .map_or_else(|| "success flag was false".to_string(), |e| compact_text(&e));
        return Err(Error::RemoteRejected(reason));
    }

    Ok(RawPage {
        html: response.html,
        descriptions: response.descriptions,
        cursor: response.cursor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_successful_page_with_cursor() {
        let body = r#"{
            "success": true,
            "html": "<div class=\"tradehistoryrow\"></div>",
            "num": 1,
            "descriptions": {"730": {"123_0": {"name": "P250 | Sand Dune", "classid": "123", "instanceid": "0"}}},
            "cursor": {"time": 1700000000, "time_frac": 0, "s": "55"}
        }"#;
        let page = parse_history_response(body).unwrap();
        assert_eq!(page.cursor, Some(Cursor::new(1_700_000_000, 0, "55")));
        assert_eq!(page.descriptions["730"]["123_0"].name, "P250 | Sand Dune");
    }

    #[test]
    fn last_page_has_no_cursor_and_empty_descriptions_list() {
        let body = r#"{"success": true, "html": "", "descriptions": []}"#;
        let page = parse_history_response(body).unwrap();
        assert_eq!(page.cursor, None);
        assert!(page.descriptions.is_empty());
    }

    #[test]
    fn unsuccessful_page_is_rejected() {
        let error = parse_history_response(r#"{"success": false, "error": "not logged in"}"#)
            .unwrap_err();
        assert!(matches!(error, Error::RemoteRejected(ref reason) if reason == "not logged in"));
    }

    #[test]
    fn malformed_body_is_a_serialization_error() {
        let error = parse_history_response("<html>login</html>").unwrap_err();
        assert!(matches!(error, Error::Serialization(_)));
    }

    #[test]
    fn query_includes_cursor_and_paging_fields() {
        let config = EngineConfig {
            history_url: Some("https://steamcommunity.com/id/me/inventoryhistory".to_string()),
            ..Default::default()
        };
        let source = HttpPageSource::new(&config).unwrap();
        let query = source.query(&Cursor::new(5, 1, "9"));
        assert!(query.contains(&("cursor[time]", "5".to_string())));
        assert!(query.contains(&("cursor[s]", "9".to_string())));
        assert!(query.contains(&("count", "2000".to_string())));
        assert!(query.contains(&("app[]", "730".to_string())));
    }

    #[test]
    fn requires_history_url() {
        assert!(matches!(
            HttpPageSource::new(&EngineConfig::default()),
            Err(Error::Config(_))
        ));
    }
}
