//! Page fetching with rate-limit backoff.
//!
//! A [`PageSource`] performs exactly one request per call. [`PageFetcher`]
//! wraps it with the retry loop: rate-limited attempts are retried for the
//! same cursor according to the [`RetryPolicy`], anything else is returned
//! to the caller as-is.

mod http;

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use crate::config::RetryPolicy;
use crate::error::{Error, Result};
use crate::models::{Cursor, OutcomeItem};
use crate::status::{SyncObserver, SyncStatus};

pub use http::{parse_history_response, HttpPageSource};

/// Item descriptions of one page: app id -> `classid_instanceid` -> item
pub type ItemLookup = HashMap<String, HashMap<String, OutcomeItem>>;

/// Unparsed page as returned by the remote
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    /// Page markup
    pub html: String,
    pub descriptions: ItemLookup,
    /// Continuation for the next (older) page; `None` on the last page
    pub cursor: Option<Cursor>,
}

/// Result of a single request attempt
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Page(RawPage),
    RateLimited,
}

/// One request per call against the remote history pager
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&self, cursor: &Cursor) -> Result<FetchOutcome>;
}

impl<S: PageSource> PageSource for &S {
    async fn fetch_page(&self, cursor: &Cursor) -> Result<FetchOutcome> {
        (**self).fetch_page(cursor).await
    }
}

/// Retrying wrapper around a [`PageSource`]
pub struct PageFetcher<S> {
    source: S,
    retry: RetryPolicy,
}

impl<S: PageSource> PageFetcher<S> {
    pub const fn new(source: S, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// Fetch the page at `cursor`, waiting out rate limits.
    ///
    /// Returns `Ok(None)` if the run was cancelled before a page arrived.
    pub async fn fetch(
        &self,
        cursor: &Cursor,
        observer: &dyn SyncObserver,
        cancel: &CancellationToken,
    ) -> Result<Option<RawPage>> {
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }

            observer.status_changed(SyncStatus::Fetching);
            attempts = attempts.saturating_add(1);

            match self.source.fetch_page(cursor).await? {
                FetchOutcome::Page(page) => {
                    tracing::debug!(%cursor, attempts, "fetched history page");
                    return Ok(Some(page));
                }
                FetchOutcome::RateLimited => {
                    if !self.retry.allows_retry(attempts) {
                        return Err(Error::RateLimitExhausted(attempts));
                    }

                    tracing::warn!(
                        %cursor,
                        attempts,
                        "Rate limited. Waiting {:?} before retrying",
                        self.retry.backoff
                    );
                    observer.status_changed(SyncStatus::RateLimited);
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Ok(None),
                        () = tokio::time::sleep(self.retry.backoff) => {}
                    }
                }
            }
        }
    }
}
