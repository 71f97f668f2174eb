//! Sync orchestration.
//!
//! A run loads the stored state for an identity, catches up on new events
//! (gap-fill) and then walks further into the past from the stored resume
//! cursor (extension). Every merged page is persisted before the next one is
//! requested, so a failed or cancelled run never loses earlier pages. A
//! gap-fill that stops part way leaves a [`PendingGap`] behind, and the next
//! run finishes that gap before looking for newer events.

mod registry;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::dedup;
use crate::error::Result;
use crate::fetch::{PageFetcher, PageSource};
use crate::merge::{self, Direction, Next, PageMerge, Step, StopReason};
use crate::models::{Cursor, HistoryId, Identity, PendingGap, SyncState};
use crate::parse::{PageParser, UnlockParser};
use crate::stats::CaseStats;
use crate::status::{SyncObserver, SyncStatus, TracingObserver};
use crate::store::StateStore;

use registry::RunRegistry;

/// How a run ended when it did not fail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    #[default]
    Finished,
    Cancelled,
}

/// Summary of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    /// Events inserted ahead of the stored ones
    pub gap_fill_added: usize,
    /// Events appended behind the stored ones
    pub extend_added: usize,
    pub pages_fetched: usize,
    /// Stored events after the run
    pub event_count: usize,
    pub gap_fill_stop: Option<StopReason>,
    pub extend_stop: Option<StopReason>,
}

impl SyncReport {
    pub const fn added(&self) -> usize {
        self.gap_fill_added + self.extend_added
    }

    fn record(&mut self, merge: &PageMerge) {
        match merge.direction {
            Direction::GapFill => self.gap_fill_added += merge.added.len(),
            Direction::Extend => self.extend_added += merge.added.len(),
        }
    }

    fn finish_phase(&mut self, direction: Direction, reason: StopReason) {
        match direction {
            Direction::GapFill => self.gap_fill_stop = Some(reason),
            Direction::Extend => self.extend_stop = Some(reason),
        }
    }
}

/// Incremental history sync over a page source and a state store
pub struct SyncEngine<S, R> {
    fetcher: PageFetcher<S>,
    store: R,
    parser: Arc<dyn PageParser>,
    observer: Arc<dyn SyncObserver>,
    page_delay: Duration,
    unit_cost: f64,
    running: RunRegistry,
}

impl<S: PageSource, R: StateStore> SyncEngine<S, R> {
    pub fn new(source: S, store: R, config: &EngineConfig) -> Self {
        Self {
            fetcher: PageFetcher::new(source, config.retry),
            store,
            parser: Arc::new(UnlockParser::new(config.app_id)),
            observer: Arc::new(TracingObserver),
            page_delay: config.page_delay,
            unit_cost: config.unit_cost,
            running: RunRegistry::default(),
        }
    }

    /// Replace the page parser
    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn PageParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Replace the status observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn is_running(&self, identity: &Identity) -> bool {
        self.running.is_running(identity)
    }

    /// Run one sync for `identity`.
    ///
    /// Fails with `AlreadyRunning` if a run for the same identity is in
    /// progress on this engine. Any other error aborts the run after the
    /// pages merged so far have been persisted.
    pub async fn run(&self, identity: &Identity, cancel: &CancellationToken) -> Result<SyncReport> {
        let _guard = self.running.acquire(identity)?;
        tracing::info!(%identity, "Starting sync");

        let mut report = SyncReport::default();
        match self.run_phases(identity, cancel, &mut report).await {
            Ok(outcome) => {
                report.outcome = outcome;
                let status = match outcome {
                    SyncOutcome::Finished => SyncStatus::Finished,
                    SyncOutcome::Cancelled => SyncStatus::Idle,
                };
                self.observer.status_changed(status);
                tracing::info!(
                    %identity,
                    added = report.added(),
                    total = report.event_count,
                    pages = report.pages_fetched,
                    ?outcome,
                    "Sync complete"
                );
                Ok(report)
            }
            Err(error) => {
                self.observer.status_changed(SyncStatus::Error);
                tracing::warn!(%identity, %error, "Sync failed");
                Err(error)
            }
        }
    }

    async fn run_phases(
        &self,
        identity: &Identity,
        cancel: &CancellationToken,
        report: &mut SyncReport,
    ) -> Result<SyncOutcome> {
        let mut state;

        if let Some(stored) = self.store.load(identity).await? {
            state = stored;
            tracing::debug!(%identity, events = state.len(), "Loaded stored state");

            if let Some(pending) = state.pending_gap.clone() {
                tracing::info!(%identity, next = %pending.next, "Resuming unfinished gap-fill");
                let reason = self
                    .walk(
                        Direction::GapFill,
                        pending.next,
                        pending.anchor.as_ref(),
                        identity,
                        &mut state,
                        cancel,
                        report,
                    )
                    .await?;
                if reason == StopReason::Cancelled {
                    report.event_count = state.len();
                    return Ok(SyncOutcome::Cancelled);
                }
            }

            let anchor = state.newest().map(|event| event.history_id.clone());
            let reason = self
                .walk(
                    Direction::GapFill,
                    Cursor::now(),
                    anchor.as_ref(),
                    identity,
                    &mut state,
                    cancel,
                    report,
                )
                .await?;
            if reason == StopReason::Cancelled {
                report.event_count = state.len();
                return Ok(SyncOutcome::Cancelled);
            }

            if let Some(resume) = state.cursor.clone() {
                let reason = self
                    .walk(Direction::Extend, resume, None, identity, &mut state, cancel, report)
                    .await?;
                if reason == StopReason::Cancelled {
                    report.event_count = state.len();
                    return Ok(SyncOutcome::Cancelled);
                }
            } else {
                tracing::debug!(%identity, "Full history already stored; skipping extension");
            }
        } else {
            state = SyncState::default();
            let reason = self
                .walk(
                    Direction::Extend,
                    Cursor::now(),
                    None,
                    identity,
                    &mut state,
                    cancel,
                    report,
                )
                .await?;
            if reason == StopReason::Cancelled {
                report.event_count = state.len();
                return Ok(SyncOutcome::Cancelled);
            }
        }

        report.event_count = state.len();
        Ok(SyncOutcome::Finished)
    }

    /// Fetch and merge pages in one direction until the phase stops.
    #[allow(clippy::too_many_arguments)]
    async fn walk(
        &self,
        direction: Direction,
        start: Cursor,
        anchor: Option<&HistoryId>,
        identity: &Identity,
        state: &mut SyncState,
        cancel: &CancellationToken,
        report: &mut SyncReport,
    ) -> Result<StopReason> {
        let mut cursor = start;

        let reason = loop {
            let Some(page) = self
                .fetcher
                .fetch(&cursor, self.observer.as_ref(), cancel)
                .await?
            else {
                break StopReason::Cancelled;
            };
            report.pages_fetched += 1;

            let candidates = self.parser.parse(&page);
            let partition = dedup::partition(candidates, state, anchor);

            let next = match merge::plan(direction, partition, page.cursor) {
                Step::Stop(reason) => break reason,
                Step::Advance(next) => {
                    tracing::debug!(%direction, %cursor, "Page had no events; advancing");
                    next
                }
                Step::Merge(splice, next) => {
                    let merge = merge::apply(state, splice);
                    if direction == Direction::GapFill {
                        state.pending_gap = match &next {
                            Next::Continue(next_page) => Some(PendingGap {
                                anchor: anchor.cloned(),
                                next: next_page.clone(),
                            }),
                            Next::Stop(_) => None,
                        };
                    }
                    self.store.save(identity, state).await?;
                    report.record(&merge);

                    let stats = CaseStats::from_events(&state.events, self.unit_cost);
                    self.observer.page_merged(&merge, &stats);

                    match next {
                        Next::Continue(next) => next,
                        Next::Stop(reason) => break reason,
                    }
                }
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => break StopReason::Cancelled,
                () = tokio::time::sleep(self.page_delay) => {}
            }
            cursor = next;
        };

        // The gap closed without a merge, e.g. on a page of stored events.
        if direction == Direction::GapFill
            && reason != StopReason::Cancelled
            && state.pending_gap.take().is_some()
        {
            self.store.save(identity, state).await?;
        }

        tracing::info!(%identity, %direction, ?reason, "Phase finished");
        report.finish_phase(direction, reason);
        Ok(reason)
    }
}
