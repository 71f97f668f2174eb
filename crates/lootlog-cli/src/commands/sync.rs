use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use lootlog_core::db::LibSqlStateStore;
use lootlog_core::fetch::HttpPageSource;
use lootlog_core::merge::PageMerge;
use lootlog_core::util::is_http_url;
use lootlog_core::{
    CaseStats, EngineConfig, SyncEngine, SyncObserver, SyncOutcome, SyncReport, SyncStatus,
};
use tokio_util::sync::CancellationToken;

use crate::commands::common::{open_database, resolve_sync_identity};
use crate::error::CliError;

/// Prints progress to stderr so stdout only carries the summary
#[derive(Default)]
pub struct ConsoleObserver {
    last: Mutex<Option<SyncStatus>>,
}

impl ConsoleObserver {
    /// Line to print for `status`, or `None` if it repeats the previous one.
    pub fn transition(&self, status: SyncStatus) -> Option<String> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.replace(status) == Some(status) {
            return None;
        }
        Some(match status {
            SyncStatus::RateLimited => "Status: rate_limited (waiting before retrying)".to_string(),
            other => format!("Status: {other}"),
        })
    }
}

impl SyncObserver for ConsoleObserver {
    fn status_changed(&self, status: SyncStatus) {
        tracing::debug!(%status, "sync status changed");
        if let Some(line) = self.transition(status) {
            eprintln!("{line}");
        }
    }

    fn page_merged(&self, merge: &PageMerge, stats: &CaseStats) {
        eprintln!(
            "[{}] +{} events ({} total, {:.1}% covert or better)",
            merge.direction,
            merge.added.len(),
            stats.total,
            stats.share(stats.covert + stats.special)
        );
    }
}

pub async fn run_sync(
    identity: Option<&str>,
    url: Option<String>,
    db_path: &Path,
) -> Result<(), CliError> {
    let mut config = EngineConfig::from_env()?;
    if let Some(url) = url {
        let url = url.trim().to_string();
        if !is_http_url(&url) {
            return Err(CliError::InvalidUrl(url));
        }
        config.history_url = Some(url);
    }

    let identity = resolve_sync_identity(identity, config.history_url.as_deref())?;
    let source = HttpPageSource::new(&config)?;
    let db = open_database(db_path).await?;
    let store = LibSqlStateStore::new(db.connection());
    let engine = SyncEngine::new(source, store, &config)
        .with_observer(Arc::new(ConsoleObserver::default()));

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Stopping after the current step...");
                cancel.cancel();
            }
        })
    };

    let result = engine.run(&identity, &cancel).await;
    ctrl_c.abort();

    let report = result?;
    println!("{}", format_report(&identity.to_string(), &report));
    Ok(())
}

pub fn format_report(identity: &str, report: &SyncReport) -> String {
    let verb = match report.outcome {
        SyncOutcome::Finished => "Sync completed",
        SyncOutcome::Cancelled => "Sync cancelled",
    };
    format!(
        "{verb} for {identity}: {} new, {} older, {} stored ({} pages)",
        report.gap_fill_added, report.extend_added, report.event_count, report.pages_fetched
    )
}
