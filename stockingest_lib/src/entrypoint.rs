//! The single operation every trigger calls to start a batch run.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{format_timestamp, DbError};
use crate::dispatcher::{BatchRunner, RunOutcome, RunSummary};
use crate::error::IngestError;
use crate::shutdown::Shutdown;
use crate::store::PriceStore;
use crate::ticker::Ticker;

pub const META_LAST_RUN_STARTED: &str = "last_run_started_at";
pub const META_LAST_RUN_FINISHED: &str = "last_run_finished_at";
pub const META_LAST_RUN_SUMMARY: &str = "last_run_summary";

/// Aggregate result reported to whoever triggered the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchReport {
    Completed { summary: RunSummary },
    Interrupted { summary: RunSummary },
    Skipped,
}

impl BatchReport {
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            BatchReport::Completed { summary } | BatchReport::Interrupted { summary } => Some(summary),
            BatchReport::Skipped => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, BatchReport::Skipped)
    }
}

pub struct BatchRunEntrypoint {
    runner: Arc<BatchRunner>,
    store: Arc<dyn PriceStore>,
    shutdown: Shutdown,
}

impl BatchRunEntrypoint {
    pub fn new(runner: Arc<BatchRunner>, store: Arc<dyn PriceStore>, shutdown: Shutdown) -> Self {
        Self {
            runner,
            store,
            shutdown,
        }
    }

    pub fn runner(&self) -> &Arc<BatchRunner> {
        &self.runner
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Run over caller-supplied symbols. Invalid symbols are logged and dropped;
    /// duplicates keep their first position.
    pub async fn run_symbols<S: AsRef<str>>(&self, raw: &[S]) -> BatchReport {
        let tickers = normalize_symbols(raw);
        self.run_tickers(tickers).await
    }

    /// Run over every ticker in the stored universe.
    pub async fn run_universe(&self) -> Result<BatchReport, IngestError> {
        let universe = self.store.list_tickers().await?;
        if universe.is_empty() {
            tracing::warn!("Ticker universe is empty; seed it before running");
        }
        Ok(self.run_symbols(universe.as_slice()).await)
    }

    pub async fn run_tickers(&self, tickers: Vec<Ticker>) -> BatchReport {
        let started_at = Utc::now();
        let report = match self.runner.run(tickers, &self.shutdown).await {
            RunOutcome::Skipped => {
                tracing::info!("Batch run skipped: another run is already active");
                return BatchReport::Skipped;
            }
            RunOutcome::Completed(summary) => BatchReport::Completed { summary },
            RunOutcome::Cancelled(summary) => {
                // Keep the stop request visible to the caller and any other observer.
                self.shutdown.trigger();
                tracing::warn!(
                    "Batch run interrupted after {} of {} admitted tickers",
                    summary.completed,
                    summary.submitted
                );
                BatchReport::Interrupted { summary }
            }
        };

        if let Err(e) = self.record_run(started_at, &report).await {
            tracing::warn!("Could not record run metadata: {}", e);
        }
        report
    }

    async fn record_run(&self, started_at: DateTime<Utc>, report: &BatchReport) -> Result<(), DbError> {
        let summary = serde_json::to_string(report)?;
        self.store
            .set_run_meta(META_LAST_RUN_STARTED, &format_timestamp(started_at))
            .await?;
        self.store
            .set_run_meta(META_LAST_RUN_FINISHED, &format_timestamp(Utc::now()))
            .await?;
        self.store.set_run_meta(META_LAST_RUN_SUMMARY, &summary).await?;
        Ok(())
    }
}

/// Parse, uppercase and de-duplicate raw symbols, preserving first occurrence.
pub fn normalize_symbols<S: AsRef<str>>(raw: &[S]) -> Vec<Ticker> {
    let mut seen = HashSet::new();
    let mut tickers = Vec::with_capacity(raw.len());
    for symbol in raw {
        match Ticker::parse(symbol.as_ref()) {
            Ok(ticker) => {
                if seen.insert(ticker.clone()) {
                    tickers.push(ticker);
                }
            }
            Err(e) => tracing::warn!("Skipping symbol {:?}: {}", symbol.as_ref(), e),
        }
    }
    tickers
}
