//! Per-ticker ingestion: metadata refresh, price fetch, idempotent write.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::IngestError;
use crate::freshness::needs_refresh_within;
use crate::models::PriceRow;
use crate::provider::{MarketDataProvider, ProviderError};
use crate::rate_limiter::RateLimiter;
use crate::store::PriceStore;
use crate::ticker::Ticker;

/// What happened to a ticker's company metadata during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataStatus {
    /// Stored metadata was within the staleness window; no provider call.
    Fresh,
    Refreshed,
    /// The refresh failed or came back empty; the stored row was left as is.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub metadata: MetadataStatus,
    pub bars_fetched: usize,
    pub rows_inserted: usize,
}

/// Result of ingesting one ticker.
#[derive(Debug)]
pub struct Outcome {
    pub ticker: Ticker,
    pub result: Result<IngestReport, IngestError>,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ingests one ticker at a time. Shared by every worker in the pool.
pub struct Ingestor {
    provider: Arc<dyn MarketDataProvider>,
    store: Arc<dyn PriceStore>,
    limiter: Arc<RateLimiter>,
    staleness: Duration,
}

impl Ingestor {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<dyn PriceStore>,
        limiter: Arc<RateLimiter>,
        staleness: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            limiter,
            staleness,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Never fails: every error is logged with the ticker and returned in the outcome.
    pub async fn ingest(&self, ticker: Ticker) -> Outcome {
        let result = self.try_ingest(&ticker).await;
        match &result {
            Ok(report) => tracing::debug!(
                "Ingested {}: {} bars fetched, {} new rows, metadata {:?}",
                ticker,
                report.bars_fetched,
                report.rows_inserted,
                report.metadata
            ),
            Err(e) => tracing::warn!("Ingestion failed for {}: {}", ticker, e),
        }
        Outcome { ticker, result }
    }

    async fn try_ingest(&self, ticker: &Ticker) -> Result<IngestReport, IngestError> {
        // Prices reference the stock row, so it must exist before anything else.
        self.store.ensure_row_exists(ticker).await?;

        let now = Utc::now();
        // An unreadable row is treated as stale; prices still get written.
        let stored = match self.store.stock_meta(ticker).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Could not read stored metadata for {}: {}", ticker, e);
                None
            }
        };
        let metadata = if needs_refresh_within(stored.as_ref(), now, self.staleness) {
            self.refresh_metadata(ticker, now).await
        } else {
            MetadataStatus::Fresh
        };

        self.limiter.acquire().await;
        let bars = self.track(self.provider.fetch_price_history(ticker).await)?;
        if bars.is_empty() {
            return Err(IngestError::EmptyHistory);
        }

        let rows: Vec<PriceRow> = bars.iter().map(|bar| PriceRow::from_bar(ticker, bar)).collect();
        let rows_inserted = self.store.batch_upsert_ignore(&rows).await?;

        Ok(IngestReport {
            metadata,
            bars_fetched: bars.len(),
            rows_inserted,
        })
    }

    /// A failed refresh never blocks price ingestion.
    async fn refresh_metadata(&self, ticker: &Ticker, now: DateTime<Utc>) -> MetadataStatus {
        self.limiter.acquire().await;
        match self.track(self.provider.fetch_profile(ticker).await) {
            Ok(Some(meta)) => match self.store.upsert_metadata(ticker, &meta, now).await {
                Ok(()) => MetadataStatus::Refreshed,
                Err(e) => {
                    tracing::warn!("Could not store metadata for {}: {}", ticker, e);
                    MetadataStatus::Unavailable
                }
            },
            Ok(None) => {
                tracing::debug!("No profile returned for {}", ticker);
                MetadataStatus::Unavailable
            }
            Err(e) => {
                tracing::warn!("Metadata refresh failed for {}: {}", ticker, e);
                MetadataStatus::Unavailable
            }
        }
    }

    fn track<T>(&self, result: Result<T, ProviderError>) -> Result<T, ProviderError> {
        let tracker = self.limiter.tracker();
        match &result {
            Ok(_) => tracker.record_success(),
            Err(e) if e.is_rate_limited() => tracker.record_rate_limited(),
            Err(_) => tracker.record_failure(),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;
    use crate::models::CompanyMetadata;
    use crate::store::SqliteStore;
    use crate::testing::ScriptedProvider;

    struct Harness {
        provider: Arc<ScriptedProvider>,
        store: SqliteStore,
        ingestor: Ingestor,
    }

    fn harness(provider: ScriptedProvider) -> Harness {
        let db = Db::open_in_memory().unwrap();
        db.init().unwrap();
        let store = SqliteStore::new(db);
        let provider = Arc::new(provider);
        let ingestor = Ingestor::new(
            provider.clone(),
            Arc::new(store.clone()),
            Arc::new(RateLimiter::new(1000.0).unwrap()),
            Duration::days(7),
        );
        Harness {
            provider,
            store,
            ingestor,
        }
    }

    fn ticker(s: &str) -> Ticker {
        Ticker::parse(s).unwrap()
    }

    fn price_count(store: &SqliteStore, t: &str) -> i64 {
        store.db().lock().unwrap().price_count(t).unwrap()
    }

    #[tokio::test]
    async fn new_ticker_gets_metadata_and_prices() {
        let h = harness(ScriptedProvider::new());
        let outcome = h.ingestor.ingest(ticker("AAPL")).await;

        let report = outcome.result.unwrap();
        assert_eq!(report.metadata, MetadataStatus::Refreshed);
        assert_eq!(report.bars_fetched, 2);
        assert_eq!(report.rows_inserted, 2);
        assert_eq!(price_count(&h.store, "AAPL"), 2);

        let meta = h.store.stock_meta(&ticker("AAPL")).await.unwrap().unwrap();
        assert_eq!(meta.sector.as_deref(), Some("Technology"));
        assert!(meta.last_metadata_refresh.is_some());
    }

    #[tokio::test]
    async fn fresh_metadata_skips_profile_call() {
        let h = harness(ScriptedProvider::new());
        let aapl = ticker("AAPL");
        let meta = CompanyMetadata {
            company_name: Some("Apple Inc.".to_string()),
            sector: Some("Technology".to_string()),
            industry: Some("Consumer Electronics".to_string()),
            market_cap: Some(1),
        };
        h.store
            .upsert_metadata(&aapl, &meta, Utc::now() - Duration::days(1))
            .await
            .unwrap();

        let report = h.ingestor.ingest(aapl).await.result.unwrap();
        assert_eq!(report.metadata, MetadataStatus::Fresh);
        assert_eq!(h.provider.profile_calls(), 0);
        assert_eq!(h.provider.history_calls(), 1);
    }

    #[tokio::test]
    async fn second_ingest_inserts_nothing_new() {
        let h = harness(ScriptedProvider::new());
        h.ingestor.ingest(ticker("AAPL")).await.result.unwrap();
        let report = h.ingestor.ingest(ticker("AAPL")).await.result.unwrap();

        assert_eq!(report.metadata, MetadataStatus::Fresh);
        assert_eq!(report.rows_inserted, 0);
        assert_eq!(price_count(&h.store, "AAPL"), 2);
    }

    #[tokio::test]
    async fn profile_failure_still_writes_prices() {
        let h = harness(ScriptedProvider::new().fail_profile("MSFT"));
        let report = h.ingestor.ingest(ticker("MSFT")).await.result.unwrap();

        assert_eq!(report.metadata, MetadataStatus::Unavailable);
        assert_eq!(report.rows_inserted, 2);

        let meta = h.store.stock_meta(&ticker("MSFT")).await.unwrap().unwrap();
        assert_eq!(meta.sector, None);
        assert_eq!(meta.last_metadata_refresh, None);
    }

    #[tokio::test]
    async fn unreadable_metadata_row_still_writes_prices() {
        let h = harness(ScriptedProvider::new());
        h.store
            .db()
            .lock()
            .unwrap()
            .conn()
            .execute(
                "INSERT INTO stocks (ticker, sector, industry, last_metadata_refresh)
                 VALUES ('AAPL', 'Tech', 'HW', '2024-03-15T22:30:00Z')",
                [],
            )
            .unwrap();

        let report = h.ingestor.ingest(ticker("AAPL")).await.result.unwrap();
        assert_eq!(report.metadata, MetadataStatus::Refreshed);
        assert_eq!(report.rows_inserted, 2);
        assert_eq!(price_count(&h.store, "AAPL"), 2);
        assert_eq!(h.provider.profile_calls(), 1);

        // The refresh rewrote the timestamp in the stored format.
        let meta = h.store.stock_meta(&ticker("AAPL")).await.unwrap().unwrap();
        assert_eq!(meta.sector.as_deref(), Some("Technology"));
    }

    #[tokio::test]
    async fn empty_profile_leaves_shell_row() {
        let h = harness(ScriptedProvider::new().empty_profile("NEWCO"));
        let report = h.ingestor.ingest(ticker("NEWCO")).await.result.unwrap();
        assert_eq!(report.metadata, MetadataStatus::Unavailable);
        assert!(h.store.stock_meta(&ticker("NEWCO")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_history_is_a_failure() {
        let h = harness(ScriptedProvider::new().empty_history("DELISTED"));
        let outcome = h.ingestor.ingest(ticker("DELISTED")).await;

        assert!(matches!(outcome.result, Err(IngestError::EmptyHistory)));
        assert_eq!(price_count(&h.store, "DELISTED"), 0);
        assert!(h.store.stock_meta(&ticker("DELISTED")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn history_failure_is_reported() {
        let h = harness(ScriptedProvider::new().fail_history("MSFT"));
        let outcome = h.ingestor.ingest(ticker("MSFT")).await;

        assert!(!outcome.is_ok());
        assert_eq!(outcome.ticker.as_str(), "MSFT");
        assert!(matches!(outcome.result, Err(IngestError::Provider(_))));
    }

    #[tokio::test]
    async fn tracker_counts_provider_calls() {
        let h = harness(
            ScriptedProvider::new()
                .rate_limit_profile("AAPL")
                .fail_history("MSFT"),
        );
        h.ingestor.ingest(ticker("AAPL")).await;
        h.ingestor.ingest(ticker("MSFT")).await;

        let stats = h.ingestor.limiter().tracker().summary();
        assert_eq!(stats.requests_made, 4);
        assert_eq!(stats.requests_rate_limited, 1);
        assert_eq!(stats.requests_failed, 1);
        assert_eq!(stats.requests_succeeded, 2);
    }
}
