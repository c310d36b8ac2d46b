//! Batch ingestion of daily stock prices from Financial Modeling Prep into SQLite.
//!
//! A long-lived `BatchRunner` fans a ticker list out to a fixed worker pool,
//! bounding in-flight work with an admission semaphore and upstream request
//! rate with a shared `RateLimiter`. Each ticker's metadata is refreshed when
//! stale and its price history is written insert-if-absent.

pub mod config;
pub mod db;
pub mod dispatcher;
pub mod entrypoint;
pub mod error;
pub mod freshness;
pub mod models;
pub mod provider;
pub mod rate_limiter;
pub mod scheduler;
pub mod shutdown;
pub mod store;
pub mod ticker;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use fmp_api;

pub use config::{PipelineConfig, ScheduleConfig};
pub use db::{Db, DbError, StockRow};
pub use dispatcher::{BatchRunner, RunOutcome, RunSummary};
pub use entrypoint::{BatchReport, BatchRunEntrypoint};
pub use error::IngestError;
pub use models::{CompanyMetadata, PriceBar, PriceRow, StockMeta};
pub use provider::{FmpProvider, MarketDataProvider, ProviderError};
pub use rate_limiter::{RateLimiter, RequestTracker, TrackerSummary};
pub use scheduler::Scheduler;
pub use shutdown::Shutdown;
pub use store::{PriceStore, SqliteStore};
pub use ticker::Ticker;
pub use worker::{IngestReport, Ingestor, MetadataStatus, Outcome};
