//! Persistence seam used by the worker and the batch entrypoint.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::{Db, DbError};
use crate::models::{CompanyMetadata, PriceRow, StockMeta};
use crate::ticker::Ticker;

/// Storage interface for stock metadata, daily prices and run bookkeeping.
///
/// Implementations must be safe to call from many workers at once.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Create an empty stock row if none exists. Never touches an existing row.
    async fn ensure_row_exists(&self, ticker: &Ticker) -> Result<(), DbError>;

    async fn stock_meta(&self, ticker: &Ticker) -> Result<Option<StockMeta>, DbError>;

    /// Write metadata and stamp `refreshed_at` as the last refresh time.
    async fn upsert_metadata(
        &self,
        ticker: &Ticker,
        meta: &CompanyMetadata,
        refreshed_at: DateTime<Utc>,
    ) -> Result<(), DbError>;

    /// Insert rows, silently skipping `(ticker, date)` pairs already stored.
    /// Returns how many rows were new.
    async fn batch_upsert_ignore(&self, rows: &[PriceRow]) -> Result<usize, DbError>;

    /// Every ticker with a stock row, sorted.
    async fn list_tickers(&self) -> Result<Vec<String>, DbError>;

    async fn set_run_meta(&self, key: &str, value: &str) -> Result<(), DbError>;
}

/// `PriceStore` over a single SQLite connection guarded by a mutex.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Db>>,
}

impl SqliteStore {
    pub fn new(db: Db) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub fn db(&self) -> Arc<Mutex<Db>> {
        Arc::clone(&self.db)
    }

    fn lock(&self) -> MutexGuard<'_, Db> {
        // A panic while holding the lock leaves SQLite itself consistent.
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PriceStore for SqliteStore {
    async fn ensure_row_exists(&self, ticker: &Ticker) -> Result<(), DbError> {
        self.lock().ensure_stock_row(ticker.as_str())
    }

    async fn stock_meta(&self, ticker: &Ticker) -> Result<Option<StockMeta>, DbError> {
        self.lock().get_stock_meta(ticker.as_str())
    }

    async fn upsert_metadata(
        &self,
        ticker: &Ticker,
        meta: &CompanyMetadata,
        refreshed_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        self.lock().upsert_stock(ticker.as_str(), meta, refreshed_at)
    }

    async fn batch_upsert_ignore(&self, rows: &[PriceRow]) -> Result<usize, DbError> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.lock().insert_prices_ignore(rows)
    }

    async fn list_tickers(&self) -> Result<Vec<String>, DbError> {
        self.lock().list_tickers()
    }

    async fn set_run_meta(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.lock().set_meta(key, value)
    }
}
