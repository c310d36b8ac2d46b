//! Domain records shared by the provider, store, and worker.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::ticker::Ticker;

/// Reference metadata for a company as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompanyMetadata {
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<i64>,
}

/// Metadata currently stored for a ticker. Any field may be absent on a shell row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockMeta {
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<i64>,
    pub last_metadata_refresh: Option<DateTime<Utc>>,
}

/// One daily bar from the provider, not yet bound to a ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// A stored daily price, unique on `(ticker, trade_date)`. Never updated once written.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub ticker: Ticker,
    pub trade_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceRow {
    pub fn from_bar(ticker: &Ticker, bar: &PriceBar) -> Self {
        Self {
            ticker: ticker.clone(),
            trade_date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}
