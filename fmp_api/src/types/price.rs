//! Daily bars returned by `historical-price-eod/full`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::lenient::{f64_lenient, opt_f64_lenient};

/// One end-of-day bar. The endpoint returns these newest first.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPrice {
    pub symbol: Option<String>,

    pub date: NaiveDate,

    #[serde(deserialize_with = "f64_lenient")]
    pub open: f64,

    #[serde(deserialize_with = "f64_lenient")]
    pub high: f64,

    #[serde(deserialize_with = "f64_lenient")]
    pub low: f64,

    #[serde(deserialize_with = "f64_lenient")]
    pub close: f64,

    /// Share volume. Kept as a float because FMP occasionally sends `1.23e7`.
    #[serde(deserialize_with = "f64_lenient")]
    pub volume: f64,

    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub change: Option<f64>,

    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub change_percent: Option<f64>,

    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub vwap: Option<f64>,
}
