//! Company profile returned by the `profile` endpoint.

use serde::{Deserialize, Serialize};

use super::lenient::{opt_f64_lenient, opt_i64_lenient};

/// One element of the `profile` response array.
///
/// FMP returns many more fields; only the ones the ingestion job reads or
/// that are useful for display are kept.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub symbol: String,

    pub company_name: Option<String>,

    pub sector: Option<String>,

    pub industry: Option<String>,

    /// Market capitalization in dollars.
    #[serde(default, deserialize_with = "opt_i64_lenient")]
    pub market_cap: Option<i64>,

    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub price: Option<f64>,

    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub beta: Option<f64>,

    pub exchange: Option<String>,

    pub currency: Option<String>,

    pub country: Option<String>,

    pub ipo_date: Option<String>,

    pub is_etf: Option<bool>,

    pub is_fund: Option<bool>,

    pub is_actively_trading: Option<bool>,
}
