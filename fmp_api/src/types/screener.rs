use serde::{Deserialize, Serialize};

use super::lenient::{opt_f64_lenient, opt_i64_lenient};

/// One row of the `company-screener` response.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScreenerEntry {
    pub symbol: String,

    pub company_name: Option<String>,

    #[serde(default, deserialize_with = "opt_i64_lenient")]
    pub market_cap: Option<i64>,

    pub sector: Option<String>,

    pub industry: Option<String>,

    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub price: Option<f64>,

    pub exchange_short_name: Option<String>,

    pub country: Option<String>,

    pub is_etf: Option<bool>,

    pub is_fund: Option<bool>,

    pub is_actively_trading: Option<bool>,
}
