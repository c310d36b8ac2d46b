use url::Url;

use super::Query;

/// Filters for the `company-screener` endpoint.
///
/// Defaults mirror the universe the ingestion job tracks: US-listed,
/// actively trading common stock (no ETFs, no funds).
#[derive(Clone, Debug)]
pub struct ScreenerQuery {
    pub country: Option<String>,
    pub sector: Option<String>,
    pub is_etf: Option<bool>,
    pub is_fund: Option<bool>,
    pub is_actively_trading: Option<bool>,
    pub market_cap_more_than: Option<i64>,
    pub limit: Option<u32>,
}

impl Default for ScreenerQuery {
    fn default() -> Self {
        Self {
            country: Some("US".to_string()),
            sector: None,
            is_etf: Some(false),
            is_fund: Some(false),
            is_actively_trading: Some(true),
            market_cap_more_than: None,
            limit: None,
        }
    }
}

impl ScreenerQuery {
    pub fn with_sector(mut self, sector: &str) -> Self {
        self.sector = Some(sector.to_string());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_market_cap_more_than(mut self, market_cap: i64) -> Self {
        self.market_cap_more_than = Some(market_cap);
        self
    }
}

impl Query for ScreenerQuery {
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if let Some(country) = &self.country {
            url.query_pairs_mut().append_pair("country", country);
        }
        if let Some(sector) = &self.sector {
            url.query_pairs_mut().append_pair("sector", sector);
        }
        if let Some(is_etf) = self.is_etf {
            url.query_pairs_mut()
                .append_pair("isEtf", &is_etf.to_string());
        }
        if let Some(is_fund) = self.is_fund {
            url.query_pairs_mut()
                .append_pair("isFund", &is_fund.to_string());
        }
        if let Some(active) = self.is_actively_trading {
            url.query_pairs_mut()
                .append_pair("isActivelyTrading", &active.to_string());
        }
        if let Some(mcap) = self.market_cap_more_than {
            url.query_pairs_mut()
                .append_pair("marketCapMoreThan", &mcap.to_string());
        }
        if let Some(limit) = self.limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }
        url
    }
}
