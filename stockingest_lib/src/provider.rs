//! Upstream market data seam and its Financial Modeling Prep implementation.

use async_trait::async_trait;
use fmp_api::types::{CompanyProfile, HistoricalPrice, ScreenerEntry};
use fmp_api::ScreenerQuery;

use crate::models::{CompanyMetadata, PriceBar};
use crate::ticker::Ticker;

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error(transparent)]
    Api(#[from] fmp_api::Error),
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// True when the upstream throttled the request.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::Api(fmp_api::Error::RateLimited))
    }
}

/// One call per (ticker, request kind). Any call may fail or come back empty.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Company metadata, or `None` when the provider knows nothing about the ticker.
    async fn fetch_profile(&self, ticker: &Ticker) -> Result<Option<CompanyMetadata>, ProviderError>;

    /// Full daily history. An empty vector means the provider returned no bars.
    async fn fetch_price_history(&self, ticker: &Ticker) -> Result<Vec<PriceBar>, ProviderError>;
}

/// `MarketDataProvider` backed by the FMP stable API.
pub struct FmpProvider {
    client: fmp_api::Client,
}

impl FmpProvider {
    pub fn new(client: fmp_api::Client) -> Self {
        Self { client }
    }

    /// Runs the company screener and converts rows into universe entries.
    /// Rows with an unusable symbol are skipped.
    pub async fn screener(
        &self,
        query: &ScreenerQuery,
    ) -> Result<Vec<(Ticker, CompanyMetadata)>, ProviderError> {
        let entries = self.client.get_company_screener(query).await?;
        let total = entries.len();
        let rows: Vec<(Ticker, CompanyMetadata)> =
            entries.into_iter().filter_map(screener_row).collect();
        if rows.len() < total {
            tracing::debug!("Skipped {} screener rows with invalid symbols", total - rows.len());
        }
        Ok(rows)
    }
}

#[async_trait]
impl MarketDataProvider for FmpProvider {
    async fn fetch_profile(&self, ticker: &Ticker) -> Result<Option<CompanyMetadata>, ProviderError> {
        let profiles = self.client.get_company_profile(ticker.as_str()).await?;
        let profile = profiles
            .iter()
            .find(|p| p.symbol.eq_ignore_ascii_case(ticker.as_str()))
            .or_else(|| profiles.first());
        Ok(profile.map(profile_metadata).filter(|meta| !is_empty(meta)))
    }

    async fn fetch_price_history(&self, ticker: &Ticker) -> Result<Vec<PriceBar>, ProviderError> {
        let prices = self.client.get_historical_eod_full(ticker.as_str()).await?;
        prices.iter().map(price_bar).collect()
    }
}

fn profile_metadata(profile: &CompanyProfile) -> CompanyMetadata {
    CompanyMetadata {
        company_name: non_blank(profile.company_name.as_deref()),
        sector: non_blank(profile.sector.as_deref()),
        industry: non_blank(profile.industry.as_deref()),
        market_cap: profile.market_cap,
    }
}

fn screener_row(entry: ScreenerEntry) -> Option<(Ticker, CompanyMetadata)> {
    let ticker = Ticker::parse(&entry.symbol).ok()?;
    let meta = CompanyMetadata {
        company_name: non_blank(entry.company_name.as_deref()),
        sector: non_blank(entry.sector.as_deref()),
        industry: non_blank(entry.industry.as_deref()),
        market_cap: entry.market_cap,
    };
    Some((ticker, meta))
}

fn price_bar(price: &HistoricalPrice) -> Result<PriceBar, ProviderError> {
    let fields = [
        ("open", price.open),
        ("high", price.high),
        ("low", price.low),
        ("close", price.close),
        ("volume", price.volume),
    ];
    for (name, value) in fields {
        if !value.is_finite() {
            return Err(ProviderError::Malformed(format!(
                "{} on {} is not a finite number",
                name, price.date
            )));
        }
    }
    if price.volume < 0.0 || price.volume > i64::MAX as f64 {
        return Err(ProviderError::Malformed(format!(
            "volume on {} is out of range: {}",
            price.date, price.volume
        )));
    }
    Ok(PriceBar {
        date: price.date,
        open: price.open,
        high: price.high,
        low: price.low,
        close: price.close,
        volume: price.volume.trunc() as i64,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn is_empty(meta: &CompanyMetadata) -> bool {
    meta.company_name.is_none()
        && meta.sector.is_none()
        && meta.industry.is_none()
        && meta.market_cap.is_none()
}
