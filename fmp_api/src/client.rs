//! HTTP client for the FMP stable API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    query::{Query, ScreenerQuery, SymbolQuery},
    types::{CompanyProfile, HistoricalPrice, ScreenerEntry},
    Error,
};

/// Production base URL for the FMP stable API.
pub const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com/stable";

/// Placeholder shipped in sample `.env` files; treated as a missing key.
const PLACEHOLDER_API_KEY: &str = "YOUR_FMP_API_KEY";

/// Request timeout for FMP calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the FMP stable API.
///
/// One `reqwest::Client` is built at construction and reused, so connection
/// pooling is shared by every worker that holds this client.
pub struct Client {
    http: reqwest::Client,
    /// Base URL for the API. Defaults to [`DEFAULT_BASE_URL`].
    base_api_url: String,
    api_key: String,
}

impl Client {
    /// Creates a client pointing at the production API.
    ///
    /// Fails with [`Error::InvalidApiKey`] if the key is blank or the sample placeholder.
    pub fn new(api_key: &str) -> Result<Self, Error> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self, Error> {
        let api_key = api_key.trim();
        if api_key.is_empty() || api_key == PLACEHOLDER_API_KEY {
            tracing::warn!("FMP API key is invalid or not configured");
            return Err(Error::InvalidApiKey);
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            http,
            base_api_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn get_url(&self, path: &str, query: &impl Query) -> Result<Url, Error> {
        let url = Url::parse(format!("{}{}", &self.base_api_url, path).as_str()).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        let mut url = query.add_to_url(&url);
        url.query_pairs_mut().append_pair("apikey", &self.api_key);
        Ok(url)
    }

    async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T, Error>
    where
        T: DeserializeOwned,
        Q: Query,
    {
        let url = self.get_url(path, query)?;
        let resp = self
            .http
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                // reqwest includes the URL (and so the api key) in its Display output
                tracing::error!("Failed to get {}: {}", path, e.without_url());
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e.without_url());
            Error::RequestFailed
        })?;

        match status.as_u16() {
            401 | 403 => return Err(Error::InvalidApiKey),
            429 => return Err(Error::RateLimited),
            _ => {}
        }

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request to {} failed with status {}: {}", path, status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        if let Some(message) = error_message(&body) {
            tracing::error!("FMP returned an error for {}: {}", path, message);
            return Err(Error::ApiMessage(message));
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse {}: {} | body: {}", path, e, snippet);
            Error::ParseFailed(e.to_string())
        })
    }

    /// Fetches the company profile for a symbol. FMP wraps it in an array,
    /// which is empty for unknown symbols.
    pub async fn get_company_profile(&self, symbol: &str) -> Result<Vec<CompanyProfile>, Error> {
        self.get("/profile", &SymbolQuery::new(symbol)).await
    }

    /// Fetches the full end-of-day history for a symbol.
    pub async fn get_historical_eod_full(
        &self,
        symbol: &str,
    ) -> Result<Vec<HistoricalPrice>, Error> {
        self.get("/historical-price-eod/full", &SymbolQuery::new(symbol))
            .await
    }

    /// Runs the company screener.
    pub async fn get_company_screener(
        &self,
        query: &ScreenerQuery,
    ) -> Result<Vec<ScreenerEntry>, Error> {
        self.get("/company-screener", query).await
    }
}

/// FMP reports some failures (bad key, plan limits) as a 200 with a JSON object.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim_start();
    if !trimmed.starts_with('{') {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
    value
        .get("Error Message")
        .or_else(|| value.get("error"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_and_placeholder_keys() {
        assert!(matches!(Client::new(""), Err(Error::InvalidApiKey)));
        assert!(matches!(Client::new("   "), Err(Error::InvalidApiKey)));
        assert!(matches!(
            Client::new("YOUR_FMP_API_KEY"),
            Err(Error::InvalidApiKey)
        ));
        assert!(Client::new("real-key").is_ok());
    }

    #[test]
    fn url_carries_symbol_and_key() {
        let client = Client::with_base_url("http://localhost:1234/", "k1").unwrap();
        let url = client.get_url("/profile", &SymbolQuery::new("AAPL")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:1234/profile?symbol=AAPL&apikey=k1");
    }

    #[test]
    fn error_message_detection() {
        assert_eq!(
            error_message(r#"{"Error Message": "Invalid API KEY."}"#),
            Some("Invalid API KEY.".to_string())
        );
        assert_eq!(error_message("[]"), None);
        assert_eq!(error_message(r#"{"symbol": "AAPL"}"#), None);
    }

    #[test]
    fn truncate_long_body() {
        let body = "x".repeat(2500);
        let out = truncate_body(&body);
        assert!(out.ends_with("...[truncated]"));
        assert_eq!(out.len(), 2000 + "...[truncated]".len());
    }
}
