//! Shared query infrastructure: the [`Query`] trait and the per-symbol query.

use url::Url;

/// Trait implemented by all query builders. Serializes the builder's
/// parameters onto an endpoint URL.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;
}

/// Query for endpoints keyed by a single symbol (`profile`, `historical-price-eod/full`).
#[derive(Clone, Debug)]
pub struct SymbolQuery {
    pub symbol: String,
}

impl SymbolQuery {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.trim().to_string(),
        }
    }
}

impl Query for SymbolQuery {
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut().append_pair("symbol", &self.symbol);
        url
    }
}
