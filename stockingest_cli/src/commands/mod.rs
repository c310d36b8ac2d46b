//! CLI subcommand implementations.

pub mod ingest;
pub mod seed;
pub mod serve;
pub mod tickers;

use std::path::Path;

use anyhow::{bail, Context, Result};
use stockingest_lib::fmp_api::{self, Client};
use stockingest_lib::Db;

/// Opens (creating if needed) and migrates the SQLite database.
pub(crate) fn open_db(path: &Path) -> Result<Db> {
    let db = Db::open(path).with_context(|| format!("opening database {}", path.display()))?;
    db.init()?;
    Ok(db)
}

/// Builds the FMP client from `FMP_API_KEY`, honoring `FMP_BASE_URL` when set.
pub(crate) fn fmp_client() -> Result<Client> {
    let key = std::env::var("FMP_API_KEY").unwrap_or_default();
    let client = match std::env::var("FMP_BASE_URL").ok() {
        Some(url) => Client::with_base_url(&url, &key),
        None => Client::new(&key),
    };
    match client {
        Ok(client) => Ok(client),
        Err(fmp_api::Error::InvalidApiKey) => bail!(
            "FMP_API_KEY is missing or still the placeholder. Set it in the environment or in .env"
        ),
        Err(e) => Err(e.into()),
    }
}
