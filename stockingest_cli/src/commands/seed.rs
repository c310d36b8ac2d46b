//! Builds the ticker universe from the FMP company screener or explicit symbols.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::Utc;
use clap::Args;
use stockingest_lib::entrypoint::normalize_symbols;
use stockingest_lib::fmp_api::ScreenerQuery;
use stockingest_lib::{CompanyMetadata, FmpProvider, Ticker};

use crate::commands::{fmp_client, open_db};
use crate::output::{print_json, print_seed_table, OutputFormat};

#[derive(Args)]
pub struct SeedArgs {
    /// SQLite database path
    #[arg(long, default_value = "stockingest.db")]
    pub db: PathBuf,

    /// Only screen companies in this sector (e.g. "Technology")
    #[arg(long)]
    pub sector: Option<String>,

    /// Maximum screener rows to request
    #[arg(long)]
    pub limit: Option<u32>,

    /// Minimum market cap in dollars
    #[arg(long)]
    pub min_market_cap: Option<i64>,

    /// Add this ticker as an empty row (repeatable). Skips the screener unless
    /// a screener filter is also given.
    #[arg(long = "ticker")]
    pub tickers: Vec<String>,
}

impl SeedArgs {
    fn wants_screener(&self) -> bool {
        self.tickers.is_empty()
            || self.sector.is_some()
            || self.limit.is_some()
            || self.min_market_cap.is_some()
    }

    fn screener_query(&self) -> ScreenerQuery {
        let mut query = ScreenerQuery::default();
        if let Some(sector) = &self.sector {
            query = query.with_sector(sector);
        }
        if let Some(limit) = self.limit {
            query = query.with_limit(limit);
        }
        if let Some(cap) = self.min_market_cap {
            query = query.with_market_cap_more_than(cap);
        }
        query
    }
}

pub async fn run(args: &SeedArgs, format: &OutputFormat) -> Result<()> {
    if args.limit == Some(0) {
        bail!("--limit must be a positive integer");
    }
    let db = open_db(&args.db)?;

    let explicit = normalize_symbols(args.tickers.as_slice());
    if explicit.len() < args.tickers.len() {
        eprintln!(
            "Ignored {} invalid or duplicate ticker(s)",
            args.tickers.len() - explicit.len()
        );
    }
    for ticker in &explicit {
        db.ensure_stock_row(ticker.as_str())?;
    }

    let mut seeded: Vec<(Ticker, CompanyMetadata)> = Vec::new();
    if args.wants_screener() {
        let provider = FmpProvider::new(fmp_client()?);
        let rows = provider.screener(&args.screener_query()).await?;
        let now = Utc::now();
        for (ticker, meta) in &rows {
            db.upsert_stock(ticker.as_str(), meta, now)?;
        }
        seeded = rows;
    }

    eprintln!(
        "Seeded {} screener tickers and {} explicit tickers into {}",
        seeded.len(),
        explicit.len(),
        args.db.display()
    );
    let mut listing = seeded;
    listing.extend(
        explicit
            .into_iter()
            .map(|ticker| (ticker, CompanyMetadata::default())),
    );
    match format {
        OutputFormat::Table => print_seed_table(&listing),
        OutputFormat::Json => print_json(&listing),
    }
    Ok(())
}
