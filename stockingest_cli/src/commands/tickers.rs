use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::commands::open_db;
use crate::output::{print_json, print_stocks_table, OutputFormat};

#[derive(Args)]
pub struct TickersArgs {
    /// SQLite database path
    #[arg(long, default_value = "stockingest.db")]
    pub db: PathBuf,

    /// Only show tickers in this sector
    #[arg(long)]
    pub sector: Option<String>,
}

pub fn run(args: &TickersArgs, format: &OutputFormat) -> Result<()> {
    let db = open_db(&args.db)?;
    let mut stocks = db.list_stocks()?;
    if let Some(sector) = &args.sector {
        stocks.retain(|s| {
            s.sector
                .as_deref()
                .is_some_and(|v| v.eq_ignore_ascii_case(sector))
        });
    }
    if let Some(last_run) = db.get_meta("last_run_finished_at")? {
        eprintln!("{} tickers, last run finished {} UTC", stocks.len(), last_run);
    } else {
        eprintln!("{} tickers, no completed runs yet", stocks.len());
    }
    match format {
        OutputFormat::Table => print_stocks_table(&stocks),
        OutputFormat::Json => print_json(&stocks),
    }
    Ok(())
}
