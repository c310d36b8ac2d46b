//! Manual "run now" over the stored universe or an explicit ticker list.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use stockingest_lib::{
    BatchReport, BatchRunEntrypoint, BatchRunner, FmpProvider, PipelineConfig, Shutdown, SqliteStore,
};

use crate::commands::{fmp_client, open_db};
use crate::output::{print_json, print_report_table, OutputFormat};

/// Pipeline sizing flags. Unset flags fall back to `STOCKINGEST_*` env vars, then defaults.
#[derive(Args, Clone, Debug, Default)]
pub struct PipelineArgs {
    /// Provider requests per second across all workers
    #[arg(long)]
    pub rate: Option<f64>,

    /// Worker pool size
    #[arg(long)]
    pub workers: Option<usize>,

    /// Maximum tickers admitted at once
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Days before stored company metadata is refetched
    #[arg(long)]
    pub staleness_days: Option<i64>,
}

impl PipelineArgs {
    pub fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::from_env();
        if let Some(rate) = self.rate {
            config.rate_per_second = rate;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(max_in_flight) = self.max_in_flight {
            config.max_in_flight = max_in_flight;
        }
        if let Some(days) = self.staleness_days {
            config.staleness_days = days;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args)]
pub struct IngestArgs {
    /// SQLite database path
    #[arg(long, default_value = "stockingest.db")]
    pub db: PathBuf,

    /// Ticker to ingest (repeatable). Defaults to every stored ticker.
    #[arg(long = "ticker")]
    pub tickers: Vec<String>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

pub async fn run(args: &IngestArgs, format: &OutputFormat) -> Result<()> {
    let config = args.pipeline.resolve()?;
    let store = Arc::new(SqliteStore::new(open_db(&args.db)?));
    let provider = Arc::new(FmpProvider::new(fmp_client()?));
    let runner = Arc::new(BatchRunner::from_config(provider, store.clone(), &config)?);

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Interrupt received; finishing tickers already in flight");
                shutdown.trigger();
            }
        });
    }

    let entry = BatchRunEntrypoint::new(runner, store, shutdown);
    eprintln!(
        "Ingesting into {} ({} req/s, {} workers, {} in flight)",
        args.db.display(),
        config.rate_per_second,
        config.workers,
        config.max_in_flight
    );
    let report = if args.tickers.is_empty() {
        entry.run_universe().await?
    } else {
        entry.run_symbols(args.tickers.as_slice()).await
    };

    match format {
        OutputFormat::Table => print_report_table(&report),
        OutputFormat::Json => print_json(&report),
    }
    if let BatchReport::Interrupted { .. } = report {
        eprintln!("Run interrupted before every ticker was admitted");
    }
    Ok(())
}
