//! Long-running daemon: weekday scheduler plus the admin HTTP endpoint,
//! both driving one shared runner.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use stockingest_lib::config::{parse_time_of_day, parse_timezone};
use stockingest_lib::{
    BatchRunEntrypoint, BatchRunner, FmpProvider, ScheduleConfig, Scheduler, Shutdown, SqliteStore,
};
use tracing::info;

use crate::commands::ingest::PipelineArgs;
use crate::commands::{fmp_client, open_db};
use crate::server;

#[derive(Args)]
pub struct ServeArgs {
    /// SQLite database path
    #[arg(long, default_value = "stockingest.db")]
    pub db: PathBuf,

    /// Address for the admin HTTP endpoint
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Disable the weekday scheduler (HTTP triggers only)
    #[arg(long)]
    pub no_schedule: bool,

    /// Local time of the weekday run, HH:MM (overrides STOCKINGEST_SCHEDULE_AT)
    #[arg(long)]
    pub at: Option<String>,

    /// IANA timezone of the weekday run (overrides STOCKINGEST_SCHEDULE_TZ)
    #[arg(long)]
    pub tz: Option<String>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

impl ServeArgs {
    fn schedule(&self) -> Result<ScheduleConfig> {
        let mut schedule = ScheduleConfig::from_env()?;
        if let Some(at) = &self.at {
            schedule.at = parse_time_of_day(at)?;
        }
        if let Some(tz) = &self.tz {
            schedule.timezone = parse_timezone(tz)?;
        }
        Ok(schedule)
    }
}

pub async fn run(args: &ServeArgs) -> Result<()> {
    let config = args.pipeline.resolve()?;
    let schedule = args.schedule()?;

    let store = Arc::new(SqliteStore::new(open_db(&args.db)?));
    let provider = Arc::new(FmpProvider::new(fmp_client()?));
    let runner = Arc::new(BatchRunner::from_config(provider, store.clone(), &config)?);
    let shutdown = Shutdown::new();
    let entrypoint = Arc::new(BatchRunEntrypoint::new(runner, store, shutdown.clone()));

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, shutting down");
                shutdown.trigger();
            }
        });
    }

    let scheduler = if args.no_schedule {
        info!("Scheduler disabled; runs start only from the admin endpoint");
        None
    } else {
        let scheduler = Scheduler::new(Arc::clone(&entrypoint), schedule);
        Some(tokio::spawn(scheduler.run()))
    };

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("binding admin endpoint to {}", args.bind))?;
    info!("Admin endpoint listening on http://{}", args.bind);

    let app = server::router(Arc::clone(&entrypoint));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.triggered().await })
        .await?;

    if let Some(handle) = scheduler {
        handle.await?;
    }
    info!("Stopped");
    Ok(())
}
