//! Weekday wall-clock trigger for the batch run.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::config::ScheduleConfig;
use crate::entrypoint::{BatchReport, BatchRunEntrypoint};

/// Next Monday-to-Friday instant strictly after `now` at local time `at` in `tz`.
///
/// Local times that do not exist on a given day (DST spring-forward gap) skip
/// to the next weekday. Ambiguous local times take the earlier instant.
pub fn next_weekday_run(now: DateTime<Utc>, at: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let today = now.with_timezone(&tz).date_naive();
    for date in today.iter_days().take(8) {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        let Some(local) = tz.from_local_datetime(&date.and_time(at)).earliest() else {
            continue;
        };
        let candidate = local.with_timezone(&Utc);
        if candidate > now {
            return candidate;
        }
    }
    now + chrono::Duration::days(1)
}

/// Sleeps until the next scheduled slot, runs the stored universe, repeats.
/// Exits when the entrypoint's shutdown signal fires.
pub struct Scheduler {
    entrypoint: Arc<BatchRunEntrypoint>,
    config: ScheduleConfig,
}

impl Scheduler {
    pub fn new(entrypoint: Arc<BatchRunEntrypoint>, config: ScheduleConfig) -> Self {
        Self { entrypoint, config }
    }

    pub async fn run(self) {
        let shutdown = self.entrypoint.shutdown().clone();
        let tz = self.config.timezone;
        tracing::info!(
            "Scheduler started: weekdays at {} {}",
            self.config.at.format("%H:%M"),
            tz
        );

        loop {
            let now = Utc::now();
            let next = next_weekday_run(now, self.config.at, tz);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tracing::info!(
                "Next scheduled run at {} (in {}h {}m)",
                next.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z"),
                wait.as_secs() / 3600,
                (wait.as_secs() % 3600) / 60
            );

            tokio::select! {
                _ = shutdown.triggered() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            tracing::info!("Scheduled ingestion run starting");
            match self.entrypoint.run_universe().await {
                Ok(BatchReport::Skipped) => {
                    tracing::info!("Scheduled run skipped: a run is already in progress")
                }
                Ok(report) => tracing::info!("Scheduled run finished: {:?}", report),
                Err(e) => tracing::error!("Scheduled run could not start: {}", e),
            }
        }
        tracing::info!("Scheduler stopped");
    }
}
