//! Pipeline and schedule settings, read from the environment with defaults.

use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::error::IngestError;
use crate::rate_limiter::MIN_RATE_PER_SECOND;

pub const DEFAULT_RATE_PER_SECOND: f64 = 3.0;
pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;
pub const DEFAULT_STALENESS_DAYS: i64 = 7;

pub const MAX_WORKERS: usize = 1_024;
pub const MAX_IN_FLIGHT: usize = 100_000;
/// About a century.
pub const MAX_STALENESS_DAYS: i64 = 36_500;

/// Default weekday trigger: 18:30 New York time, after the US close settles.
pub const DEFAULT_SCHEDULE_AT: &str = "18:30";
pub const DEFAULT_SCHEDULE_TZ: Tz = chrono_tz::America::New_York;

/// Sizing for the ingestion pipeline. Built once at startup; the limiter and
/// worker pool created from it live for the whole process.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Aggregate provider requests per second across all workers.
    pub rate_per_second: f64,
    /// Size of the fixed worker pool.
    pub workers: usize,
    /// Admission slots: symbols submitted but not yet completed.
    pub max_in_flight: usize,
    /// Age after which stored company metadata is refetched.
    pub staleness_days: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rate_per_second: DEFAULT_RATE_PER_SECOND,
            workers: DEFAULT_WORKERS,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            staleness_days: DEFAULT_STALENESS_DAYS,
        }
    }
}

impl PipelineConfig {
    /// Reads `STOCKINGEST_RATE_PER_SEC`, `STOCKINGEST_WORKERS`,
    /// `STOCKINGEST_MAX_IN_FLIGHT` and `STOCKINGEST_STALENESS_DAYS`.
    /// Missing or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            rate_per_second: parse_or(&lookup, "STOCKINGEST_RATE_PER_SEC", DEFAULT_RATE_PER_SECOND),
            workers: parse_or(&lookup, "STOCKINGEST_WORKERS", DEFAULT_WORKERS),
            max_in_flight: parse_or(&lookup, "STOCKINGEST_MAX_IN_FLIGHT", DEFAULT_MAX_IN_FLIGHT),
            staleness_days: parse_or(&lookup, "STOCKINGEST_STALENESS_DAYS", DEFAULT_STALENESS_DAYS),
        }
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if !(self.rate_per_second.is_finite() && self.rate_per_second >= MIN_RATE_PER_SECOND) {
            return Err(IngestError::Config(format!(
                "rate_per_second must be at least {}, got {}",
                MIN_RATE_PER_SECOND, self.rate_per_second
            )));
        }
        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(IngestError::Config(format!(
                "workers must be between 1 and {}, got {}",
                MAX_WORKERS, self.workers
            )));
        }
        if !(1..=MAX_IN_FLIGHT).contains(&self.max_in_flight) {
            return Err(IngestError::Config(format!(
                "max_in_flight must be between 1 and {}, got {}",
                MAX_IN_FLIGHT, self.max_in_flight
            )));
        }
        if !(0..=MAX_STALENESS_DAYS).contains(&self.staleness_days) {
            return Err(IngestError::Config(format!(
                "staleness_days must be between 0 and {}, got {}",
                MAX_STALENESS_DAYS, self.staleness_days
            )));
        }
        Ok(())
    }

    pub fn staleness(&self) -> chrono::Duration {
        chrono::Duration::days(self.staleness_days)
    }
}

/// When the periodic trigger fires: Monday to Friday at `at`, local to `timezone`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleConfig {
    pub at: NaiveTime,
    pub timezone: Tz,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            at: NaiveTime::from_hms_opt(18, 30, 0).unwrap_or_default(),
            timezone: DEFAULT_SCHEDULE_TZ,
        }
    }
}

impl ScheduleConfig {
    /// Reads `STOCKINGEST_SCHEDULE_AT` (`HH:MM`) and `STOCKINGEST_SCHEDULE_TZ` (IANA name).
    pub fn from_env() -> Result<Self, IngestError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, IngestError> {
        let at = lookup("STOCKINGEST_SCHEDULE_AT").unwrap_or_else(|| DEFAULT_SCHEDULE_AT.to_string());
        let timezone = match lookup("STOCKINGEST_SCHEDULE_TZ") {
            Some(name) => parse_timezone(&name)?,
            None => DEFAULT_SCHEDULE_TZ,
        };
        Ok(Self {
            at: parse_time_of_day(&at)?,
            timezone,
        })
    }
}

pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, IngestError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| IngestError::Config(format!("invalid time of day {:?}: {}", value, e)))
}

pub fn parse_timezone(value: &str) -> Result<Tz, IngestError> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|e| IngestError::Config(format!("invalid timezone {:?}: {}", value, e)))
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|val| val.trim().parse::<T>().ok())
        .unwrap_or(default)
}
