//! Shared pacing for provider requests.
//!
//! A single `RateLimiter` is built at startup and shared by every worker, so
//! the configured rate bounds the whole process rather than each worker.
//! Permits are handed out on a fixed interval (`1 / rate`) instead of in
//! bursts: two grants are never closer together than one interval.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

use crate::error::IngestError;

/// Slowest accepted rate: one request every 1000 seconds.
pub const MIN_RATE_PER_SECOND: f64 = 0.001;

/// Fixed-interval limiter. `acquire()` reserves the next free slot under a
/// tokio Mutex, drops the lock, then sleeps until that slot arrives.
pub struct RateLimiter {
    next_slot: Mutex<Option<Instant>>,
    interval: Duration,
    rate_per_second: f64,
    tracker: RequestTracker,
}

impl RateLimiter {
    /// Create a limiter granting `rate_per_second` permits per second.
    pub fn new(rate_per_second: f64) -> Result<Self, IngestError> {
        if !(rate_per_second.is_finite() && rate_per_second >= MIN_RATE_PER_SECOND) {
            return Err(IngestError::Config(format!(
                "rate must be at least {} requests per second, got {}",
                MIN_RATE_PER_SECOND, rate_per_second
            )));
        }
        let interval = Duration::try_from_secs_f64(1.0 / rate_per_second).map_err(|e| {
            IngestError::Config(format!("rate {} gives no usable interval: {}", rate_per_second, e))
        })?;
        Ok(Self {
            next_slot: Mutex::new(None),
            interval,
            rate_per_second,
            tracker: RequestTracker::new(),
        })
    }

    /// Wait until this caller may issue one request.
    ///
    /// Callers are served in the order they reserve slots. The first call on
    /// an idle limiter returns immediately.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.interval);
            slot
        };
        sleep_until(slot).await;
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    pub fn rate_per_second(&self) -> f64 {
        self.rate_per_second
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Atomic counters tracking provider request outcomes.
pub struct RequestTracker {
    pub(crate) requests_made: AtomicU64,
    pub(crate) requests_succeeded: AtomicU64,
    pub(crate) requests_rate_limited: AtomicU64,
    pub(crate) requests_failed: AtomicU64,
}

impl RequestTracker {
    fn new() -> Self {
        Self {
            requests_made: AtomicU64::new(0),
            requests_succeeded: AtomicU64::new(0),
            requests_rate_limited: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
        }
    }

    pub fn record_success(&self) {
        self.requests_made.fetch_add(1, Ordering::Relaxed);
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.requests_made.fetch_add(1, Ordering::Relaxed);
        self.requests_rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_made.fetch_add(1, Ordering::Relaxed);
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the current counters.
    pub fn summary(&self) -> TrackerSummary {
        TrackerSummary {
            requests_made: self.requests_made.load(Ordering::Relaxed),
            requests_succeeded: self.requests_succeeded.load(Ordering::Relaxed),
            requests_rate_limited: self.requests_rate_limited.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot of tracker counters for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackerSummary {
    pub requests_made: u64,
    pub requests_succeeded: u64,
    pub requests_rate_limited: u64,
    pub requests_failed: u64,
}
