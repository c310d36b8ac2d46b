//! Bounded fan-out of tickers onto a fixed worker pool.
//!
//! A `BatchRunner` owns the worker pool and the admission semaphore for the
//! lifetime of the process. Each `run` admits tickers in input order, holding
//! one semaphore slot per ticker from submission until its outcome has been
//! queued, so at most `max_in_flight` tickers are admitted at any instant and
//! unread outcomes never exceed the same bound. Only one run is active at a
//! time; a second caller gets `RunOutcome::Skipped`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

use crate::config::{PipelineConfig, MAX_IN_FLIGHT, MAX_WORKERS};
use crate::error::IngestError;
use crate::provider::MarketDataProvider;
use crate::rate_limiter::RateLimiter;
use crate::shutdown::Shutdown;
use crate::store::PriceStore;
use crate::ticker::Ticker;
use crate::worker::{Ingestor, Outcome};

/// Log a progress line every this many completions.
pub const PROGRESS_EVERY: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub submitted: usize,
    pub completed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.completed - self.failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunSummary),
    /// Shutdown stopped admissions; everything admitted still finished.
    Cancelled(RunSummary),
    /// Another run was active. No work was done.
    Skipped,
}

struct Job {
    ticker: Ticker,
    permit: OwnedSemaphorePermit,
    reply: mpsc::Sender<Outcome>,
}

struct WorkerPool {
    queue: mpsc::Sender<Job>,
    _workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    fn start(workers: usize, queue_capacity: usize, ingestor: Arc<Ingestor>) -> Self {
        let (queue, rx) = mpsc::channel::<Job>(queue_capacity);
        let rx = Arc::new(Mutex::new(rx));
        let handles = (0..workers)
            .map(|id| tokio::spawn(worker_loop(id, Arc::clone(&rx), Arc::clone(&ingestor))))
            .collect();
        Self {
            queue,
            _workers: handles,
        }
    }
}

async fn worker_loop(id: usize, jobs: Arc<Mutex<mpsc::Receiver<Job>>>, ingestor: Arc<Ingestor>) {
    loop {
        let job = jobs.lock().await.recv().await;
        let Some(Job {
            ticker,
            permit,
            reply,
        }) = job
        else {
            break;
        };

        // Own task so a panic inside ingestion fails this ticker only.
        let task = {
            let ingestor = Arc::clone(&ingestor);
            let ticker = ticker.clone();
            tokio::spawn(async move { ingestor.ingest(ticker).await })
        };
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Ingestion task for {} aborted: {}", ticker, e);
                Outcome {
                    ticker,
                    result: Err(IngestError::WorkerPanicked(e.to_string())),
                }
            }
        };

        if reply.send(outcome).await.is_err() {
            tracing::debug!("Worker {}: run no longer collecting outcomes", id);
        }
        drop(permit);
    }
    tracing::debug!("Worker {} stopped", id);
}

/// Clears the running flag on every exit path.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct BatchRunner {
    ingestor: Arc<Ingestor>,
    pool: WorkerPool,
    slots: Arc<Semaphore>,
    max_in_flight: usize,
    running: AtomicBool,
}

impl BatchRunner {
    /// Starts `workers` pool tasks, so this must be called inside a tokio runtime.
    pub fn new(
        ingestor: Arc<Ingestor>,
        workers: usize,
        max_in_flight: usize,
    ) -> Result<Self, IngestError> {
        if !(1..=MAX_WORKERS).contains(&workers) || !(1..=MAX_IN_FLIGHT).contains(&max_in_flight) {
            return Err(IngestError::Config(format!(
                "workers ({}) must be in 1..={} and max_in_flight ({}) in 1..={}",
                workers, MAX_WORKERS, max_in_flight, MAX_IN_FLIGHT
            )));
        }
        let pool = WorkerPool::start(workers, max_in_flight, Arc::clone(&ingestor));
        Ok(Self {
            ingestor,
            pool,
            slots: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            running: AtomicBool::new(false),
        })
    }

    /// Builds the limiter, ingestor and pool from one validated config.
    pub fn from_config(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<dyn PriceStore>,
        config: &PipelineConfig,
    ) -> Result<Self, IngestError> {
        config.validate()?;
        let limiter = Arc::new(RateLimiter::new(config.rate_per_second)?);
        let ingestor = Arc::new(Ingestor::new(provider, store, limiter, config.staleness()));
        Self::new(ingestor, config.workers, config.max_in_flight)
    }

    pub fn ingestor(&self) -> &Arc<Ingestor> {
        &self.ingestor
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Tickers currently admitted and not yet completed.
    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.slots.available_permits()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Ingest `symbols`, completing in any order. Stops admitting new tickers
    /// once `shutdown` fires but waits for everything already admitted.
    pub async fn run(&self, symbols: Vec<Ticker>, shutdown: &Shutdown) -> RunOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!("Ingestion run already in progress, skipping");
            return RunOutcome::Skipped;
        }
        let _guard = RunningGuard(&self.running);

        let total = symbols.len();
        tracing::info!(
            "Starting ingestion run: {} tickers, max {} in flight",
            total,
            self.max_in_flight
        );

        let (tx, mut rx) = mpsc::channel::<Outcome>(self.max_in_flight);
        let mut summary = RunSummary::default();
        let mut cancelled = false;

        'submit: for ticker in symbols {
            let permit = loop {
                tokio::select! {
                    biased;
                    _ = shutdown.triggered() => {
                        cancelled = true;
                        break 'submit;
                    }
                    Some(outcome) = rx.recv() => record(&mut summary, total, outcome),
                    permit = Arc::clone(&self.slots).acquire_owned() => match permit {
                        Ok(permit) => break permit,
                        Err(_) => {
                            tracing::error!("Admission semaphore closed, stopping submissions");
                            break 'submit;
                        }
                    },
                }
            };

            let job = Job {
                ticker,
                permit,
                reply: tx.clone(),
            };
            summary.submitted += 1;
            if let Err(err) = self.pool.queue.send(job).await {
                let ticker = err.0.ticker;
                tracing::error!("Worker pool closed, could not submit {}", ticker);
                record(
                    &mut summary,
                    total,
                    Outcome {
                        ticker,
                        result: Err(IngestError::PoolClosed),
                    },
                );
                break;
            }

            while let Ok(outcome) = rx.try_recv() {
                record(&mut summary, total, outcome);
            }
        }

        if cancelled {
            tracing::warn!(
                "Shutdown requested, waiting for {} admitted tickers",
                summary.submitted - summary.completed
            );
        }

        drop(tx);
        while summary.completed < summary.submitted {
            match rx.recv().await {
                Some(outcome) => record(&mut summary, total, outcome),
                None => break,
            }
        }

        let stats = self.ingestor.limiter().tracker().summary();
        tracing::info!(
            "Ingestion run finished: {} submitted, {} completed, {} failed (provider requests so far: {} made, {} ok, {} failed, {} rate limited)",
            summary.submitted,
            summary.completed,
            summary.failed,
            stats.requests_made,
            stats.requests_succeeded,
            stats.requests_failed,
            stats.requests_rate_limited
        );

        if cancelled {
            RunOutcome::Cancelled(summary)
        } else {
            RunOutcome::Completed(summary)
        }
    }
}

fn record(summary: &mut RunSummary, total: usize, outcome: Outcome) {
    summary.completed += 1;
    if !outcome.is_ok() {
        summary.failed += 1;
    }
    if summary.completed % PROGRESS_EVERY == 0 {
        tracing::info!(
            "Progress: {}/{} tickers ({} failed)",
            summary.completed,
            total,
            summary.failed
        );
    }
}
