//! Error types for the ingestion pipeline.

use thiserror::Error;

use crate::db::DbError;
use crate::provider::ProviderError;

/// Errors produced while ingesting a ticker or wiring up the pipeline.
///
/// Everything that happens inside a single ticker's ingestion ends up in
/// that ticker's `Outcome`; none of these abort a run.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("Store error: {0}")]
    Store(#[from] DbError),
    #[error("Provider returned no price history")]
    EmptyHistory,
    #[error("Ingestion task panicked: {0}")]
    WorkerPanicked(String),
    #[error("Worker pool is closed")]
    PoolClosed,
    #[error("Invalid configuration: {0}")]
    Config(String),
}
