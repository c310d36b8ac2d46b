//! Admin HTTP surface: health plus manual run triggers.
//!
//! Both triggers go through the shared `BatchRunEntrypoint`, so they observe
//! the same one-run-at-a-time gate as the scheduler and the CLI.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use stockingest_lib::{BatchReport, BatchRunEntrypoint, Ticker};
use tracing::{error, info};

pub fn router(entrypoint: Arc<BatchRunEntrypoint>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/admin/run-daily-sync", post(run_daily_sync))
        .route("/api/admin/sync/:symbol", post(sync_symbol))
        .with_state(entrypoint)
}

/// GET /health
async fn health(State(entrypoint): State<Arc<BatchRunEntrypoint>>) -> impl IntoResponse {
    let runner = entrypoint.runner();
    Json(json!({
        "status": "ok",
        "running": runner.is_running(),
        "in_flight": runner.in_flight(),
    }))
}

/// POST /api/admin/run-daily-sync
///
/// Runs the whole stored universe and answers when it finishes: 200 with the
/// report, or 409 if a run was already active.
async fn run_daily_sync(State(entrypoint): State<Arc<BatchRunEntrypoint>>) -> Response {
    info!("Admin trigger: run-daily-sync");
    // Spawned so a dropped connection does not cancel the run.
    let task = tokio::spawn(async move { entrypoint.run_universe().await });
    match task.await {
        Ok(Ok(report)) => report_response(report),
        Ok(Err(e)) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        Err(e) => {
            error!("Daily sync task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "run task failed")
        }
    }
}

/// POST /api/admin/sync/:symbol
async fn sync_symbol(
    State(entrypoint): State<Arc<BatchRunEntrypoint>>,
    Path(symbol): Path<String>,
) -> Response {
    let ticker = match Ticker::parse(&symbol) {
        Ok(ticker) => ticker,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    info!("Admin trigger: sync {}", ticker);
    let task = tokio::spawn(async move { entrypoint.run_tickers(vec![ticker]).await });
    match task.await {
        Ok(report) => report_response(report),
        Err(e) => {
            error!("Symbol sync task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "run task failed")
        }
    }
}

fn report_response(report: BatchReport) -> Response {
    let status = if report.is_skipped() {
        StatusCode::CONFLICT
    } else {
        StatusCode::OK
    };
    (status, Json(report)).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}
