//! HTTP API: Axum router over a [`LedgerStore`].
//!
//! All endpoints speak JSON. Settlement and aggregation happen in
//! `engine`; handlers load records, call the engine and persist results.

pub mod accounts;
pub mod bets;
pub mod error;
pub mod reports;

use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::ServerConfig;
use crate::storage::LedgerStore;
use crate::types::DateWindow;
use error::{ApiError, ApiResult};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct ApiState {
    pub ledger: Arc<dyn LedgerStore>,
}

pub type AppState = Arc<ApiState>;

impl ApiState {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> AppState {
        Arc::new(Self { ledger })
    }
}

/// Turn optional `start`/`end` query bounds into a window.
/// A missing bound leaves that side open.
pub(crate) fn date_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ApiResult<Option<DateWindow>> {
    if start.is_none() && end.is_none() {
        return Ok(None);
    }
    // Dates are compared as ISO strings in storage, so keep both bounds
    // inside four-digit years.
    let start = start.or(NaiveDate::from_ymd_opt(1, 1, 1));
    let end = end.or(NaiveDate::from_ymd_opt(9999, 12, 31));
    match (start, end) {
        (Some(start), Some(end)) => DateWindow::new(start, end)
            .map(Some)
            .map_err(|e| ApiError::bad_request(e.to_string())),
        _ => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        // Accounts
        .route(
            "/api/bookmakers",
            post(accounts::create_bookmaker).get(accounts::list_bookmakers),
        )
        .route("/api/bookmakers/:id", get(accounts::get_bookmaker))
        .route(
            "/api/transactions",
            post(accounts::create_transaction).get(accounts::list_transactions),
        )
        .route("/api/transactions/:id", delete(accounts::delete_transaction))
        .route(
            "/api/freebets",
            post(accounts::create_freebet).get(accounts::list_freebets),
        )
        .route("/api/freebets/:id/status", post(accounts::set_freebet_status))
        // Bets
        .route("/api/bets", post(bets::create_bet).get(bets::list_bets))
        .route(
            "/api/bets/:id",
            get(bets::get_bet).patch(bets::amend_bet).delete(bets::delete_bet),
        )
        .route("/api/bets/:id/settle", post(bets::settle_bet))
        // Reports
        .route("/api/reports/balances", get(reports::balances))
        .route("/api/reports/balances/:id", get(reports::bookmaker_balance))
        .route("/api/reports/period-balance", get(reports::period_balance))
        .route("/api/reports/performance", get(reports::performance))
        .route("/api/reports/profit", get(reports::profit))
        .route("/api/reports/deposits", get(reports::deposits))
        .route("/api/reports/withdrawals", get(reports::withdrawals))
        .route("/api/reports/cashflow", get(reports::cashflow_report))
        .route(
            "/api/reports/freebets/conversion",
            get(reports::freebet_conversion),
        )
        .route("/api/reports/freebets/summary", get(reports::freebet_summary))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(state: AppState, config: &ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Ledger API listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
