//! Bookmaker, transaction and freebet handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::info;

use super::bets::require_bookmaker;
use super::error::{ApiError, ApiResult};
use super::{date_window, AppState};
use crate::engine::money::MAX_AMOUNT;
use crate::types::{
    Bookmaker, BookmakerId, Freebet, FreebetFilter, FreebetStatus, NewBookmaker, NewFreebet,
    NewTransaction, Transaction, TransactionFilter, TransactionType,
};

const MAX_COMMISSION: Decimal = dec!(100);

fn require_amount(field: &str, amount: Decimal) -> ApiResult<()> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::bad_request(format!("{field} must be positive, got {amount}")));
    }
    if amount > MAX_AMOUNT {
        return Err(ApiError::bad_request(format!(
            "{field} must not exceed {MAX_AMOUNT}, got {amount}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Bookmakers
// ---------------------------------------------------------------------------

/// POST /api/bookmakers
pub async fn create_bookmaker(
    State(state): State<AppState>,
    payload: Result<Json<NewBookmaker>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Bookmaker>)> {
    let Json(new) = payload?;
    if new.name.trim().is_empty() {
        return Err(ApiError::bad_request("Bookmaker name must not be empty"));
    }
    if new.commission < Decimal::ZERO || new.commission > MAX_COMMISSION {
        return Err(ApiError::bad_request(format!(
            "Commission must be between 0 and 100, got {}",
            new.commission
        )));
    }
    if new.initial_balance.abs() > MAX_AMOUNT {
        return Err(ApiError::bad_request(format!(
            "Initial balance must not exceed {MAX_AMOUNT} in magnitude, got {}",
            new.initial_balance
        )));
    }

    let bookmaker = state.ledger.insert_bookmaker(&new).await?;
    info!(bookmaker_id = bookmaker.id, name = %bookmaker.name, "Bookmaker created");
    Ok((StatusCode::CREATED, Json(bookmaker)))
}

/// GET /api/bookmakers
pub async fn list_bookmakers(State(state): State<AppState>) -> ApiResult<Json<Vec<Bookmaker>>> {
    Ok(Json(state.ledger.bookmakers().await?))
}

/// GET /api/bookmakers/:id
pub async fn get_bookmaker(
    State(state): State<AppState>,
    id: Result<Path<BookmakerId>, PathRejection>,
) -> ApiResult<Json<Bookmaker>> {
    let Path(id) = id?;
    Ok(Json(require_bookmaker(&state, id).await?))
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub bookmaker: Option<BookmakerId>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// POST /api/transactions
pub async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let Json(new) = payload?;
    require_amount("Amount", new.amount)?;
    require_bookmaker(&state, new.bookmaker_id).await?;

    let tx = state.ledger.insert_transaction(&new).await?;
    info!(
        transaction_id = tx.id,
        bookmaker_id = tx.bookmaker_id,
        kind = %tx.kind,
        amount = %tx.amount,
        "Transaction recorded"
    );
    Ok((StatusCode::CREATED, Json(tx)))
}

/// GET /api/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let Query(query) = query?;
    let filter = TransactionFilter {
        bookmaker_id: query.bookmaker,
        kind: query.kind,
        window: date_window(query.start, query.end)?,
    };
    Ok(Json(state.ledger.transactions(&filter).await?))
}

/// DELETE /api/transactions/:id
pub async fn delete_transaction(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    if !state.ledger.delete_transaction(id).await? {
        return Err(ApiError::not_found(format!("Transaction {id} not found")));
    }
    info!(transaction_id = id, "Transaction deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Freebets
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct FreebetQuery {
    pub bookmaker: Option<BookmakerId>,
    pub status: Option<FreebetStatus>,
}

#[derive(Debug, Deserialize)]
pub struct FreebetStatusRequest {
    pub status: FreebetStatus,
}

/// POST /api/freebets
pub async fn create_freebet(
    State(state): State<AppState>,
    payload: Result<Json<NewFreebet>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Freebet>)> {
    let Json(new) = payload?;
    require_amount("Amount", new.amount)?;
    require_bookmaker(&state, new.bookmaker_id).await?;

    let freebet = state.ledger.insert_freebet(&new).await?;
    info!(
        freebet_id = freebet.id,
        bookmaker_id = freebet.bookmaker_id,
        amount = %freebet.amount,
        status = %freebet.status,
        "Freebet recorded"
    );
    Ok((StatusCode::CREATED, Json(freebet)))
}

/// GET /api/freebets
pub async fn list_freebets(
    State(state): State<AppState>,
    query: Result<Query<FreebetQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Freebet>>> {
    let Query(query) = query?;
    let filter = FreebetFilter {
        bookmaker_id: query.bookmaker,
        status: query.status,
    };
    Ok(Json(state.ledger.freebets(&filter).await?))
}

/// POST /api/freebets/:id/status
pub async fn set_freebet_status(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<FreebetStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Freebet>> {
    let Path(id) = id?;
    let Json(request) = payload?;

    let freebet = state
        .ledger
        .update_freebet_status(id, request.status)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Freebet {id} not found")))?;

    info!(freebet_id = id, status = %freebet.status, "Freebet status updated");
    Ok(Json(freebet))
}
