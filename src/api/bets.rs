//! Bet handlers. Every settlement field is derived by `engine::settlement`;
//! the handlers only fetch, call the engine and write the result back.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use super::error::{ApiError, ApiResult};
use super::{date_window, AppState};
use crate::engine::settlement::{self, BetAmendment, SettlementError};
use crate::types::{Bet, BetFilter, BetStatus, BetType, Bookmaker, BookmakerId, NewBet};

#[derive(Debug, Default, Deserialize)]
pub struct BetQuery {
    pub bookmaker: Option<BookmakerId>,
    pub status: Option<BetStatus>,
    #[serde(rename = "type")]
    pub bet_type: Option<BetType>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl BetQuery {
    pub fn filter(&self) -> ApiResult<BetFilter> {
        Ok(BetFilter {
            bookmaker_id: self.bookmaker,
            status: self.status,
            bet_type: self.bet_type,
            window: date_window(self.start, self.end)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SettleRequest {
    pub status: BetStatus,
}

pub(super) async fn require_bookmaker(state: &AppState, id: BookmakerId) -> ApiResult<Bookmaker> {
    state
        .ledger
        .bookmaker(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Bookmaker {id} not found")))
}

async fn require_bet(state: &AppState, id: i64) -> ApiResult<Bet> {
    state
        .ledger
        .bet(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Bet {id} not found")))
}

/// Write back a bet that must still be pending in storage.
async fn store_pending_update(state: &AppState, bet: &Bet) -> ApiResult<()> {
    if !state.ledger.update_bet(bet).await? {
        return Err(SettlementError::AlreadySettled(bet.id).into());
    }
    Ok(())
}

/// POST /api/bets
pub async fn create_bet(
    State(state): State<AppState>,
    payload: Result<Json<NewBet>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Bet>)> {
    let Json(new) = payload?;
    require_bookmaker(&state, new.bookmaker_id).await?;

    let bet = settlement::open_bet(&new)?;
    let bet = state.ledger.insert_bet(&bet).await?;

    info!(
        bet_id = bet.id,
        bookmaker_id = bet.bookmaker_id,
        bet_type = %bet.bet_type,
        stake = %bet.stake,
        liability = %bet.liability,
        "Bet created"
    );
    Ok((StatusCode::CREATED, Json(bet)))
}

/// GET /api/bets
pub async fn list_bets(
    State(state): State<AppState>,
    query: Result<Query<BetQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Bet>>> {
    let Query(query) = query?;
    let bets = state.ledger.bets(&query.filter()?).await?;
    Ok(Json(bets))
}

/// GET /api/bets/:id
pub async fn get_bet(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Bet>> {
    let Path(id) = id?;
    Ok(Json(require_bet(&state, id).await?))
}

/// PATCH /api/bets/:id
pub async fn amend_bet(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<BetAmendment>, JsonRejection>,
) -> ApiResult<Json<Bet>> {
    let Path(id) = id?;
    let Json(amendment) = payload?;

    let bet = require_bet(&state, id).await?;
    let amended = settlement::amend_bet(&bet, &amendment)?;
    store_pending_update(&state, &amended).await?;

    info!(bet_id = id, liability = %amended.liability, "Bet amended");
    Ok(Json(amended))
}

/// POST /api/bets/:id/settle
pub async fn settle_bet(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SettleRequest>, JsonRejection>,
) -> ApiResult<Json<Bet>> {
    let Path(id) = id?;
    let Json(request) = payload?;

    let bet = require_bet(&state, id).await?;
    let bookmaker = require_bookmaker(&state, bet.bookmaker_id).await?;
    let settled = settlement::settle_bet(&bet, request.status, bookmaker.commission)?;
    store_pending_update(&state, &settled).await?;

    info!(
        bet_id = id,
        status = %settled.status,
        result = %settled.result,
        commission = %bookmaker.commission,
        "Bet settled"
    );
    Ok(Json(settled))
}

/// DELETE /api/bets/:id
pub async fn delete_bet(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;

    let bet = require_bet(&state, id).await?;
    settlement::ensure_deletable(&bet)?;
    if !state.ledger.delete_bet(id).await? {
        return Err(SettlementError::AlreadySettled(id).into());
    }

    info!(bet_id = id, "Bet deleted");
    Ok(StatusCode::NO_CONTENT)
}
