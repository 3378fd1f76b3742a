//! Read-only report handlers. Each one loads the records in scope and hands
//! them to the engine; nothing is cached between requests.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::bets::require_bookmaker;
use super::error::{ApiError, ApiResult};
use super::{date_window, AppState};
use crate::engine::accountant::{Accountant, BalanceBreakdown, BalanceReport, PeriodBalanceReport};
use crate::engine::cashflow::{self, AmountReport, CashflowReport, Grouping};
use crate::engine::freebets::{self, ConversionReport, FreebetConversion, FreebetSummary};
use crate::engine::performance::{
    self, BetTypePerformance, BookmakerPerformance, PerformanceSummary, ProfitPoint,
};
use crate::types::{
    BetFilter, BetType, BookmakerId, DateWindow, FreebetFilter, Granularity, TransactionFilter,
    TransactionType,
};

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceGrouping {
    Bookmaker,
    Type,
}

#[derive(Debug, Default, Deserialize)]
pub struct PerformanceQuery {
    pub by: Option<PerformanceGrouping>,
    pub bookmaker: Option<BookmakerId>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfitQuery {
    pub granularity: Option<Granularity>,
    pub bookmaker: Option<BookmakerId>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CashflowQuery {
    #[serde(default)]
    pub by: Grouping,
    pub bookmaker: Option<BookmakerId>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl CashflowQuery {
    fn filter(&self) -> ApiResult<TransactionFilter> {
        Ok(TransactionFilter {
            bookmaker_id: self.bookmaker,
            kind: None,
            window: date_window(self.start, self.end)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConversionQuery {
    pub bookmaker: Option<BookmakerId>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ConversionResponse {
    Bookmaker(FreebetConversion),
    All(ConversionReport),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PerformanceReport {
    Overall(PerformanceSummary),
    ByBookmaker(Vec<BookmakerPerformance>),
    ByType(Vec<BetTypePerformance>),
}

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

/// GET /api/reports/balances
pub async fn balances(State(state): State<AppState>) -> ApiResult<Json<BalanceReport>> {
    let bookmakers = state.ledger.bookmakers().await?;
    let bets = state.ledger.bets(&BetFilter::default()).await?;
    let transactions = state.ledger.transactions(&TransactionFilter::default()).await?;

    let report = Accountant::balances(&bookmakers, &bets, &transactions);
    debug!(bookmakers = report.rows.len(), balance = %report.total.balance, "Balance report");
    Ok(Json(report))
}

/// GET /api/reports/balances/:id
pub async fn bookmaker_balance(
    State(state): State<AppState>,
    id: Result<Path<BookmakerId>, PathRejection>,
) -> ApiResult<Json<BalanceBreakdown>> {
    let Path(id) = id?;
    let bookmaker = require_bookmaker(&state, id).await?;

    let bets = state
        .ledger
        .bets(&BetFilter { bookmaker_id: Some(id), ..Default::default() })
        .await?;
    let transactions = state
        .ledger
        .transactions(&TransactionFilter { bookmaker_id: Some(id), ..Default::default() })
        .await?;

    Ok(Json(Accountant::balance(&bookmaker, &bets, &transactions)))
}

/// GET /api/reports/period-balance?start=&end=
pub async fn period_balance(
    State(state): State<AppState>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<Json<PeriodBalanceReport>> {
    let Query(query) = query?;
    let window = DateWindow::new(query.start, query.end)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let bookmakers = state.ledger.bookmakers().await?;
    let bets = state
        .ledger
        .bets(&BetFilter { window: Some(window), ..Default::default() })
        .await?;
    let transactions = state
        .ledger
        .transactions(&TransactionFilter { window: Some(window), ..Default::default() })
        .await?;

    Ok(Json(Accountant::period_balances(window, &bookmakers, &bets, &transactions)))
}

// ---------------------------------------------------------------------------
// Performance
// ---------------------------------------------------------------------------

/// GET /api/reports/performance?by=bookmaker|type
pub async fn performance(
    State(state): State<AppState>,
    query: Result<Query<PerformanceQuery>, QueryRejection>,
) -> ApiResult<Json<PerformanceReport>> {
    let Query(query) = query?;
    let filter = BetFilter {
        bookmaker_id: query.bookmaker,
        window: date_window(query.start, query.end)?,
        ..Default::default()
    };
    let bets = state.ledger.bets(&filter).await?;

    let report = match query.by {
        None => PerformanceReport::Overall(PerformanceSummary::from_bets(&bets)),
        Some(PerformanceGrouping::Bookmaker) => {
            PerformanceReport::ByBookmaker(performance::performance_by_bookmaker(&bets))
        }
        Some(PerformanceGrouping::Type) => {
            PerformanceReport::ByType(performance::performance_by_type(&bets))
        }
    };
    Ok(Json(report))
}

/// GET /api/reports/profit?granularity=day|month|year
pub async fn profit(
    State(state): State<AppState>,
    query: Result<Query<ProfitQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ProfitPoint>>> {
    let Query(query) = query?;
    let filter = BetFilter {
        bookmaker_id: query.bookmaker,
        window: date_window(query.start, query.end)?,
        ..Default::default()
    };
    let bets = state.ledger.bets(&filter).await?;
    let granularity = query.granularity.unwrap_or(Granularity::Month);
    Ok(Json(performance::profit_by_period(&bets, granularity)))
}

// ---------------------------------------------------------------------------
// Cashflow
// ---------------------------------------------------------------------------

async fn amounts(
    state: &AppState,
    query: &CashflowQuery,
    kind: TransactionType,
) -> ApiResult<AmountReport> {
    let filter = TransactionFilter { kind: Some(kind), ..query.filter()? };
    let transactions = state.ledger.transactions(&filter).await?;
    Ok(cashflow::amount_report(&transactions, kind, query.by))
}

/// GET /api/reports/deposits?by=
pub async fn deposits(
    State(state): State<AppState>,
    query: Result<Query<CashflowQuery>, QueryRejection>,
) -> ApiResult<Json<AmountReport>> {
    let Query(query) = query?;
    Ok(Json(amounts(&state, &query, TransactionType::Deposit).await?))
}

/// GET /api/reports/withdrawals?by=
pub async fn withdrawals(
    State(state): State<AppState>,
    query: Result<Query<CashflowQuery>, QueryRejection>,
) -> ApiResult<Json<AmountReport>> {
    let Query(query) = query?;
    Ok(Json(amounts(&state, &query, TransactionType::Withdrawal).await?))
}

/// GET /api/reports/cashflow?by=
pub async fn cashflow_report(
    State(state): State<AppState>,
    query: Result<Query<CashflowQuery>, QueryRejection>,
) -> ApiResult<Json<CashflowReport>> {
    let Query(query) = query?;
    let transactions = state.ledger.transactions(&query.filter()?).await?;
    Ok(Json(cashflow::cashflow(&transactions, query.by)))
}

// ---------------------------------------------------------------------------
// Freebets
// ---------------------------------------------------------------------------

/// GET /api/reports/freebets/conversion?bookmaker=
pub async fn freebet_conversion(
    State(state): State<AppState>,
    query: Result<Query<ConversionQuery>, QueryRejection>,
) -> ApiResult<Json<ConversionResponse>> {
    let Query(query) = query?;

    let response = match query.bookmaker {
        Some(id) => {
            require_bookmaker(&state, id).await?;
            let freebets = state
                .ledger
                .freebets(&FreebetFilter { bookmaker_id: Some(id), ..Default::default() })
                .await?;
            let bets = state
                .ledger
                .bets(&BetFilter {
                    bookmaker_id: Some(id),
                    bet_type: Some(BetType::FreeBet),
                    ..Default::default()
                })
                .await?;
            ConversionResponse::Bookmaker(freebets::conversion_rate(id, &freebets, &bets))
        }
        None => {
            let freebets = state.ledger.freebets(&FreebetFilter::default()).await?;
            let bets = state.ledger.bets(&BetFilter::default()).await?;
            ConversionResponse::All(freebets::conversion_report(&freebets, &bets))
        }
    };
    Ok(Json(response))
}

/// GET /api/reports/freebets/summary
pub async fn freebet_summary(State(state): State<AppState>) -> ApiResult<Json<FreebetSummary>> {
    let freebets = state.ledger.freebets(&FreebetFilter::default()).await?;
    Ok(Json(freebets::summarize(&freebets)))
}
