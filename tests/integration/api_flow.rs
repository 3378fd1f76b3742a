//! A month of activity on two bookmakers, checked report by report.

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use crate::support::{money, TestApp};

struct Ledger {
    app: TestApp,
    exchange: i64,
    sportsbook: i64,
}

async fn bet(app: &TestApp, bookmaker: i64, placed_on: &str, bet_type: &str, stake: f64, odds: f64) -> i64 {
    let json = app
        .post(
            "/api/bets",
            json!({
                "bookmaker_id": bookmaker,
                "placed_on": placed_on,
                "description": format!("{bet_type} {stake}@{odds}"),
                "bet_type": bet_type,
                "stake": stake,
                "odds": odds,
            }),
        )
        .await;
    json["id"].as_i64().unwrap()
}

async fn settle(app: &TestApp, id: i64, status: &str) -> Value {
    app.post(&format!("/api/bets/{id}/settle"), json!({ "status": status })).await
}

async fn transaction(app: &TestApp, bookmaker: i64, kind: &str, amount: f64, made_on: &str) {
    app.post(
        "/api/transactions",
        json!({ "bookmaker_id": bookmaker, "type": kind, "amount": amount, "made_on": made_on }),
    )
    .await;
}

/// Exchange (5% commission, 100 initial) and Sportsbook (no commission).
///
/// Exchange: +200 deposit, -50 withdrawal, back bet won (+142.50),
/// freebet won (+28.50), mug bet pending (20 at risk).
/// Sportsbook: +300 deposit, lay bet lost (-150).
async fn seeded() -> Ledger {
    let app = TestApp::new().await;
    let exchange = app.bookmaker("Exchange", 5.0, 100.0).await;
    let sportsbook = app.bookmaker("Sportsbook", 0.0, 0.0).await;

    transaction(&app, sportsbook, "deposit", 300.0, "2024-01-02").await;
    transaction(&app, exchange, "deposit", 200.0, "2024-01-05").await;
    transaction(&app, exchange, "withdrawal", 50.0, "2024-02-10").await;

    let back = bet(&app, exchange, "2024-01-10", "backBet", 100.0, 2.5).await;
    let lay = bet(&app, sportsbook, "2024-01-15", "layBet", 100.0, 2.5).await;
    let free = bet(&app, exchange, "2024-01-20", "freeBet", 10.0, 4.0).await;
    bet(&app, exchange, "2024-02-20", "mugBet", 20.0, 3.0).await;

    assert_eq!(money(&settle(&app, back, "won").await["result"]), dec!(142.5));
    assert_eq!(money(&settle(&app, lay, "lost").await["result"]), dec!(-150));
    assert_eq!(money(&settle(&app, free, "won").await["result"]), dec!(28.5));

    app.post(
        "/api/freebets",
        json!({ "bookmaker_id": exchange, "amount": 10, "received_on": "2024-01-18" }),
    )
    .await;

    Ledger { app, exchange, sportsbook }
}

#[tokio::test]
async fn test_balances_per_bookmaker_and_total() {
    let ledger = seeded().await;
    let report = ledger.app.get("/api/reports/balances").await;

    let rows = report["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["bookmaker_id"], ledger.exchange);
    assert_eq!(money(&rows[0]["balance"]), dec!(401));
    assert_eq!(money(&rows[0]["pending_liability"]), dec!(20));
    assert_eq!(rows[1]["bookmaker_id"], ledger.sportsbook);
    assert_eq!(money(&rows[1]["balance"]), dec!(150));
    assert_eq!(money(&report["total"]["balance"]), dec!(551));

    let single = ledger
        .app
        .get(&format!("/api/reports/balances/{}", ledger.exchange))
        .await;
    assert_eq!(single, rows[0]);
}

#[tokio::test]
async fn test_period_balance_only_counts_window() {
    let ledger = seeded().await;
    let report = ledger
        .app
        .get("/api/reports/period-balance?start=2024-01-01&end=2024-01-31")
        .await;

    // January excludes the February withdrawal and the pending mug bet.
    assert_eq!(money(&report["rows"][0]["balance"]), dec!(471));
    assert_eq!(money(&report["rows"][1]["balance"]), dec!(150));
    assert_eq!(money(&report["total"]["balance"]), dec!(621));
    assert_eq!(report["window"]["start"], "2024-01-01");

    let (status, _) = ledger
        .app
        .request("GET", "/api/reports/period-balance?start=2024-01-01", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_performance_reports() {
    let ledger = seeded().await;

    let overall = ledger.app.get("/api/reports/performance").await;
    assert_eq!(overall["bets"], 4);
    assert_eq!(overall["won"], 2);
    assert_eq!(overall["lost"], 1);
    assert_eq!(overall["pending"], 1);
    assert_eq!(money(&overall["win_rate"]), dec!(66.67));
    assert_eq!(money(&overall["resolved_stake"]), dec!(210));
    assert_eq!(money(&overall["result"]), dec!(21));
    assert_eq!(money(&overall["roi"]), dec!(10));

    let by_bookmaker = ledger.app.get("/api/reports/performance?by=bookmaker").await;
    let exchange = &by_bookmaker[0];
    assert_eq!(exchange["bookmaker_id"], ledger.exchange);
    assert_eq!(money(&exchange["result"]), dec!(171));
    assert_eq!(money(&exchange["roi"]), dec!(155.45));

    let scoped = ledger
        .app
        .get(&format!("/api/reports/performance?bookmaker={}", ledger.sportsbook))
        .await;
    assert_eq!(scoped["bets"], 1);
    assert_eq!(money(&scoped["win_rate"]), dec!(0));
}

#[tokio::test]
async fn test_profit_by_period() {
    let ledger = seeded().await;
    let points = ledger.app.get("/api/reports/profit?granularity=month").await;
    let points = points.as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["period"], "2024-01");
    assert_eq!(points[0]["settled_bets"], 3);
    assert_eq!(money(&points[0]["cumulative"]), dec!(21));

    let daily = ledger.app.get("/api/reports/profit?granularity=day").await;
    let daily = daily.as_array().unwrap();
    assert_eq!(daily.len(), 3);
    assert_eq!(money(&daily[2]["cumulative"]), dec!(21));
}

#[tokio::test]
async fn test_cashflow_reports() {
    let ledger = seeded().await;

    let deposits = ledger.app.get("/api/reports/deposits?by=bookmaker").await;
    assert_eq!(money(&deposits["total"]), dec!(500));
    assert_eq!(deposits["groups"][0]["key"], ledger.exchange);
    assert_eq!(money(&deposits["groups"][0]["share_of_total"]), dec!(40));
    assert_eq!(money(&deposits["groups"][1]["share_of_total"]), dec!(60));

    let withdrawals = ledger.app.get("/api/reports/withdrawals").await;
    assert_eq!(withdrawals["count"], 1);
    assert_eq!(withdrawals["groups"][0]["key"], "2024-02");

    let flow = ledger.app.get("/api/reports/cashflow?by=month").await;
    assert_eq!(flow["rows"].as_array().unwrap().len(), 2);
    assert_eq!(money(&flow["rows"][0]["net"]), dec!(500));
    assert_eq!(money(&flow["rows"][1]["net"]), dec!(-50));
    assert_eq!(money(&flow["net"]), dec!(450));
}

#[tokio::test]
async fn test_freebet_reports() {
    let ledger = seeded().await;

    let conversion = ledger.app.get("/api/reports/freebets/conversion").await;
    assert_eq!(money(&conversion["total"]["freebet_amount"]), dec!(10));
    assert_eq!(money(&conversion["total"]["converted_result"]), dec!(28.5));
    assert_eq!(money(&conversion["total"]["conversion_rate"]), dec!(285));

    let exchange = ledger
        .app
        .get(&format!("/api/reports/freebets/conversion?bookmaker={}", ledger.exchange))
        .await;
    assert_eq!(exchange["bookmaker_id"], ledger.exchange);
    assert_eq!(money(&exchange["freebet_amount"]), dec!(10));
    assert_eq!(money(&exchange["converted_result"]), dec!(28.5));
    assert_eq!(money(&exchange["conversion_rate"]), dec!(285));

    let sportsbook = ledger
        .app
        .get(&format!("/api/reports/freebets/conversion?bookmaker={}", ledger.sportsbook))
        .await;
    assert_eq!(money(&sportsbook["freebet_amount"]), dec!(0));
    assert_eq!(money(&sportsbook["conversion_rate"]), dec!(0));

    let (status, _) = ledger
        .app
        .request("GET", "/api/reports/freebets/conversion?bookmaker=999", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let claiming = ledger
        .app
        .post(
            "/api/freebets",
            json!({
                "bookmaker_id": ledger.sportsbook,
                "amount": 5,
                "status": "claiming",
                "received_on": "2024-02-01",
            }),
        )
        .await;
    let id = claiming["id"].as_i64().unwrap();

    let summary = ledger.app.get("/api/reports/freebets/summary").await;
    assert_eq!(summary["count"], 2);
    assert_eq!(money(&summary["amount"]), dec!(15));
    let by_status = summary["by_status"].as_array().unwrap();
    assert_eq!(by_status.len(), 5);
    assert_eq!(by_status[3]["status"], "claiming");
    assert_eq!(by_status[3]["count"], 1);

    ledger
        .app
        .post(&format!("/api/freebets/{id}/status"), json!({ "status": "rejected" }))
        .await;
    let rejected = ledger.app.get("/api/freebets?status=rejected").await;
    assert_eq!(rejected.as_array().unwrap().len(), 1);

    // Rejected credit never counts toward conversion.
    let conversion = ledger.app.get("/api/reports/freebets/conversion").await;
    assert_eq!(money(&conversion["total"]["freebet_amount"]), dec!(10));
}

#[tokio::test]
async fn test_listing_filters() {
    let ledger = seeded().await;

    let pending = ledger.app.get("/api/bets?status=pending").await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["bet_type"], "mugBet");

    let lays = ledger.app.get("/api/bets?type=layBet").await;
    assert_eq!(lays.as_array().unwrap().len(), 1);

    let january = ledger.app.get("/api/bets?start=2024-01-01&end=2024-01-31").await;
    assert_eq!(january.as_array().unwrap().len(), 3);

    let exchange_deposits = ledger
        .app
        .get(&format!("/api/transactions?bookmaker={}&type=deposit", ledger.exchange))
        .await;
    assert_eq!(exchange_deposits.as_array().unwrap().len(), 1);

    let books = ledger.app.get("/api/bookmakers").await;
    assert_eq!(books.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_deleting_transaction_moves_balance() {
    let ledger = seeded().await;
    let withdrawals = ledger.app.get("/api/transactions?type=withdrawal").await;
    let id = withdrawals[0]["id"].as_i64().unwrap();

    let (status, _) = ledger
        .app
        .request("DELETE", &format!("/api/transactions/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let balance = ledger
        .app
        .get(&format!("/api/reports/balances/{}", ledger.exchange))
        .await;
    assert_eq!(money(&balance["balance"]), dec!(451));
}
