//! Reconciliation over a generated ledger.
//!
//! A seeded generator places a few hundred bets and transactions across
//! several bookmakers, settles most of them through the API, then checks
//! every report against totals recomputed here from the listed records.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::support::{money, TestApp};

const BET_TYPES: [&str; 6] = ["backBet", "layBet", "mugBet", "freeBet", "personal", "other"];

/// Small linear congruential generator; same seed, same ledger.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }

    /// Whole cents in `[min, max)` as a float the API accepts.
    fn cents(&mut self, min: u64, max: u64) -> f64 {
        (min + self.below(max - min)) as f64 / 100.0
    }

    fn date(&mut self) -> String {
        format!("2024-{:02}-{:02}", 1 + self.below(6), 1 + self.below(28))
    }
}

async fn generate(app: &TestApp, seed: u64) -> Vec<i64> {
    let mut rng = Lcg(seed);
    let commissions = [0.0, 2.0, 5.0, 6.5];
    let mut bookmakers = Vec::new();
    for (i, commission) in commissions.iter().enumerate() {
        let initial = rng.cents(0, 50_000);
        bookmakers.push(app.bookmaker(&format!("book-{i}"), *commission, initial).await);
    }

    for _ in 0..60 {
        let bookmaker = bookmakers[rng.below(bookmakers.len() as u64) as usize];
        let kind = if rng.below(3) == 0 { "withdrawal" } else { "deposit" };
        app.post(
            "/api/transactions",
            json!({
                "bookmaker_id": bookmaker,
                "type": kind,
                "amount": rng.cents(100, 100_000),
                "made_on": rng.date(),
            }),
        )
        .await;
    }

    for _ in 0..150 {
        let bookmaker = bookmakers[rng.below(bookmakers.len() as u64) as usize];
        let bet_type = BET_TYPES[rng.below(BET_TYPES.len() as u64) as usize];
        let created = app
            .post(
                "/api/bets",
                json!({
                    "bookmaker_id": bookmaker,
                    "placed_on": rng.date(),
                    "bet_type": bet_type,
                    "stake": rng.cents(100, 20_000),
                    "odds": rng.cents(101, 1_000),
                }),
            )
            .await;
        let id = created["id"].as_i64().unwrap();

        match rng.below(4) {
            0 => {}
            1 => {
                app.post(&format!("/api/bets/{id}/settle"), json!({ "status": "lost" }))
                    .await;
            }
            _ => {
                app.post(&format!("/api/bets/{id}/settle"), json!({ "status": "won" }))
                    .await;
            }
        }
    }

    bookmakers
}

#[derive(Default)]
struct Expected {
    initial: Decimal,
    deposits: Decimal,
    withdrawals: Decimal,
    settled: Decimal,
    pending_liability: Decimal,
}

impl Expected {
    fn balance(&self) -> Decimal {
        self.initial + self.deposits - self.withdrawals + self.settled - self.pending_liability
    }
}

fn expected_from(bookmakers: &Value, bets: &Value, transactions: &Value) -> BTreeMap<i64, Expected> {
    let mut expected: BTreeMap<i64, Expected> = BTreeMap::new();
    for bm in bookmakers.as_array().unwrap() {
        expected.entry(bm["id"].as_i64().unwrap()).or_default().initial = money(&bm["initial_balance"]);
    }
    for bet in bets.as_array().unwrap() {
        let entry = expected.entry(bet["bookmaker_id"].as_i64().unwrap()).or_default();
        if bet["status"] == "pending" {
            entry.pending_liability += money(&bet["liability"]);
        } else {
            entry.settled += money(&bet["result"]);
        }
    }
    for tx in transactions.as_array().unwrap() {
        let entry = expected.entry(tx["bookmaker_id"].as_i64().unwrap()).or_default();
        match tx["type"].as_str().unwrap() {
            "deposit" => entry.deposits += money(&tx["amount"]),
            _ => entry.withdrawals += money(&tx["amount"]),
        }
    }
    expected
}

#[tokio::test]
async fn test_generated_ledger_balances_reconcile() {
    for seed in [7_u64, 42, 2024] {
        let app = TestApp::new().await;
        generate(&app, seed).await;

        let bookmakers = app.get("/api/bookmakers").await;
        let bets = app.get("/api/bets").await;
        let transactions = app.get("/api/transactions").await;
        let expected = expected_from(&bookmakers, &bets, &transactions);

        let report = app.get("/api/reports/balances").await;
        let rows = report["rows"].as_array().unwrap();
        assert_eq!(rows.len(), expected.len());

        let mut sum = Decimal::ZERO;
        for row in rows {
            let id = row["bookmaker_id"].as_i64().unwrap();
            let want = &expected[&id];
            let balance = money(&row["balance"]);
            assert_eq!(balance, want.balance(), "seed {seed}, bookmaker {id}");
            assert_eq!(money(&row["pending_liability"]), want.pending_liability);
            sum += balance;
        }
        assert_eq!(money(&report["total"]["balance"]), sum, "seed {seed}");
    }
}

#[tokio::test]
async fn test_settled_records_are_internally_consistent() {
    let app = TestApp::new().await;
    generate(&app, 99).await;

    let bets = app.get("/api/bets").await;
    for bet in bets.as_array().unwrap() {
        let liability = money(&bet["liability"]);
        let result = money(&bet["result"]);
        match bet["status"].as_str().unwrap() {
            "pending" => {
                assert_eq!(result, Decimal::ZERO);
                if bet["bet_type"] == "freeBet" {
                    assert_eq!(liability, Decimal::ZERO);
                }
            }
            "lost" => {
                assert_eq!(liability, Decimal::ZERO);
                assert!(result <= Decimal::ZERO);
            }
            _ => {
                assert_eq!(liability, Decimal::ZERO);
                assert!(result >= Decimal::ZERO);
            }
        }
        // Every stored figure is already at cent precision.
        assert_eq!(result.round_dp(2), result);
        assert_eq!(liability.round_dp(2), liability);
    }
}

#[tokio::test]
async fn test_period_windows_partition_activity() {
    let app = TestApp::new().await;
    generate(&app, 1234).await;

    // Initial balances appear once per window, so subtract them back out.
    let whole = app
        .get("/api/reports/period-balance?start=2024-01-01&end=2024-06-30")
        .await;
    let first = app
        .get("/api/reports/period-balance?start=2024-01-01&end=2024-03-31")
        .await;
    let second = app
        .get("/api/reports/period-balance?start=2024-04-01&end=2024-06-30")
        .await;

    let activity = |report: &Value| money(&report["total"]["balance"]) - money(&report["total"]["initial_balance"]);
    assert_eq!(activity(&whole), activity(&first) + activity(&second));

    let flow = app.get("/api/reports/cashflow?by=month").await;
    let months: Decimal = flow["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| money(&r["net"]))
        .sum();
    assert_eq!(months, money(&flow["net"]));

    let profit = app.get("/api/reports/profit?granularity=month").await;
    let last = profit.as_array().unwrap().last().cloned().unwrap_or(json!({ "cumulative": 0 }));
    let performance = app.get("/api/reports/performance").await;
    assert_eq!(money(&last["cumulative"]), money(&performance["result"]));
    assert!(money(&performance["win_rate"]) <= dec!(100));
}
