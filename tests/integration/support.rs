//! In-process test harness.
//!
//! Builds the real router over a fresh in-memory ledger and drives it with
//! `oneshot` requests. No sockets, no files.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;

use betledger::api::{build_router, ApiState};
use betledger::storage::SqliteLedger;

pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let ledger = SqliteLedger::in_memory().await.expect("in-memory ledger");
        Self {
            router: build_router(ApiState::new(Arc::new(ledger))),
        }
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 10_000_000).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> Value {
        let (status, json) = self.request("GET", uri, None).await;
        assert_eq!(status, StatusCode::OK, "GET {uri}: {json}");
        json
    }

    /// POST expecting 200 or 201; returns the body.
    pub async fn post(&self, uri: &str, body: Value) -> Value {
        let (status, json) = self.request("POST", uri, Some(body)).await;
        assert!(status.is_success(), "POST {uri} -> {status}: {json}");
        json
    }

    pub async fn bookmaker(&self, name: &str, commission: f64, initial_balance: f64) -> i64 {
        let json = self
            .post(
                "/api/bookmakers",
                serde_json::json!({
                    "name": name,
                    "commission": commission,
                    "initial_balance": initial_balance,
                }),
            )
            .await;
        json["id"].as_i64().unwrap()
    }
}

/// Read a JSON number back as an exact decimal.
pub fn money(value: &Value) -> Decimal {
    Decimal::from_str(&value.to_string())
        .unwrap_or_else(|_| panic!("not a decimal: {value}"))
}
