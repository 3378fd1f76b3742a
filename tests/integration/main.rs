//! End-to-end tests: the full HTTP API over an in-memory SQLite ledger.

mod support;

mod api_flow;
mod balance_properties;
