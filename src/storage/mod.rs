//! Persistence layer.
//!
//! Defines the `LedgerStore` trait: the handle the request layer fetches
//! records through and writes settlement fields back with. The handle is
//! opened once at process start and passed in explicitly; nothing in the
//! engine holds a connection.

pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{
    Bet, BetFilter, Bookmaker, BookmakerId, Freebet, FreebetFilter, FreebetStatus, NewBookmaker,
    NewFreebet, NewTransaction, Transaction, TransactionFilter,
};

pub use sqlite::SqliteLedger;

/// Storage of bookmakers, bets, transactions and freebets.
///
/// Settled bets are immutable here as well: `update_bet` and `delete_bet`
/// only touch rows that are still pending and report whether they did.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_bookmaker(&self, new: &NewBookmaker) -> Result<Bookmaker>;

    async fn bookmaker(&self, id: BookmakerId) -> Result<Option<Bookmaker>>;

    async fn bookmakers(&self) -> Result<Vec<Bookmaker>>;

    /// Store a new bet. The id on `bet` is ignored; the stored bet is returned.
    async fn insert_bet(&self, bet: &Bet) -> Result<Bet>;

    async fn bet(&self, id: i64) -> Result<Option<Bet>>;

    async fn bets(&self, filter: &BetFilter) -> Result<Vec<Bet>>;

    /// Overwrite a bet that is still pending in storage.
    /// Returns false if no pending row with that id exists.
    async fn update_bet(&self, bet: &Bet) -> Result<bool>;

    /// Delete a pending bet. Returns false if no pending row with that id exists.
    async fn delete_bet(&self, id: i64) -> Result<bool>;

    async fn insert_transaction(&self, new: &NewTransaction) -> Result<Transaction>;

    async fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;

    async fn delete_transaction(&self, id: i64) -> Result<bool>;

    async fn insert_freebet(&self, new: &NewFreebet) -> Result<Freebet>;

    async fn freebets(&self, filter: &FreebetFilter) -> Result<Vec<Freebet>>;

    async fn update_freebet_status(&self, id: i64, status: FreebetStatus) -> Result<Option<Freebet>>;
}
