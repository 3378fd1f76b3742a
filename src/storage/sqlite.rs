//! SQLite-backed `LedgerStore` built on an sqlx pool.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

use super::LedgerStore;
use crate::config::DatabaseConfig;
use crate::types::{
    Bet, BetFilter, Bookmaker, BookmakerId, Freebet, FreebetFilter, FreebetStatus, NewBookmaker,
    NewFreebet, NewTransaction, Transaction, TransactionFilter,
};

/// Idempotent schema, applied whenever a ledger is opened.
const SCHEMA: &str = include_str!("../../sql/schema.sql");

const BET_COLUMNS: &str = "id, bookmaker_id, placed_on, description, bet_type, status, \
                           stake, odds, liability, result";
const TRANSACTION_COLUMNS: &str = "id, bookmaker_id, type, amount, made_on, note";
const FREEBET_COLUMNS: &str = "id, bookmaker_id, amount, status, received_on, description";

pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Connect (creating the database file if needed) and apply the schema.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("Invalid database URL: {}", config.url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections.max(1));
        if config.is_in_memory() {
            // Each in-memory connection is its own database: keep exactly one alive.
            pool_options = pool_options
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database: {}", config.url))?;

        let ledger = Self { pool };
        ledger.migrate().await?;
        info!(url = %config.url, "Ledger database opened");
        Ok(ledger)
    }

    /// Fresh private in-memory ledger.
    pub async fn in_memory() -> Result<Self> {
        Self::open(&DatabaseConfig::in_memory()).await
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .context("Failed to apply ledger schema")?;
        debug!("Ledger schema applied");
        Ok(())
    }

    /// Close every pooled connection. Call once on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Ledger database closed");
    }
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).with_context(|| format!("Invalid decimal in column {column}: {raw}"))
}

fn enum_column<T>(row: &SqliteRow, column: &str) -> Result<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().with_context(|| format!("Invalid value in column {column}"))
}

fn bookmaker_from_row(row: &SqliteRow) -> Result<Bookmaker> {
    Ok(Bookmaker {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        commission: decimal_column(row, "commission")?,
        initial_balance: decimal_column(row, "initial_balance")?,
    })
}

fn bet_from_row(row: &SqliteRow) -> Result<Bet> {
    Ok(Bet {
        id: row.try_get("id")?,
        bookmaker_id: row.try_get("bookmaker_id")?,
        placed_on: row.try_get("placed_on")?,
        description: row.try_get("description")?,
        bet_type: enum_column(row, "bet_type")?,
        status: enum_column(row, "status")?,
        stake: decimal_column(row, "stake")?,
        odds: decimal_column(row, "odds")?,
        liability: decimal_column(row, "liability")?,
        result: decimal_column(row, "result")?,
    })
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction> {
    Ok(Transaction {
        id: row.try_get("id")?,
        bookmaker_id: row.try_get("bookmaker_id")?,
        kind: enum_column(row, "type")?,
        amount: decimal_column(row, "amount")?,
        made_on: row.try_get("made_on")?,
        note: row.try_get("note")?,
    })
}

fn freebet_from_row(row: &SqliteRow) -> Result<Freebet> {
    Ok(Freebet {
        id: row.try_get("id")?,
        bookmaker_id: row.try_get("bookmaker_id")?,
        amount: decimal_column(row, "amount")?,
        status: enum_column(row, "status")?,
        received_on: row.try_get("received_on")?,
        description: row.try_get("description")?,
    })
}

// ---------------------------------------------------------------------------
// LedgerStore
// ---------------------------------------------------------------------------

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn insert_bookmaker(&self, new: &NewBookmaker) -> Result<Bookmaker> {
        let id = sqlx::query(
            "INSERT INTO bookmakers (name, commission, initial_balance) VALUES (?, ?, ?)",
        )
        .bind(&new.name)
        .bind(new.commission.to_string())
        .bind(new.initial_balance.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to insert bookmaker")?
        .last_insert_rowid();

        debug!(bookmaker_id = id, name = %new.name, "Bookmaker stored");
        Ok(Bookmaker {
            id,
            name: new.name.clone(),
            commission: new.commission,
            initial_balance: new.initial_balance,
        })
    }

    async fn bookmaker(&self, id: BookmakerId) -> Result<Option<Bookmaker>> {
        let row = sqlx::query("SELECT id, name, commission, initial_balance FROM bookmakers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch bookmaker")?;
        row.as_ref().map(bookmaker_from_row).transpose()
    }

    async fn bookmakers(&self) -> Result<Vec<Bookmaker>> {
        let rows = sqlx::query("SELECT id, name, commission, initial_balance FROM bookmakers ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list bookmakers")?;
        rows.iter().map(bookmaker_from_row).collect()
    }

    async fn insert_bet(&self, bet: &Bet) -> Result<Bet> {
        let id = sqlx::query(
            "INSERT INTO bets (bookmaker_id, placed_on, description, bet_type, status, \
             stake, odds, liability, result) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(bet.bookmaker_id)
        .bind(bet.placed_on)
        .bind(&bet.description)
        .bind(bet.bet_type.as_str())
        .bind(bet.status.as_str())
        .bind(bet.stake.to_string())
        .bind(bet.odds.to_string())
        .bind(bet.liability.to_string())
        .bind(bet.result.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to insert bet")?
        .last_insert_rowid();

        let stored = Bet { id, ..bet.clone() };
        debug!(bookmaker_id = stored.bookmaker_id, bet = %stored, "Bet stored");
        Ok(stored)
    }

    async fn bet(&self, id: i64) -> Result<Option<Bet>> {
        let row = sqlx::query(&format!("SELECT {BET_COLUMNS} FROM bets WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch bet")?;
        row.as_ref().map(bet_from_row).transpose()
    }

    async fn bets(&self, filter: &BetFilter) -> Result<Vec<Bet>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {BET_COLUMNS} FROM bets WHERE 1 = 1"));
        if let Some(bookmaker_id) = filter.bookmaker_id {
            qb.push(" AND bookmaker_id = ").push_bind(bookmaker_id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(bet_type) = filter.bet_type {
            qb.push(" AND bet_type = ").push_bind(bet_type.as_str());
        }
        if let Some(window) = filter.window {
            qb.push(" AND placed_on BETWEEN ")
                .push_bind(window.start)
                .push(" AND ")
                .push_bind(window.end);
        }
        qb.push(" ORDER BY placed_on, id");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list bets")?;
        rows.iter().map(bet_from_row).collect()
    }

    async fn update_bet(&self, bet: &Bet) -> Result<bool> {
        let affected = sqlx::query(
            "UPDATE bets SET placed_on = ?, description = ?, bet_type = ?, status = ?, \
             stake = ?, odds = ?, liability = ?, result = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(bet.placed_on)
        .bind(&bet.description)
        .bind(bet.bet_type.as_str())
        .bind(bet.status.as_str())
        .bind(bet.stake.to_string())
        .bind(bet.odds.to_string())
        .bind(bet.liability.to_string())
        .bind(bet.result.to_string())
        .bind(bet.id)
        .execute(&self.pool)
        .await
        .context("Failed to update bet")?
        .rows_affected();

        debug!(bet_id = bet.id, status = %bet.status, updated = affected > 0, "Bet update");
        Ok(affected > 0)
    }

    async fn delete_bet(&self, id: i64) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM bets WHERE id = ? AND status = 'pending'")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete bet")?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn insert_transaction(&self, new: &NewTransaction) -> Result<Transaction> {
        let id = sqlx::query(
            "INSERT INTO transactions (bookmaker_id, type, amount, made_on, note) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(new.bookmaker_id)
        .bind(new.kind.as_str())
        .bind(new.amount.to_string())
        .bind(new.made_on)
        .bind(&new.note)
        .execute(&self.pool)
        .await
        .context("Failed to insert transaction")?
        .last_insert_rowid();

        debug!(transaction_id = id, kind = %new.kind, amount = %new.amount, "Transaction stored");
        Ok(Transaction {
            id,
            bookmaker_id: new.bookmaker_id,
            kind: new.kind,
            amount: new.amount,
            made_on: new.made_on,
            note: new.note.clone(),
        })
    }

    async fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE 1 = 1"));
        if let Some(bookmaker_id) = filter.bookmaker_id {
            qb.push(" AND bookmaker_id = ").push_bind(bookmaker_id);
        }
        if let Some(kind) = filter.kind {
            qb.push(" AND type = ").push_bind(kind.as_str());
        }
        if let Some(window) = filter.window {
            qb.push(" AND made_on BETWEEN ")
                .push_bind(window.start)
                .push(" AND ")
                .push_bind(window.end);
        }
        qb.push(" ORDER BY made_on, id");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;
        rows.iter().map(transaction_from_row).collect()
    }

    async fn delete_transaction(&self, id: i64) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete transaction")?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn insert_freebet(&self, new: &NewFreebet) -> Result<Freebet> {
        let id = sqlx::query(
            "INSERT INTO freebets (bookmaker_id, amount, status, received_on, description) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(new.bookmaker_id)
        .bind(new.amount.to_string())
        .bind(new.status.as_str())
        .bind(new.received_on)
        .bind(&new.description)
        .execute(&self.pool)
        .await
        .context("Failed to insert freebet")?
        .last_insert_rowid();

        debug!(freebet_id = id, amount = %new.amount, "Freebet stored");
        Ok(Freebet {
            id,
            bookmaker_id: new.bookmaker_id,
            amount: new.amount,
            status: new.status,
            received_on: new.received_on,
            description: new.description.clone(),
        })
    }

    async fn freebets(&self, filter: &FreebetFilter) -> Result<Vec<Freebet>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {FREEBET_COLUMNS} FROM freebets WHERE 1 = 1"));
        if let Some(bookmaker_id) = filter.bookmaker_id {
            qb.push(" AND bookmaker_id = ").push_bind(bookmaker_id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        qb.push(" ORDER BY received_on, id");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list freebets")?;
        rows.iter().map(freebet_from_row).collect()
    }

    async fn update_freebet_status(&self, id: i64, status: FreebetStatus) -> Result<Option<Freebet>> {
        let row = sqlx::query(&format!(
            "UPDATE freebets SET status = ? WHERE id = ? RETURNING {FREEBET_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update freebet")?;
        row.as_ref().map(freebet_from_row).transpose()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
