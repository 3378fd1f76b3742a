//! Accountant: bookmaker balances and their breakdown.
//!
//! `balance = initial + deposits − withdrawals + Σresult(settled) − Σliability(pending)`
//!
//! Every term is rounded on its own before the sum, so re-adding the
//! reported terms always reproduces the reported balance.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::money::{round_money, sum_money};
use crate::types::{Bet, Bookmaker, BookmakerId, DateWindow, Transaction, TransactionType};

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// One bookmaker's balance with each term of the formula.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceBreakdown {
    pub bookmaker_id: Option<BookmakerId>,
    pub name: Option<String>,
    pub initial_balance: Decimal,
    pub deposits: Decimal,
    pub withdrawals: Decimal,
    pub settled_result: Decimal,
    pub pending_liability: Decimal,
    pub balance: Decimal,
}

impl BalanceBreakdown {
    fn compose(
        bookmaker_id: Option<BookmakerId>,
        name: Option<String>,
        initial_balance: Decimal,
        terms: &Terms,
    ) -> Self {
        let initial_balance = round_money(initial_balance);
        let deposits = round_money(terms.deposits);
        let withdrawals = round_money(terms.withdrawals);
        let settled_result = round_money(terms.settled_result);
        let pending_liability = round_money(terms.pending_liability);

        Self {
            bookmaker_id,
            name,
            initial_balance,
            deposits,
            withdrawals,
            settled_result,
            pending_liability,
            balance: initial_balance
                .saturating_add(deposits)
                .saturating_sub(withdrawals)
                .saturating_add(settled_result)
                .saturating_sub(pending_liability),
        }
    }

    /// Grand total across rows. Its balance equals the sum of row balances.
    fn total(rows: &[BalanceBreakdown]) -> Self {
        let terms = Terms {
            deposits: sum_money(rows.iter().map(|r| r.deposits)),
            withdrawals: sum_money(rows.iter().map(|r| r.withdrawals)),
            settled_result: sum_money(rows.iter().map(|r| r.settled_result)),
            pending_liability: sum_money(rows.iter().map(|r| r.pending_liability)),
        };
        let initial = sum_money(rows.iter().map(|r| r.initial_balance));
        Self::compose(None, None, initial, &terms)
    }
}

/// Balances for a set of bookmakers plus their grand total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceReport {
    pub rows: Vec<BalanceBreakdown>,
    pub total: BalanceBreakdown,
}

/// Balances restricted to an inclusive date window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodBalanceReport {
    pub window: DateWindow,
    pub rows: Vec<BalanceBreakdown>,
    pub total: BalanceBreakdown,
}

// ---------------------------------------------------------------------------
// Term accumulation
// ---------------------------------------------------------------------------

/// Unrounded sums of the movable terms for one bookmaker.
#[derive(Debug, Clone, Default)]
struct Terms {
    deposits: Decimal,
    withdrawals: Decimal,
    settled_result: Decimal,
    pending_liability: Decimal,
}

impl Terms {
    fn add_bet(&mut self, bet: &Bet) {
        if bet.status.is_pending() {
            self.pending_liability = self.pending_liability.saturating_add(bet.liability);
        } else {
            self.settled_result = self.settled_result.saturating_add(bet.result);
        }
    }

    fn add_transaction(&mut self, tx: &Transaction) {
        match tx.kind {
            TransactionType::Deposit => self.deposits = self.deposits.saturating_add(tx.amount),
            TransactionType::Withdrawal => {
                self.withdrawals = self.withdrawals.saturating_add(tx.amount)
            }
        }
    }
}

fn terms_by_bookmaker<'a>(
    bets: impl IntoIterator<Item = &'a Bet>,
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> BTreeMap<BookmakerId, Terms> {
    let mut terms: BTreeMap<BookmakerId, Terms> = BTreeMap::new();
    for bet in bets {
        terms.entry(bet.bookmaker_id).or_default().add_bet(bet);
    }
    for tx in transactions {
        terms.entry(tx.bookmaker_id).or_default().add_transaction(tx);
    }
    terms
}

// ---------------------------------------------------------------------------
// Accountant
// ---------------------------------------------------------------------------

pub struct Accountant;

impl Accountant {
    /// Balance of one bookmaker. Records of other bookmakers are ignored.
    pub fn balance(
        bookmaker: &Bookmaker,
        bets: &[Bet],
        transactions: &[Transaction],
    ) -> BalanceBreakdown {
        let mut terms = Terms::default();
        bets.iter()
            .filter(|b| b.bookmaker_id == bookmaker.id)
            .for_each(|b| terms.add_bet(b));
        transactions
            .iter()
            .filter(|t| t.bookmaker_id == bookmaker.id)
            .for_each(|t| terms.add_transaction(t));

        let breakdown = BalanceBreakdown::compose(
            Some(bookmaker.id),
            Some(bookmaker.name.clone()),
            bookmaker.initial_balance,
            &terms,
        );
        debug!(
            bookmaker_id = bookmaker.id,
            balance = %breakdown.balance,
            "Balance computed"
        );
        breakdown
    }

    /// Balance of every given bookmaker, in the order given.
    pub fn balances(
        bookmakers: &[Bookmaker],
        bets: &[Bet],
        transactions: &[Transaction],
    ) -> BalanceReport {
        let mut terms = terms_by_bookmaker(bets, transactions);
        let rows: Vec<BalanceBreakdown> = bookmakers
            .iter()
            .map(|bm| {
                let t = terms.remove(&bm.id).unwrap_or_default();
                BalanceBreakdown::compose(Some(bm.id), Some(bm.name.clone()), bm.initial_balance, &t)
            })
            .collect();
        let total = BalanceBreakdown::total(&rows);
        BalanceReport { rows, total }
    }

    /// Balances counting only bets and transactions dated inside `window`.
    ///
    /// Rows cover every bookmaker seen in the windowed bets or transactions;
    /// a bookmaker with activity on one side only gets zeros on the other.
    /// The initial balance comes from the bookmaker record, or 0 if unknown.
    pub fn period_balances(
        window: DateWindow,
        bookmakers: &[Bookmaker],
        bets: &[Bet],
        transactions: &[Transaction],
    ) -> PeriodBalanceReport {
        let windowed_bets = bets.iter().filter(|b| window.contains(b.placed_on));
        let windowed_txs = transactions.iter().filter(|t| window.contains(t.made_on));
        let terms = terms_by_bookmaker(windowed_bets, windowed_txs);

        let known: BTreeMap<BookmakerId, &Bookmaker> =
            bookmakers.iter().map(|bm| (bm.id, bm)).collect();

        let rows: Vec<BalanceBreakdown> = terms
            .iter()
            .map(|(&id, t)| match known.get(&id) {
                Some(bm) => {
                    BalanceBreakdown::compose(Some(id), Some(bm.name.clone()), bm.initial_balance, t)
                }
                None => BalanceBreakdown::compose(Some(id), None, Decimal::ZERO, t),
            })
            .collect();
        let total = BalanceBreakdown::total(&rows);

        debug!(%window, rows = rows.len(), balance = %total.balance, "Period balance computed");
        PeriodBalanceReport { window, rows, total }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
