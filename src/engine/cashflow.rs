//! Deposit, withdrawal and net cashflow summaries.
//!
//! Shares are always taken against the grand total across every group,
//! never within a group.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::money::{percentage, round_money, sum_money};
use crate::types::{BookmakerId, Granularity, Transaction, TransactionType};

/// How transactions are bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    Day,
    Month,
    Year,
    Bookmaker,
}

impl Default for Grouping {
    fn default() -> Self {
        Grouping::Month
    }
}

/// Group label: a period string or a bookmaker id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Period(String),
    Bookmaker(BookmakerId),
}

impl Grouping {
    pub fn key_of(&self, tx: &Transaction) -> GroupKey {
        match self {
            Grouping::Day => GroupKey::Period(Granularity::Day.period_of(tx.made_on)),
            Grouping::Month => GroupKey::Period(Granularity::Month.period_of(tx.made_on)),
            Grouping::Year => GroupKey::Period(Granularity::Year.period_of(tx.made_on)),
            Grouping::Bookmaker => GroupKey::Bookmaker(tx.bookmaker_id),
        }
    }
}

// ---------------------------------------------------------------------------
// Single-direction summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountStats {
    pub key: GroupKey,
    pub count: usize,
    pub total: Decimal,
    pub average: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    /// Percentage of the grand total across all groups.
    pub share_of_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountReport {
    pub kind: TransactionType,
    pub groups: Vec<AmountStats>,
    pub count: usize,
    pub total: Decimal,
    pub average: Decimal,
}

/// Summarize one transaction direction (deposits or withdrawals).
pub fn amount_report(
    transactions: &[Transaction],
    kind: TransactionType,
    grouping: Grouping,
) -> AmountReport {
    let mut groups: BTreeMap<GroupKey, Vec<Decimal>> = BTreeMap::new();
    for tx in transactions.iter().filter(|t| t.kind == kind) {
        groups.entry(grouping.key_of(tx)).or_default().push(tx.amount);
    }

    let grand_total = round_money(sum_money(groups.values().flatten().copied()));
    let count: usize = groups.values().map(Vec::len).sum();

    let groups = groups
        .into_iter()
        .map(|(key, amounts)| {
            let total = round_money(sum_money(amounts.iter().copied()));
            AmountStats {
                key,
                count: amounts.len(),
                total,
                average: average(total, amounts.len()),
                min: round_money(amounts.iter().copied().min().unwrap_or_default()),
                max: round_money(amounts.iter().copied().max().unwrap_or_default()),
                share_of_total: percentage(total, grand_total),
            }
        })
        .collect();

    AmountReport {
        kind,
        groups,
        count,
        total: grand_total,
        average: average(grand_total, count),
    }
}

fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    round_money(total / Decimal::from(count))
}

// ---------------------------------------------------------------------------
// Net cashflow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashflowRow {
    pub key: GroupKey,
    pub deposits: Decimal,
    pub withdrawals: Decimal,
    pub net: Decimal,
    pub deposit_share: Decimal,
    pub withdrawal_share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashflowReport {
    pub rows: Vec<CashflowRow>,
    pub total_deposits: Decimal,
    pub total_withdrawals: Decimal,
    pub net: Decimal,
}

/// Deposits against withdrawals per group.
pub fn cashflow(transactions: &[Transaction], grouping: Grouping) -> CashflowReport {
    let mut groups: BTreeMap<GroupKey, (Decimal, Decimal)> = BTreeMap::new();
    for tx in transactions {
        let entry = groups.entry(grouping.key_of(tx)).or_default();
        match tx.kind {
            TransactionType::Deposit => entry.0 = entry.0.saturating_add(tx.amount),
            TransactionType::Withdrawal => entry.1 = entry.1.saturating_add(tx.amount),
        }
    }

    let rounded: Vec<(GroupKey, Decimal, Decimal)> = groups
        .into_iter()
        .map(|(key, (d, w))| (key, round_money(d), round_money(w)))
        .collect();
    let total_deposits = sum_money(rounded.iter().map(|(_, d, _)| *d));
    let total_withdrawals = sum_money(rounded.iter().map(|(_, _, w)| *w));

    let rows = rounded
        .into_iter()
        .map(|(key, deposits, withdrawals)| CashflowRow {
            key,
            deposits,
            withdrawals,
            net: deposits.saturating_sub(withdrawals),
            deposit_share: percentage(deposits, total_deposits),
            withdrawal_share: percentage(withdrawals, total_withdrawals),
        })
        .collect();

    CashflowReport {
        rows,
        total_deposits,
        total_withdrawals,
        net: total_deposits.saturating_sub(total_withdrawals),
    }
}
