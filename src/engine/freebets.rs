//! Freebet ledger rollups and conversion into realised profit.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::money::{percentage, round_money, sum_money};
use crate::types::{Bet, BetType, BookmakerId, Freebet, FreebetStatus};

/// How much of the credited free-bet value a bookmaker turned into profit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebetConversion {
    pub bookmaker_id: Option<BookmakerId>,
    /// Σ amount of credited freebets. Only `received` counts as credited;
    /// pending, claiming, rejected and other credits are left out until
    /// the bookmaker actually grants them.
    pub freebet_amount: Decimal,
    /// Σ result of settled `freeBet` bets.
    pub converted_result: Decimal,
    pub conversion_rate: Decimal,
}

impl FreebetConversion {
    fn new(bookmaker_id: Option<BookmakerId>, freebet_amount: Decimal, converted_result: Decimal) -> Self {
        let freebet_amount = round_money(freebet_amount);
        let converted_result = round_money(converted_result);
        Self {
            bookmaker_id,
            freebet_amount,
            converted_result,
            conversion_rate: percentage(converted_result, freebet_amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub rows: Vec<FreebetConversion>,
    pub total: FreebetConversion,
}

fn is_credited(freebet: &Freebet) -> bool {
    freebet.status == FreebetStatus::Received
}

fn is_converted(bet: &Bet) -> bool {
    bet.bet_type == BetType::FreeBet && bet.status.is_resolved()
}

/// Conversion rate for a single bookmaker.
pub fn conversion_rate(bookmaker_id: BookmakerId, freebets: &[Freebet], bets: &[Bet]) -> FreebetConversion {
    let amount = sum_money(
        freebets
            .iter()
            .filter(|f| f.bookmaker_id == bookmaker_id && is_credited(f))
            .map(|f| f.amount),
    );
    let result = sum_money(
        bets.iter()
            .filter(|b| b.bookmaker_id == bookmaker_id && is_converted(b))
            .map(|b| b.result),
    );
    FreebetConversion::new(Some(bookmaker_id), amount, result)
}

/// Conversion per bookmaker seen on either side, plus the overall rate.
pub fn conversion_report(freebets: &[Freebet], bets: &[Bet]) -> ConversionReport {
    let mut sides: BTreeMap<BookmakerId, (Decimal, Decimal)> = BTreeMap::new();
    for freebet in freebets.iter().filter(|f| is_credited(f)) {
        let side = sides.entry(freebet.bookmaker_id).or_default();
        side.0 = side.0.saturating_add(freebet.amount);
    }
    for bet in bets.iter().filter(|b| is_converted(b)) {
        let side = sides.entry(bet.bookmaker_id).or_default();
        side.1 = side.1.saturating_add(bet.result);
    }

    let rows: Vec<FreebetConversion> = sides
        .into_iter()
        .map(|(id, (amount, result))| FreebetConversion::new(Some(id), amount, result))
        .collect();
    let total = FreebetConversion::new(
        None,
        sum_money(rows.iter().map(|r| r.freebet_amount)),
        sum_money(rows.iter().map(|r| r.converted_result)),
    );

    ConversionReport { rows, total }
}

// ---------------------------------------------------------------------------
// Ledger summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebetStatusTotals {
    pub status: FreebetStatus,
    pub count: usize,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebetSummary {
    pub by_status: Vec<FreebetStatusTotals>,
    pub count: usize,
    pub amount: Decimal,
}

/// Count and value of freebets in every status (zero rows included).
pub fn summarize(freebets: &[Freebet]) -> FreebetSummary {
    let by_status: Vec<FreebetStatusTotals> = FreebetStatus::ALL
        .iter()
        .map(|&status| {
            let matching: Vec<&Freebet> = freebets.iter().filter(|f| f.status == status).collect();
            FreebetStatusTotals {
                status,
                count: matching.len(),
                amount: round_money(sum_money(matching.iter().map(|f| f.amount))),
            }
        })
        .collect();

    FreebetSummary {
        count: freebets.len(),
        amount: sum_money(by_status.iter().map(|s| s.amount)),
        by_status,
    }
}
