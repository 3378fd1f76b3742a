//! Betting performance: win rate, ROI and profit over time.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::money::{percentage, round_money, sum_money};
use crate::types::{Bet, BetStatus, BetType, BookmakerId, Granularity};

/// `won / (won + lost) × 100`. Pending bets are not counted.
pub fn win_rate(bets: &[Bet]) -> Decimal {
    let won = bets.iter().filter(|b| b.status == BetStatus::Won).count();
    let lost = bets.iter().filter(|b| b.status == BetStatus::Lost).count();
    percentage(Decimal::from(won), Decimal::from(won + lost))
}

/// `Σresult / Σstake × 100` over every bet given.
pub fn roi(bets: &[Bet]) -> Decimal {
    let result = sum_money(bets.iter().map(|b| b.result));
    let staked = sum_money(bets.iter().map(|b| b.stake));
    percentage(result, staked)
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Counts and money figures for a group of bets.
///
/// `resolved_stake`, `result` and `roi` cover resolved bets only; pending
/// bets show up in the counts and in `pending_liability`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub bets: usize,
    pub pending: usize,
    pub won: usize,
    pub lost: usize,
    pub resolved_stake: Decimal,
    pub result: Decimal,
    pub pending_liability: Decimal,
    pub win_rate: Decimal,
    pub roi: Decimal,
}

impl PerformanceSummary {
    pub fn from_bets<'a>(bets: impl IntoIterator<Item = &'a Bet>) -> Self {
        let mut summary = Self::default();
        for bet in bets {
            summary.bets += 1;
            match bet.status {
                BetStatus::Pending => {
                    summary.pending += 1;
                    summary.pending_liability = summary.pending_liability.saturating_add(bet.liability);
                }
                BetStatus::Won => summary.won += 1,
                BetStatus::Lost => summary.lost += 1,
            }
            if bet.status.is_resolved() {
                summary.resolved_stake = summary.resolved_stake.saturating_add(bet.stake);
                summary.result = summary.result.saturating_add(bet.result);
            }
        }

        summary.resolved_stake = round_money(summary.resolved_stake);
        summary.result = round_money(summary.result);
        summary.pending_liability = round_money(summary.pending_liability);
        summary.win_rate = percentage(
            Decimal::from(summary.won),
            Decimal::from(summary.won + summary.lost),
        );
        summary.roi = percentage(summary.result, summary.resolved_stake);
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookmakerPerformance {
    pub bookmaker_id: BookmakerId,
    #[serde(flatten)]
    pub summary: PerformanceSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BetTypePerformance {
    pub bet_type: BetType,
    #[serde(flatten)]
    pub summary: PerformanceSummary,
}

fn group_by<K: Ord, F: Fn(&Bet) -> K>(bets: &[Bet], key: F) -> BTreeMap<K, Vec<&Bet>> {
    let mut groups: BTreeMap<K, Vec<&Bet>> = BTreeMap::new();
    for bet in bets {
        groups.entry(key(bet)).or_default().push(bet);
    }
    groups
}

/// One summary per bookmaker, ordered by id.
pub fn performance_by_bookmaker(bets: &[Bet]) -> Vec<BookmakerPerformance> {
    group_by(bets, |b| b.bookmaker_id)
        .into_iter()
        .map(|(bookmaker_id, group)| BookmakerPerformance {
            bookmaker_id,
            summary: PerformanceSummary::from_bets(group),
        })
        .collect()
}

/// One summary per bet type present in `bets`.
pub fn performance_by_type(bets: &[Bet]) -> Vec<BetTypePerformance> {
    group_by(bets, |b| b.bet_type)
        .into_iter()
        .map(|(bet_type, group)| BetTypePerformance {
            bet_type,
            summary: PerformanceSummary::from_bets(group),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Profit series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitPoint {
    pub period: String,
    pub settled_bets: usize,
    pub result: Decimal,
    pub cumulative: Decimal,
}

/// Realised result of settled bets per calendar bucket, with a running total.
/// Buckets follow the date the bet was placed.
pub fn profit_by_period(bets: &[Bet], granularity: Granularity) -> Vec<ProfitPoint> {
    let mut buckets: BTreeMap<String, (usize, Decimal)> = BTreeMap::new();
    for bet in bets.iter().filter(|b| b.status.is_resolved()) {
        let entry = buckets
            .entry(granularity.period_of(bet.placed_on))
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(bet.result);
    }

    let mut cumulative = Decimal::ZERO;
    buckets
        .into_iter()
        .map(|(period, (settled_bets, result))| {
            let result = round_money(result);
            cumulative = cumulative.saturating_add(result);
            ProfitPoint {
                period,
                settled_bets,
                result,
                cumulative,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
