//! Settlement calculator: liability, commission and result for one bet.
//!
//! The three `calculate_*` functions are total: they never fail and assume
//! sane inputs. [`settle`] and the lifecycle helpers validate first and
//! report bad data as a [`SettlementError`], so callers can tell
//! "nothing to compute" apart from "bad data provided".

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::money::{percent_of, round_money, MAX_AMOUNT, MAX_ODDS};
use crate::types::{Bet, BetStatus, BetTerms, BetType, NewBet};

const MAX_COMMISSION: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    #[error("Stake must be positive, got {0}")]
    NonPositiveStake(Decimal),

    #[error("Odds must be greater than 1, got {0}")]
    OddsTooLow(Decimal),

    #[error("{0} must not exceed {1}, got {2}")]
    AmountOutOfRange(&'static str, Decimal, Decimal),

    #[error("Commission must be between 0 and 100, got {0}")]
    CommissionOutOfRange(Decimal),

    #[error("Bet {0} is already settled")]
    AlreadySettled(i64),

    #[error("A bet can only be settled as won or lost")]
    NotTerminal,
}

impl SettlementError {
    /// Bad input values, as opposed to a lifecycle violation.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            SettlementError::NonPositiveStake(_)
                | SettlementError::OddsTooLow(_)
                | SettlementError::AmountOutOfRange(..)
                | SettlementError::CommissionOutOfRange(_)
                | SettlementError::NotTerminal
        )
    }
}

// ---------------------------------------------------------------------------
// Pure calculations
// ---------------------------------------------------------------------------

/// Money at risk while the bet is open. Zero once the bet is resolved.
pub fn calculate_liability(
    status: BetStatus,
    bet_type: BetType,
    stake: Decimal,
    odds: Decimal,
) -> Decimal {
    if !status.is_pending() {
        return Decimal::ZERO;
    }
    let liability = match bet_type {
        BetType::LayBet => stake.saturating_mul(odds.saturating_sub(Decimal::ONE)),
        BetType::FreeBet => Decimal::ZERO,
        _ => stake,
    };
    round_money(liability)
}

/// Fee taken from a winning profit: `profit × commission / 100`.
pub fn calculate_commission(profit: Decimal, commission_pct: Decimal) -> Decimal {
    percent_of(profit, commission_pct)
}

/// Net profit or loss of a resolved bet. Zero while pending.
///
/// `liability` is the exposure the bet carried while open; it is what a
/// losing lay bet pays out.
pub fn calculate_result(
    status: BetStatus,
    bet_type: BetType,
    stake: Decimal,
    odds: Decimal,
    liability: Decimal,
    commission_pct: Decimal,
) -> Decimal {
    let result = match (bet_type, status) {
        (_, BetStatus::Pending) => Decimal::ZERO,
        (BetType::LayBet, BetStatus::Won) => {
            stake.saturating_sub(calculate_commission(stake, commission_pct))
        }
        (BetType::LayBet, BetStatus::Lost) => -liability,
        (BetType::FreeBet, BetStatus::Won) => net_back_profit(stake, odds, commission_pct),
        (BetType::FreeBet, BetStatus::Lost) => Decimal::ZERO,
        // Back, mug, personal and other all pay like a back bet.
        (_, BetStatus::Won) => net_back_profit(stake, odds, commission_pct),
        (_, BetStatus::Lost) => -stake,
    };
    round_money(result)
}

fn net_back_profit(stake: Decimal, odds: Decimal, commission_pct: Decimal) -> Decimal {
    let profit = round_money(stake.saturating_mul(odds.saturating_sub(Decimal::ONE)));
    profit.saturating_sub(calculate_commission(profit, commission_pct))
}

// ---------------------------------------------------------------------------
// Validated settlement
// ---------------------------------------------------------------------------

/// Derived settlement fields of a bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub liability: Decimal,
    pub result: Decimal,
}

impl BetTerms {
    pub fn validate(&self) -> Result<(), SettlementError> {
        if self.stake <= Decimal::ZERO {
            return Err(SettlementError::NonPositiveStake(self.stake));
        }
        if self.stake > MAX_AMOUNT {
            return Err(SettlementError::AmountOutOfRange("Stake", MAX_AMOUNT, self.stake));
        }
        if self.odds <= Decimal::ONE {
            return Err(SettlementError::OddsTooLow(self.odds));
        }
        if self.odds > MAX_ODDS {
            return Err(SettlementError::AmountOutOfRange("Odds", MAX_ODDS, self.odds));
        }
        Ok(())
    }
}

fn validate_commission(commission_pct: Decimal) -> Result<(), SettlementError> {
    if commission_pct < Decimal::ZERO || commission_pct > MAX_COMMISSION {
        return Err(SettlementError::CommissionOutOfRange(commission_pct));
    }
    Ok(())
}

/// Validate the inputs and derive `liability` and `result` for `status`.
///
/// A resolved bet's result uses the liability it carried while pending.
pub fn settle(
    terms: &BetTerms,
    status: BetStatus,
    commission_pct: Decimal,
) -> Result<Settlement, SettlementError> {
    terms.validate()?;
    validate_commission(commission_pct)?;

    let open_liability =
        calculate_liability(BetStatus::Pending, terms.bet_type, terms.stake, terms.odds);
    let result = calculate_result(
        status,
        terms.bet_type,
        terms.stake,
        terms.odds,
        open_liability,
        commission_pct,
    );
    let liability = calculate_liability(status, terms.bet_type, terms.stake, terms.odds);

    Ok(Settlement { liability, result })
}

// ---------------------------------------------------------------------------
// Bet lifecycle
// ---------------------------------------------------------------------------

/// Changes allowed on a bet that is still pending.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct BetAmendment {
    pub bet_type: Option<BetType>,
    pub stake: Option<Decimal>,
    pub odds: Option<Decimal>,
    pub description: Option<String>,
    pub placed_on: Option<chrono::NaiveDate>,
}

/// Build a new pending bet. The returned id is 0 until storage assigns one.
pub fn open_bet(new: &NewBet) -> Result<Bet, SettlementError> {
    let terms = BetTerms {
        bet_type: new.bet_type,
        stake: new.stake,
        odds: new.odds,
    };
    let settlement = settle(&terms, BetStatus::Pending, Decimal::ZERO)?;

    Ok(Bet {
        id: 0,
        bookmaker_id: new.bookmaker_id,
        placed_on: new.placed_on,
        description: new.description.clone(),
        bet_type: new.bet_type,
        status: BetStatus::Pending,
        stake: new.stake,
        odds: new.odds,
        liability: settlement.liability,
        result: settlement.result,
    })
}

/// Move a pending bet to `won` or `lost`. Happens exactly once.
pub fn settle_bet(
    bet: &Bet,
    status: BetStatus,
    commission_pct: Decimal,
) -> Result<Bet, SettlementError> {
    if bet.status.is_resolved() {
        return Err(SettlementError::AlreadySettled(bet.id));
    }
    if !status.is_resolved() {
        return Err(SettlementError::NotTerminal);
    }

    let settlement = settle(&bet.terms(), status, commission_pct)?;
    debug!(
        bet_id = bet.id,
        %status,
        result = %settlement.result,
        "Bet settled"
    );

    Ok(Bet {
        status,
        liability: settlement.liability,
        result: settlement.result,
        ..bet.clone()
    })
}

/// Apply changes to a pending bet and recompute its liability.
pub fn amend_bet(bet: &Bet, amendment: &BetAmendment) -> Result<Bet, SettlementError> {
    if bet.status.is_resolved() {
        return Err(SettlementError::AlreadySettled(bet.id));
    }

    let mut amended = bet.clone();
    if let Some(bet_type) = amendment.bet_type {
        amended.bet_type = bet_type;
    }
    if let Some(stake) = amendment.stake {
        amended.stake = stake;
    }
    if let Some(odds) = amendment.odds {
        amended.odds = odds;
    }
    if let Some(description) = &amendment.description {
        amended.description = description.clone();
    }
    if let Some(placed_on) = amendment.placed_on {
        amended.placed_on = placed_on;
    }

    let settlement = settle(&amended.terms(), BetStatus::Pending, Decimal::ZERO)?;
    amended.liability = settlement.liability;
    amended.result = settlement.result;
    Ok(amended)
}

/// Only pending bets may be deleted.
pub fn ensure_deletable(bet: &Bet) -> Result<(), SettlementError> {
    if bet.status.is_resolved() {
        return Err(SettlementError::AlreadySettled(bet.id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
