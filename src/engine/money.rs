//! Money helpers shared by every derived value.
//!
//! All rounding goes through [`round_money`] so settlement fields and
//! report figures agree to the cent.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Decimal places kept on every monetary figure.
pub const MONEY_DP: u32 = 2;

/// Largest stake or cash amount accepted on input.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Largest decimal odds accepted on input.
pub const MAX_ODDS: Decimal = dec!(1000000);

const ONE_HUNDRED: Decimal = dec!(100);

/// Round half-up (away from zero on a tie) to two decimal places.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// `part / whole × 100`, rounded. A zero `whole` yields 0.
/// Results beyond the `Decimal` range saturate.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    match part.checked_div(whole) {
        Some(ratio) => round_money(ratio.saturating_mul(ONE_HUNDRED)),
        None if part.is_sign_negative() != whole.is_sign_negative() => Decimal::MIN,
        None => Decimal::MAX,
    }
}

/// `value × pct / 100`, rounded.
pub fn percent_of(value: Decimal, pct: Decimal) -> Decimal {
    round_money(value.saturating_mul(pct) / ONE_HUNDRED)
}

/// Sum that saturates at the `Decimal` bounds instead of overflowing.
pub fn sum_money<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}
