use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::{Error, Result};
use super::types::{Money, Rate};

pub const CURRENCY_DP: u32 = 2;

pub fn round_currency(value: Money) -> Money {
    value.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero)
}

pub(crate) fn ensure_non_negative(value: Decimal, reason: &'static str) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(Error::invalid(reason));
    }
    Ok(())
}

pub(crate) fn ensure_rate_above_total_loss(rate: Rate, reason: &'static str) -> Result<()> {
    if rate <= Decimal::NEGATIVE_ONE {
        return Err(Error::invalid(reason));
    }
    Ok(())
}

pub(crate) fn checked_sum<I>(values: I, context: &'static str) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, |acc, value| {
        acc.checked_add(value).ok_or_else(|| Error::overflow(context))
    })
}

/// `(1 + rate)^exponent` for a unitless rate. Fractional powers go through `f64`; the
/// result is brought back into `Decimal` before it touches any money.
pub(crate) fn growth_factor(rate: Rate, exponent: f64, context: &'static str) -> Result<Decimal> {
    let base = (Decimal::ONE + rate)
        .to_f64()
        .ok_or_else(|| Error::overflow(context))?;
    let factor = base.powf(exponent);
    if !factor.is_finite() {
        return Err(Error::overflow(context));
    }
    Decimal::from_f64(factor).ok_or_else(|| Error::overflow(context))
}
