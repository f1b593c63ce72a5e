use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::{Error, Result};
use super::money::{ensure_non_negative, round_currency};
use super::types::{
    ContributionSpec, ContributionType, MatchPolicy, Money, PayProfile, PerPaycheckResult,
};

pub fn compute_per_paycheck(
    profile: &PayProfile,
    contribution: &ContributionSpec,
) -> Result<PerPaycheckResult> {
    compute_per_paycheck_with_policy(profile, contribution, &MatchPolicy::STANDARD)
}

pub fn compute_per_paycheck_with_policy(
    profile: &PayProfile,
    contribution: &ContributionSpec,
    policy: &MatchPolicy,
) -> Result<PerPaycheckResult> {
    let gross = validate_contribution_inputs(profile, contribution.rate)?;

    let employee = match contribution.kind {
        ContributionType::Percentage => gross
            .checked_mul(contribution.rate / dec!(100))
            .ok_or_else(|| Error::overflow("employee contribution"))?,
        ContributionType::Fixed => contribution.rate,
    };

    let matchable_cap = gross
        .checked_mul(policy.matchable_cap)
        .ok_or_else(|| Error::overflow("matchable base"))?;
    let employer = employee
        .min(matchable_cap)
        .checked_mul(policy.match_rate)
        .ok_or_else(|| Error::overflow("employer match"))?;

    Ok(PerPaycheckResult {
        employee: round_currency(employee),
        employer: round_currency(employer),
    })
}

/// Checks salary, pay frequency and contribution rate, in that order, and returns the
/// gross pay they imply. The contribution type plays no part.
pub fn validate_contribution_inputs(profile: &PayProfile, rate: Decimal) -> Result<Money> {
    ensure_non_negative(profile.salary, "salary must be non-negative")?;
    let gross = gross_pay(profile)?;
    ensure_non_negative(rate, "contribution rate must be non-negative")?;
    Ok(gross)
}

pub fn gross_pay(profile: &PayProfile) -> Result<Money> {
    if profile.pay_frequency == 0 {
        return Err(Error::invalid("pay frequency must be positive"));
    }
    Ok(round_currency(profile.salary / Decimal::from(profile.pay_frequency)))
}
