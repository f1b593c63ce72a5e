use chrono::Datelike;
use log::debug;
use rust_decimal::Decimal;

use super::error::{Error, Result};
use super::money::checked_sum;
use super::paycheck::compute_per_paycheck;
use super::projection::compute_projection;
use super::types::{HistoryEntry, ImpactRequest, ImpactResult, ProjectionRequest, YtdSummary};

/// The projection starts from everything already contributed, match included, and adds a
/// full year of paychecks every year until retirement.
pub fn compute_impact(request: &ImpactRequest) -> Result<ImpactResult> {
    let per_paycheck = compute_per_paycheck(&request.profile, &request.contribution)?;
    let annual_contribution = per_paycheck
        .total()?
        .checked_mul(Decimal::from(request.profile.pay_frequency))
        .ok_or_else(|| Error::overflow("annual contribution"))?;

    if request.birth_date > request.as_of {
        return Err(Error::invalid(
            "birth date must not be after the as-of date",
        ));
    }
    let current_age = u32::try_from(request.as_of.year() - request.birth_date.year())
        .map_err(|_| Error::invalid("birth date must not be after the as-of date"))?;

    let current_savings = request
        .history
        .iter()
        .map(HistoryEntry::total)
        .try_fold(Decimal::ZERO, |acc, total| {
            acc.checked_add(total?)
                .ok_or_else(|| Error::overflow("current savings"))
        })?;
    debug!(
        "impact for age {current_age}: {} per year on {} saved so far",
        annual_contribution, current_savings
    );

    let projection_request = ProjectionRequest {
        current_age,
        retirement_age: request.retirement_age,
        current_savings,
        annual_contribution,
        annual_return_rate: request.annual_return_rate,
        inflation_rate: request.inflation_rate,
    };
    let projection = compute_projection(&projection_request)?;

    Ok(ImpactResult {
        per_paycheck,
        annual_contribution,
        current_savings,
        current_age,
        projection,
    })
}

/// Entries from other years are dropped; the rest keep their input order.
pub fn summarize_ytd(entries: &[HistoryEntry], year: i32) -> Result<YtdSummary> {
    let entries: Vec<HistoryEntry> = entries
        .iter()
        .filter(|entry| entry.date.year() == year)
        .copied()
        .collect();
    let total_employee = checked_sum(entries.iter().map(|entry| entry.amount), "ytd employee")?;
    let total_employer = checked_sum(
        entries.iter().map(|entry| entry.employer_match),
        "ytd employer",
    )?;
    let total = total_employee
        .checked_add(total_employer)
        .ok_or_else(|| Error::overflow("ytd total"))?;

    Ok(YtdSummary {
        year,
        total_employee,
        total_employer,
        total,
        entries,
    })
}
