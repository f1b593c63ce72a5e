use log::debug;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;

use super::error::{Error, Result};
use super::money::{
    ensure_non_negative, ensure_rate_above_total_loss, growth_factor, round_currency,
};
use super::types::{ProjectionPoint, ProjectionRequest};

const MONTHS_PER_YEAR: u32 = 12;
const MONTHS_PER_QUARTER: u32 = 3;
const QUARTERS_PER_YEAR: u32 = MONTHS_PER_YEAR / MONTHS_PER_QUARTER;
pub const MAX_HORIZON_YEARS: u32 = 150;

/// Contributions land at the end of each month after that month's growth. Each quarter
/// point reports the balance discounted to today's money at `inflation_rate`, using the
/// exact elapsed time in years. The opening point carries `current_savings` untouched.
pub fn compute_projection(request: &ProjectionRequest) -> Result<Vec<ProjectionPoint>> {
    validate_request(request)?;

    let years = request.retirement_age - request.current_age;
    let monthly_growth = growth_factor(
        request.annual_return_rate,
        1.0 / f64::from(MONTHS_PER_YEAR),
        "monthly growth factor",
    )?;
    let monthly_contribution = request.annual_contribution / Decimal::from(MONTHS_PER_YEAR);
    debug!(
        "projecting {years} years from age {}: monthly growth {monthly_growth}, monthly contribution {monthly_contribution}",
        request.current_age
    );

    let mut points = Vec::with_capacity((years * QUARTERS_PER_YEAR) as usize + 1);
    points.push(ProjectionPoint {
        age: Decimal::from(request.current_age),
        savings: request.current_savings,
        quarter: 0,
    });

    let mut balance = request.current_savings;
    let mut quarter = 0;
    for year in 0..years {
        for month in 1..=MONTHS_PER_YEAR {
            balance = balance
                .checked_mul(monthly_growth)
                .and_then(|grown| grown.checked_add(monthly_contribution))
                .ok_or_else(|| Error::overflow("monthly balance"))?;

            if month % MONTHS_PER_QUARTER != 0 {
                continue;
            }
            quarter += 1;

            let elapsed_years = Decimal::from(year) + Decimal::from(month) / dec!(12);
            let real_balance = discount_to_today(balance, request, elapsed_years)?;
            points.push(ProjectionPoint {
                age: Decimal::from(request.current_age) + elapsed_years,
                savings: round_currency(real_balance),
                quarter,
            });
        }
    }

    Ok(points)
}

fn validate_request(request: &ProjectionRequest) -> Result<()> {
    if request.retirement_age <= request.current_age {
        return Err(Error::invalid(
            "retirement age must be greater than current age",
        ));
    }
    if request.retirement_age - request.current_age > MAX_HORIZON_YEARS {
        return Err(Error::invalid(
            "projection horizon must not exceed 150 years",
        ));
    }
    ensure_non_negative(
        request.current_savings,
        "current savings must be non-negative",
    )?;
    ensure_non_negative(
        request.annual_contribution,
        "annual contribution must be non-negative",
    )?;
    ensure_rate_above_total_loss(
        request.annual_return_rate,
        "annual return rate must be greater than -100%",
    )?;
    ensure_rate_above_total_loss(
        request.inflation_rate,
        "inflation rate must be greater than -100%",
    )
}

fn discount_to_today(
    nominal: Decimal,
    request: &ProjectionRequest,
    elapsed_years: Decimal,
) -> Result<Decimal> {
    let exponent = elapsed_years
        .to_f64()
        .ok_or_else(|| Error::overflow("elapsed years"))?;
    let inflation_growth = growth_factor(request.inflation_rate, exponent, "inflation discount")?;
    let discount_factor = Decimal::ONE
        .checked_div(inflation_growth)
        .ok_or_else(|| Error::overflow("inflation discount"))?;
    nominal
        .checked_mul(discount_factor)
        .ok_or_else(|| Error::overflow("real balance"))
}
