use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

pub type Money = Decimal;

pub type Rate = Decimal;

pub const DEFAULT_ANNUAL_RETURN_RATE: Rate = dec!(0.07);
pub const DEFAULT_INFLATION_RATE: Rate = dec!(0.03);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContributionType {
    #[serde(alias = "percentage")]
    Percentage,
    #[serde(alias = "fixed")]
    Fixed,
}

impl FromStr for ContributionType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("PERCENTAGE") {
            Ok(ContributionType::Percentage)
        } else if s.eq_ignore_ascii_case("FIXED") {
            Ok(ContributionType::Fixed)
        } else {
            Err(Error::invalid("invalid contribution type"))
        }
    }
}

impl fmt::Display for ContributionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContributionType::Percentage => f.write_str("PERCENTAGE"),
            ContributionType::Fixed => f.write_str("FIXED"),
        }
    }
}

/// How much the employee puts in each pay period. `rate` is a percent of gross pay for
/// `Percentage` and a currency amount for `Fixed`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionSpec {
    #[serde(rename = "type")]
    pub kind: ContributionType,
    pub rate: Decimal,
}

impl ContributionSpec {
    pub fn percentage(rate: Decimal) -> Self {
        Self {
            kind: ContributionType::Percentage,
            rate,
        }
    }

    pub fn fixed(amount: Money) -> Self {
        Self {
            kind: ContributionType::Fixed,
            rate: amount,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayProfile {
    pub salary: Money,
    pub pay_frequency: u32,
}

/// Employer match: `match_rate` of the employee contribution, with the matchable base
/// capped at `matchable_cap` of gross pay.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MatchPolicy {
    pub match_rate: Rate,
    pub matchable_cap: Rate,
}

impl MatchPolicy {
    pub const STANDARD: MatchPolicy = MatchPolicy {
        match_rate: dec!(0.5),
        matchable_cap: dec!(0.06),
    };

    pub fn max_employer_share(&self) -> Rate {
        self.match_rate * self.matchable_cap
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerPaycheckResult {
    pub employee: Money,
    pub employer: Money,
}

impl PerPaycheckResult {
    pub fn total(&self) -> Result<Money> {
        self.employee
            .checked_add(self.employer)
            .ok_or_else(|| Error::overflow("per-paycheck total"))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub age: Decimal,
    /// Inflation-adjusted balance, except for the opening point which is the raw
    /// starting savings.
    pub savings: Money,
    pub quarter: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRequest {
    pub current_age: u32,
    pub retirement_age: u32,
    pub current_savings: Money,
    pub annual_contribution: Money,
    pub annual_return_rate: Rate,
    pub inflation_rate: Rate,
}

impl ProjectionRequest {
    pub fn new(
        current_age: u32,
        retirement_age: u32,
        current_savings: Money,
        annual_contribution: Money,
    ) -> Self {
        Self {
            current_age,
            retirement_age,
            current_savings,
            annual_contribution,
            annual_return_rate: DEFAULT_ANNUAL_RETURN_RATE,
            inflation_rate: DEFAULT_INFLATION_RATE,
        }
    }

    pub fn with_return_rate(mut self, annual_return_rate: Rate) -> Self {
        self.annual_return_rate = annual_return_rate;
        self
    }

    pub fn with_inflation_rate(mut self, inflation_rate: Rate) -> Self {
        self.inflation_rate = inflation_rate;
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub amount: Money,
    pub employer_match: Money,
}

impl HistoryEntry {
    pub fn total(&self) -> Result<Money> {
        self.amount
            .checked_add(self.employer_match)
            .ok_or_else(|| Error::overflow("history entry total"))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YtdSummary {
    pub year: i32,
    pub total_employee: Money,
    pub total_employer: Money,
    pub total: Money,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImpactRequest {
    pub profile: PayProfile,
    pub contribution: ContributionSpec,
    pub birth_date: NaiveDate,
    pub retirement_age: u32,
    pub as_of: NaiveDate,
    pub history: Vec<HistoryEntry>,
    pub annual_return_rate: Rate,
    pub inflation_rate: Rate,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactResult {
    pub per_paycheck: PerPaycheckResult,
    pub annual_contribution: Money,
    pub current_savings: Money,
    pub current_age: u32,
    pub projection: Vec<ProjectionPoint>,
}
