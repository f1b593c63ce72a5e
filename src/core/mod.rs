mod error;
mod impact;
mod money;
mod paycheck;
mod projection;
mod types;

pub use error::{Error, Result};
pub use impact::{compute_impact, summarize_ytd};
pub use money::round_currency;
pub use paycheck::{
    compute_per_paycheck, compute_per_paycheck_with_policy, gross_pay,
    validate_contribution_inputs,
};
pub use projection::{MAX_HORIZON_YEARS, compute_projection};
pub use types::{
    ContributionSpec, ContributionType, DEFAULT_ANNUAL_RETURN_RATE, DEFAULT_INFLATION_RATE,
    HistoryEntry, ImpactRequest, ImpactResult, MatchPolicy, Money, PayProfile,
    PerPaycheckResult, ProjectionPoint, ProjectionRequest, Rate, YtdSummary,
};
