use serde::{Deserialize, Serialize};

use super::{ContributionType, InvestmentOption, Paise, paise_to_rupees, whole_rupees_to_paise};

/// Projected outcome of investing in a product, rounded to whole rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub total_invested: Paise,
    pub maturity_value: Paise,
}

impl Projection {
    pub fn estimated_gain(&self) -> Paise {
        self.maturity_value - self.total_invested
    }
}

/// Longest horizon `project` accepts: fifty years.
pub const MAX_DURATION_MONTHS: u32 = 600;

/// Largest amount `project` accepts: ₹1,000 crore.
pub const MAX_PROJECTION_AMOUNT: Paise = 1_000_000_000_000;

/// Compute projected returns without validating the inputs.
///
/// Lumpsum compounds annually over `duration_months / 12` years. Recurring
/// contributions (SIP, RD) use the future value of an annuity-due with a
/// monthly rate of `interest_rate / 12`. A zero rate yields the amount
/// invested, and a zero duration never divides. Fails only when a result
/// is not finite or does not fit in `Paise`.
pub fn compute_returns(
    contribution_type: ContributionType,
    interest_rate: f64,
    amount: Paise,
    duration_months: u32,
) -> Result<Projection, ProjectionError> {
    let amount = paise_to_rupees(amount);
    let months = f64::from(duration_months);
    let rate = interest_rate / 100.0;

    let (total_invested, maturity_value) = if contribution_type.is_recurring() {
        let total = amount * months;
        let monthly_rate = rate / 12.0;
        let maturity = if monthly_rate == 0.0 {
            total
        } else {
            amount * (((1.0 + monthly_rate).powf(months) - 1.0) / monthly_rate)
                * (1.0 + monthly_rate)
        };
        (total, maturity)
    } else {
        let years = months / 12.0;
        (amount, amount * (1.0 + rate).powf(years))
    };

    let out_of_range = || {
        ProjectionError::InvalidInput(format!(
            "projection over {duration_months} months is out of range"
        ))
    };
    Ok(Projection {
        total_invested: whole_rupees_to_paise(total_invested).ok_or_else(out_of_range)?,
        maturity_value: whole_rupees_to_paise(maturity_value).ok_or_else(out_of_range)?,
    })
}

/// Project returns for `option`, rejecting inputs the calculator cannot use.
pub fn project(
    option: &InvestmentOption,
    amount: Paise,
    duration_months: u32,
) -> Result<Projection, ProjectionError> {
    if amount <= 0 {
        return Err(ProjectionError::InvalidInput(
            "amount must be positive".to_string(),
        ));
    }
    if amount > MAX_PROJECTION_AMOUNT {
        return Err(ProjectionError::InvalidInput(format!(
            "amount must be at most {MAX_PROJECTION_AMOUNT} paise"
        )));
    }
    if duration_months == 0 || duration_months > MAX_DURATION_MONTHS {
        return Err(ProjectionError::InvalidInput(format!(
            "duration must be between 1 and {MAX_DURATION_MONTHS} months"
        )));
    }
    if !option.interest_rate.is_finite() || option.interest_rate < 0.0 {
        return Err(ProjectionError::InvalidInput(format!(
            "interest rate {} is not usable",
            option.interest_rate
        )));
    }

    compute_returns(
        option.contribution_type,
        option.interest_rate,
        amount,
        duration_months,
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    InvalidInput(String),
}

impl std::fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionError::InvalidInput(reason) => write!(f, "Invalid projection input: {reason}"),
        }
    }
}

impl std::error::Error for ProjectionError {}
