use super::error::{ConfigError, ensure_max_years, ensure_non_negative, ensure_rate};
use super::types::{Ledger, RateConvention, SimulationConfig, YearRecord};

pub const MONTHS_PER_YEAR: u32 = 12;

/// Negative balances closer to zero than this are float noise and snap to 0.
const BALANCE_EPSILON: f64 = 1e-4;

/// Simple nominal split: `annual / 100 / periods`.
pub fn nominal_period_rate(annual_percent: f64, periods_per_year: u32) -> f64 {
    annual_percent / 100.0 / periods_per_year as f64
}

/// Rate that compounds to exactly `annual_percent` over `periods_per_year` periods.
pub fn effective_period_rate(annual_percent: f64, periods_per_year: u32) -> f64 {
    (1.0 + annual_percent / 100.0).powf(1.0 / periods_per_year as f64) - 1.0
}

pub fn apply_growth(balance: f64, rate: f64) -> f64 {
    balance * (1.0 + rate)
}

impl RateConvention {
    pub fn monthly_rate(self, annual_percent: f64) -> f64 {
        match self {
            RateConvention::NominalMonthly => nominal_period_rate(annual_percent, MONTHS_PER_YEAR),
            RateConvention::EffectiveMonthly => {
                effective_period_rate(annual_percent, MONTHS_PER_YEAR)
            }
        }
    }
}

/// Amount due after `elapsed_periods` annual step-ups. Period 0 pays `base`.
pub fn scheduled_amount(base: f64, step_up_percent: f64, elapsed_periods: u32) -> f64 {
    let factor = 1.0 + step_up_percent / 100.0;
    match i32::try_from(elapsed_periods) {
        Ok(periods) => base * factor.powi(periods),
        Err(_) => base * factor.powf(f64::from(elapsed_periods)),
    }
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round_to_unit(value: f64) -> f64 {
    value.round()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MonthStep {
    pub balance: f64,
    pub withdrawn: f64,
}

/// One month of cash flow: the contribution lands, the withdrawal is capped at
/// what is available, then the remainder grows.
pub(crate) fn step_month(
    balance: f64,
    contribution: f64,
    desired_withdrawal: f64,
    monthly_rate: f64,
) -> MonthStep {
    let available = balance + contribution;
    let withdrawn = desired_withdrawal.min(available).max(0.0);
    MonthStep {
        balance: apply_growth(available - withdrawn, monthly_rate),
        withdrawn,
    }
}

pub fn validate_config(config: &SimulationConfig) -> Result<(), ConfigError> {
    ensure_max_years("contribution_years", config.contribution_years)?;
    ensure_max_years("withdrawal_years", config.withdrawal_years)?;
    if config.horizon_years() == 0 {
        return Err(ConfigError::EmptyHorizon);
    }
    ensure_non_negative("base_contribution", config.base_contribution)?;
    ensure_rate("annual_return_percent", config.annual_return_percent)?;
    ensure_non_negative(
        "contribution_step_up_percent",
        config.contribution_step_up_percent,
    )?;
    ensure_non_negative("base_withdrawal", config.base_withdrawal)?;
    ensure_non_negative(
        "withdrawal_step_up_percent",
        config.withdrawal_step_up_percent,
    )?;
    Ok(())
}

/// Runs the contribution phase followed immediately by the withdrawal phase and
/// returns one row per year.
pub fn simulate(config: &SimulationConfig) -> Result<Ledger, ConfigError> {
    validate_config(config)?;

    let monthly_rate = config
        .rate_convention
        .monthly_rate(config.annual_return_percent);
    let horizon = config.horizon_years();
    let withdrawal_start = config.contribution_years.saturating_add(1);

    let mut balance = 0.0;
    let mut cumulative_contributed = 0.0;
    let mut cumulative_withdrawn = 0.0;
    let mut years = Vec::with_capacity(horizon as usize);

    for year in 1..=horizon {
        let monthly_contribution = (year <= config.contribution_years).then(|| {
            round_to_cents(scheduled_amount(
                config.base_contribution,
                config.contribution_step_up_percent,
                year - 1,
            ))
        });
        let monthly_withdrawal = (year >= withdrawal_start).then(|| {
            round_to_cents(scheduled_amount(
                config.base_withdrawal,
                config.withdrawal_step_up_percent,
                year - withdrawal_start,
            ))
        });

        let begin_balance = balance;
        let contribution = monthly_contribution.unwrap_or(0.0);
        let desired_withdrawal = monthly_withdrawal.unwrap_or(0.0);
        let mut withdrawn = 0.0;
        for _ in 0..MONTHS_PER_YEAR {
            let step = step_month(balance, contribution, desired_withdrawal, monthly_rate);
            withdrawn += step.withdrawn;
            balance = clamp_dust(step.balance, year);
        }
        if !balance.is_finite() {
            return Err(ConfigError::Overflow {
                operation: "simulate",
            });
        }

        let annual_contribution = contribution * MONTHS_PER_YEAR as f64;
        let annual_withdrawal = monthly_withdrawal.map(|_| withdrawn);
        cumulative_contributed += annual_contribution;
        if let Some(amount) = annual_withdrawal {
            cumulative_withdrawn += amount;
        }
        let interest_earned = balance - (begin_balance + annual_contribution - withdrawn);

        years.push(YearRecord {
            year,
            begin_balance: round_to_unit(begin_balance),
            monthly_contribution,
            annual_contribution: round_to_cents(annual_contribution),
            cumulative_contributed: round_to_cents(cumulative_contributed),
            monthly_withdrawal,
            annual_withdrawal: annual_withdrawal.map(round_to_cents),
            cumulative_withdrawn: round_to_cents(cumulative_withdrawn),
            interest_earned: round_to_unit(interest_earned),
            end_balance: round_to_unit(balance),
        });
    }

    tracing::debug!(
        contribution_years = config.contribution_years,
        withdrawal_years = config.withdrawal_years,
        convention = ?config.rate_convention,
        final_balance = balance,
        "simulation complete"
    );

    Ok(Ledger { years })
}

fn clamp_dust(balance: f64, year: u32) -> f64 {
    if balance < 0.0 && balance >= -BALANCE_EPSILON {
        return 0.0;
    }
    if balance < 0.0 {
        tracing::warn!(year, balance, "balance went negative beyond rounding tolerance");
    }
    balance
}
