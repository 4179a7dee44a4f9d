use super::engine::{apply_growth, scheduled_amount};
use super::error::{ConfigError, ensure_max_years, ensure_non_negative, ensure_rate};
use super::types::{SurvivalCell, SurvivalGrid, SurvivalInputs};

/// Balance left after `duration_years` of inflation-escalated withdrawals,
/// compounding once per year. Returns 0 as soon as the balance runs out and
/// `f64::INFINITY` once it grows past the representable range.
pub fn survival_final_balance(
    corpus: f64,
    return_rate_percent: f64,
    inflation_rate_percent: f64,
    withdrawal_rate_percent: f64,
    duration_years: u32,
) -> f64 {
    let first_withdrawal = corpus * (withdrawal_rate_percent / 100.0);
    let annual_return = return_rate_percent / 100.0;

    let mut balance = corpus;
    for year_index in 0..duration_years {
        balance -= scheduled_amount(first_withdrawal, inflation_rate_percent, year_index);
        if balance <= 0.0 {
            return 0.0;
        }
        balance = apply_growth(balance, annual_return);
        if !balance.is_finite() {
            return f64::INFINITY;
        }
    }
    balance
}

/// Evaluates every withdrawal-rate x duration pair for one corpus.
pub fn build_survival_grid(inputs: &SurvivalInputs) -> Result<SurvivalGrid, ConfigError> {
    validate_inputs(inputs)?;

    let rows = inputs
        .withdrawal_rates
        .iter()
        .map(|&rate| {
            inputs
                .durations
                .iter()
                .map(|&duration| {
                    let final_balance = survival_final_balance(
                        inputs.corpus,
                        inputs.return_rate_percent,
                        inputs.inflation_rate_percent,
                        rate,
                        duration,
                    );
                    if !final_balance.is_finite() {
                        return Err(ConfigError::Overflow {
                            operation: "survival",
                        });
                    }
                    Ok(SurvivalCell {
                        withdrawal_rate_percent: rate,
                        duration_years: duration,
                        final_balance,
                        survived: final_balance > 0.0,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let grid = SurvivalGrid {
        withdrawal_rates: inputs.withdrawal_rates.clone(),
        durations: inputs.durations.clone(),
        rows,
    };
    tracing::debug!(
        rates = grid.withdrawal_rates.len(),
        durations = grid.durations.len(),
        survival_rate = grid.survival_rate(),
        "survival grid built"
    );
    Ok(grid)
}

fn validate_inputs(inputs: &SurvivalInputs) -> Result<(), ConfigError> {
    ensure_non_negative("corpus", inputs.corpus)?;
    ensure_rate("return_rate_percent", inputs.return_rate_percent)?;
    ensure_rate("inflation_rate_percent", inputs.inflation_rate_percent)?;
    for &rate in &inputs.withdrawal_rates {
        ensure_non_negative("withdrawal_rates", rate)?;
    }
    if inputs.durations.contains(&0) {
        return Err(ConfigError::ZeroDuration { field: "durations" });
    }
    for &duration in &inputs.durations {
        ensure_max_years("durations", duration)?;
    }
    Ok(())
}
