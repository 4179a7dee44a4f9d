use super::engine::{MONTHS_PER_YEAR, step_month};
use super::error::{ConfigError, ensure_max_years, ensure_non_negative, ensure_rate};
use super::types::{RateConvention, ScenarioLabel, ScenarioPath, ScenarioResult, SequenceInputs};

/// Years at the start of retirement whose return is overridden per scenario.
const SHOCK_YEARS: usize = 2;

/// Annual return percent for each withdrawal year under `label`.
pub fn return_schedule(inputs: &SequenceInputs, label: ScenarioLabel) -> Vec<f64> {
    let shock = match label {
        ScenarioLabel::Bear => inputs.bear_return_percent,
        ScenarioLabel::Flat => inputs.avg_return_percent,
        ScenarioLabel::Bull => inputs.bull_return_percent,
    };
    (0..inputs.years as usize)
        .map(|index| {
            if index < SHOCK_YEARS {
                shock
            } else {
                inputs.avg_return_percent
            }
        })
        .collect()
}

/// Runs the same withdrawal plan under bear, flat and bull opening years.
pub fn analyze_sequence_risk(inputs: &SequenceInputs) -> Result<ScenarioResult, ConfigError> {
    validate_inputs(inputs)?;

    let [bear, flat, bull] = ScenarioLabel::ALL.map(|label| run_scenario(inputs, label));
    let (bear, flat, bull) = (bear?, flat?, bull?);
    tracing::debug!(
        years = inputs.years,
        bear_final = bear.final_balance(),
        flat_final = flat.final_balance(),
        bull_final = bull.final_balance(),
        "sequence-of-returns analysis complete"
    );

    Ok(ScenarioResult {
        years: (0..=inputs.years).collect(),
        bear,
        flat,
        bull,
    })
}

fn run_scenario(
    inputs: &SequenceInputs,
    label: ScenarioLabel,
) -> Result<ScenarioPath, ConfigError> {
    let returns = return_schedule(inputs, label);
    let increase = 1.0 + inputs.withdrawal_increase_percent / 100.0;

    let mut balance = inputs.initial_corpus;
    let mut monthly_withdrawal = inputs.monthly_withdrawal;
    let mut balances = Vec::with_capacity(returns.len() + 1);
    let mut depleted_in_year = None;
    balances.push(balance);

    for (index, annual_return) in returns.iter().enumerate() {
        // Depletion is absorbing.
        if balance <= 0.0 {
            balances.push(0.0);
            continue;
        }
        let monthly_rate = RateConvention::EffectiveMonthly.monthly_rate(*annual_return);
        for _ in 0..MONTHS_PER_YEAR {
            balance = step_month(balance, 0.0, monthly_withdrawal, monthly_rate)
                .balance
                .max(0.0);
        }
        if !balance.is_finite() {
            return Err(ConfigError::Overflow {
                operation: "sequence",
            });
        }
        monthly_withdrawal *= increase;
        if balance <= 0.0 && depleted_in_year.is_none() {
            depleted_in_year = Some(index as u32 + 1);
        }
        balances.push(balance);
    }

    Ok(ScenarioPath {
        label,
        returns,
        balances,
        depleted_in_year,
    })
}

fn validate_inputs(inputs: &SequenceInputs) -> Result<(), ConfigError> {
    ensure_non_negative("initial_corpus", inputs.initial_corpus)?;
    ensure_non_negative("monthly_withdrawal", inputs.monthly_withdrawal)?;
    if inputs.years == 0 {
        return Err(ConfigError::ZeroDuration { field: "years" });
    }
    ensure_max_years("years", inputs.years)?;
    ensure_non_negative(
        "withdrawal_increase_percent",
        inputs.withdrawal_increase_percent,
    )?;
    ensure_rate("avg_return_percent", inputs.avg_return_percent)?;
    ensure_rate("bear_return_percent", inputs.bear_return_percent)?;
    ensure_rate("bull_return_percent", inputs.bull_return_percent)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_inputs() -> SequenceInputs {
        SequenceInputs {
            initial_corpus: 10_000_000.0,
            monthly_withdrawal: 50_000.0,
            years: 30,
            withdrawal_increase_percent: 5.0,
            avg_return_percent: 10.0,
            bear_return_percent: -20.0,
            bull_return_percent: 25.0,
        }
    }

    #[test]
    fn schedules_override_only_first_two_years() {
        let inputs = sample_inputs();
        let bear = return_schedule(&inputs, ScenarioLabel::Bear);
        let flat = return_schedule(&inputs, ScenarioLabel::Flat);
        let bull = return_schedule(&inputs, ScenarioLabel::Bull);

        assert_eq!(bear.len(), 30);
        assert_eq!(&bear[..3], &[-20.0, -20.0, 10.0]);
        assert!(flat.iter().all(|r| *r == 10.0));
        assert_eq!(&bull[..3], &[25.0, 25.0, 10.0]);
        assert_eq!(&bear[2..], &bull[2..]);
    }

    #[test]
    fn one_year_schedule_overrides_only_year_one() {
        let mut inputs = sample_inputs();
        inputs.years = 1;
        assert_eq!(return_schedule(&inputs, ScenarioLabel::Bear), vec![-20.0]);
    }

    #[test]
    fn no_withdrawal_compounds_effective_rate_exactly() {
        let mut inputs = sample_inputs();
        inputs.initial_corpus = 1_000.0;
        inputs.monthly_withdrawal = 0.0;
        inputs.years = 3;

        let result = analyze_sequence_risk(&inputs).expect("valid inputs");
        assert_eq!(result.years, vec![0, 1, 2, 3]);
        assert_approx_tol(result.flat.balances[1], 1_100.0, 1e-6);
        assert_approx_tol(result.flat.balances[3], 1_331.0, 1e-6);
        assert_approx_tol(result.bear.balances[2], 640.0, 1e-6);
        assert_approx_tol(result.bull.balances[3], 1_718.75, 1e-6);
    }

    #[test]
    fn bull_outlasts_flat_outlasts_bear() {
        let result = analyze_sequence_risk(&sample_inputs()).expect("valid inputs");
        for label in ScenarioLabel::ALL {
            let path = result.scenario(label);
            assert_eq!(path.balances.len(), 31);
            assert_eq!(path.balances[0], 10_000_000.0);
            assert_eq!(path.label, label);
        }
        assert!(result.bear.balances[2] < result.flat.balances[2]);
        assert!(result.flat.balances[2] < result.bull.balances[2]);
        assert!(result.bear.final_balance() <= result.flat.final_balance());
        assert!(result.flat.final_balance() <= result.bull.final_balance());
    }

    #[test]
    fn depleted_portfolio_stays_depleted() {
        let mut inputs = sample_inputs();
        inputs.initial_corpus = 1_000_000.0;
        inputs.monthly_withdrawal = 40_000.0;
        inputs.years = 10;

        let result = analyze_sequence_risk(&inputs).expect("valid inputs");
        let bear = &result.bear;
        let depleted = bear.depleted_in_year.expect("bear path must run dry") as usize;
        assert!(depleted <= 3);
        assert!(bear.balances[depleted..].iter().all(|b| *b == 0.0));
        assert!(bear.balances[..depleted].iter().all(|b| *b > 0.0));
    }

    #[test]
    fn analyze_rejects_invalid_inputs() {
        let mut inputs = sample_inputs();
        inputs.years = 0;
        assert_eq!(
            analyze_sequence_risk(&inputs),
            Err(ConfigError::ZeroDuration { field: "years" })
        );

        let mut inputs = sample_inputs();
        inputs.bear_return_percent = -100.0;
        assert!(matches!(
            analyze_sequence_risk(&inputs),
            Err(ConfigError::RateBelowTotalLoss {
                field: "bear_return_percent",
                ..
            })
        ));

        let mut inputs = sample_inputs();
        inputs.years = 1_001;
        assert!(matches!(
            analyze_sequence_risk(&inputs),
            Err(ConfigError::DurationTooLarge { field: "years", .. })
        ));
    }

    #[test]
    fn runaway_growth_is_reported_not_serialized_as_infinity() {
        let inputs = SequenceInputs {
            monthly_withdrawal: 0.0,
            years: 200,
            avg_return_percent: 1_000_000.0,
            ..sample_inputs()
        };
        assert_eq!(
            analyze_sequence_risk(&inputs),
            Err(ConfigError::Overflow {
                operation: "sequence"
            })
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(40))]

        #[test]
        fn prop_raising_bear_return_never_lowers_bear_final_balance(
            corpus in 100_000u32..20_000_000,
            withdrawal in 0u32..200_000,
            years in 1u32..40,
            increase_bp in 0u32..1_000,
            avg_bp in -500i32..1_500,
            bear_gap_bp in 1u32..5_000,
            step_fraction in 0u32..=100,
        ) {
            let avg = avg_bp as f64 / 100.0;
            let bear = (avg - bear_gap_bp as f64 / 100.0).max(-99.0);
            let raised = bear + (avg - bear) * step_fraction as f64 / 100.0;
            let mut inputs = SequenceInputs {
                initial_corpus: corpus as f64,
                monthly_withdrawal: withdrawal as f64,
                years,
                withdrawal_increase_percent: increase_bp as f64 / 100.0,
                avg_return_percent: avg,
                bear_return_percent: bear,
                bull_return_percent: avg + 10.0,
            };
            let low = analyze_sequence_risk(&inputs).expect("valid inputs");
            inputs.bear_return_percent = raised;
            let high = analyze_sequence_risk(&inputs).expect("valid inputs");

            prop_assert_eq!(low.bear.balances.len(), years as usize + 1);
            prop_assert!(
                high.bear.final_balance() + 1e-6 * corpus as f64 >= low.bear.final_balance()
            );
            for label in ScenarioLabel::ALL {
                prop_assert!(high.scenario(label).balances.iter().all(|b| *b >= 0.0));
            }
        }
    }
}
