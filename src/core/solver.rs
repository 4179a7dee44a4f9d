use super::engine::{MONTHS_PER_YEAR, step_month};
use super::error::{
    ConfigError, ensure_finite, ensure_max_years, ensure_non_negative, ensure_rate,
};
use super::types::{GoalInputs, GoalOutcome, GoalSolveIteration, RateConvention};

/// Search domain and stopping rules for the step-up bisection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalSolveConfig {
    pub search_min: f64,
    pub search_max: f64,
    pub precision: f64,
    pub max_iterations: u32,
}

impl Default for GoalSolveConfig {
    fn default() -> Self {
        Self {
            search_min: 0.0,
            search_max: 100.0,
            precision: 0.01,
            max_iterations: 100,
        }
    }
}

/// Balance after `years` of monthly contributions under the nominal monthly
/// rate. The contribution steps up by `step_up_percent` after every 12 months.
pub fn future_value(
    initial_contribution: f64,
    years: u32,
    annual_return_percent: f64,
    step_up_percent: f64,
) -> f64 {
    let monthly_rate = RateConvention::NominalMonthly.monthly_rate(annual_return_percent);
    let step_up = 1.0 + step_up_percent / 100.0;

    let mut balance = 0.0;
    let mut contribution = initial_contribution;
    for _ in 0..years {
        for _ in 0..MONTHS_PER_YEAR {
            balance = step_month(balance, contribution, 0.0, monthly_rate).balance;
        }
        contribution *= step_up;
    }
    balance
}

pub fn reverse_goal(inputs: &GoalInputs) -> Result<GoalOutcome, ConfigError> {
    reverse_goal_with(inputs, GoalSolveConfig::default())
}

/// Finds the smallest annual step-up that lifts the contribution-only future
/// value to `inputs.target`.
///
/// Bisection assumes `future_value` is non-decreasing in the step-up. That holds
/// for non-negative contributions and rates above -100%; debug builds assert it
/// at every probe.
///
/// Only a target strictly below the minimum-step-up value short-circuits to
/// `search_min`. A target exactly equal to it still runs the search, which
/// lands within `precision` above `search_min`.
pub fn reverse_goal_with(
    inputs: &GoalInputs,
    config: GoalSolveConfig,
) -> Result<GoalOutcome, ConfigError> {
    validate_inputs(inputs)?;
    validate_config(config)?;

    let evaluate = |step_up: f64| {
        future_value(
            inputs.initial_contribution,
            inputs.years,
            inputs.annual_return_percent,
            step_up,
        )
    };

    let high_value = evaluate(config.search_max);
    if !high_value.is_finite() {
        return Err(ConfigError::Overflow { operation: "goal" });
    }
    if high_value < inputs.target {
        tracing::debug!(
            target_value = inputs.target,
            max_future_value = high_value,
            "goal not achievable within step-up bounds"
        );
        return Ok(GoalOutcome::Unachievable {
            max_step_up_percent: config.search_max,
            max_future_value: high_value,
        });
    }

    let low_value = evaluate(config.search_min);
    if low_value > inputs.target {
        tracing::debug!(
            target_value = inputs.target,
            future_value = low_value,
            "goal already met at minimum step-up"
        );
        return Ok(GoalOutcome::Achievable {
            step_up_percent: config.search_min,
            future_value: low_value,
            converged: true,
            iterations: Vec::new(),
        });
    }

    let mut lo = config.search_min;
    let mut hi = config.search_max;
    let mut lo_value = low_value;
    let mut hi_value = high_value;
    let mut iterations = Vec::new();
    let mut converged = false;

    for iteration in 1..=config.max_iterations {
        if hi - lo < config.precision {
            converged = true;
            break;
        }
        let mid = (lo + hi) * 0.5;
        let value = evaluate(mid);
        debug_assert!(
            {
                let slack = 1e-9 * hi_value.abs().max(1.0);
                value >= lo_value - slack && value <= hi_value + slack
            },
            "future value is not monotonic in step-up at {mid}"
        );
        iterations.push(GoalSolveIteration {
            iteration,
            lower_bound: lo,
            upper_bound: hi,
            candidate_step_up: mid,
            future_value: value,
        });

        if value < inputs.target {
            lo = mid;
            lo_value = value;
        } else {
            hi = mid;
            hi_value = value;
        }
    }
    if !converged && hi - lo < config.precision {
        converged = true;
    }

    let step_up_percent = (lo + hi) * 0.5;
    let future_value = evaluate(step_up_percent);
    tracing::debug!(
        step_up_percent,
        future_value,
        iterations = iterations.len(),
        converged,
        "goal search finished"
    );

    Ok(GoalOutcome::Achievable {
        step_up_percent,
        future_value,
        converged,
        iterations,
    })
}

fn validate_inputs(inputs: &GoalInputs) -> Result<(), ConfigError> {
    ensure_finite("target", inputs.target)?;
    ensure_non_negative("initial_contribution", inputs.initial_contribution)?;
    ensure_rate("annual_return_percent", inputs.annual_return_percent)?;
    if inputs.years == 0 {
        return Err(ConfigError::ZeroDuration { field: "years" });
    }
    ensure_max_years("years", inputs.years)?;
    Ok(())
}

fn validate_config(config: GoalSolveConfig) -> Result<(), ConfigError> {
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err(ConfigError::InvalidSolveConfig("search bounds must be finite"));
    }
    if config.search_min < 0.0 {
        return Err(ConfigError::InvalidSolveConfig("search_min must be >= 0"));
    }
    if config.search_max <= config.search_min {
        return Err(ConfigError::InvalidSolveConfig(
            "search_max must be greater than search_min",
        ));
    }
    if !config.precision.is_finite() || config.precision <= 0.0 {
        return Err(ConfigError::InvalidSolveConfig("precision must be > 0"));
    }
    if config.max_iterations == 0 {
        return Err(ConfigError::InvalidSolveConfig("max_iterations must be > 0"));
    }
    Ok(())
}
