use serde::Serialize;

use super::types::{GoalInputs, RateConvention, SequenceInputs, SimulationConfig, SurvivalInputs};

/// Values used for any parameter a caller leaves out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerDefaults {
    pub simulation: SimulationConfig,
    pub goal: GoalInputs,
    pub sequence: SequenceInputs,
    pub survival: SurvivalInputs,
}

impl Default for PlannerDefaults {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig {
                base_contribution: 1_000.0,
                contribution_years: 10,
                annual_return_percent: 12.0,
                contribution_step_up_percent: 10.0,
                base_withdrawal: 10_000.0,
                withdrawal_step_up_percent: 10.0,
                withdrawal_years: 20,
                rate_convention: RateConvention::NominalMonthly,
            },
            goal: GoalInputs {
                target: 10_000_000.0,
                initial_contribution: 5_000.0,
                years: 10,
                annual_return_percent: 12.0,
            },
            sequence: SequenceInputs {
                initial_corpus: 10_000_000.0,
                monthly_withdrawal: 50_000.0,
                years: 30,
                withdrawal_increase_percent: 5.0,
                avg_return_percent: 10.0,
                bear_return_percent: -20.0,
                bull_return_percent: 25.0,
            },
            survival: SurvivalInputs {
                corpus: 10_000_000.0,
                return_rate_percent: 10.0,
                inflation_rate_percent: 6.0,
                withdrawal_rates: vec![3.0, 4.0, 5.0, 6.0, 7.0],
                durations: vec![10, 15, 20, 25, 30],
            },
        }
    }
}
