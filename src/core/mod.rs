mod defaults;
mod engine;
mod error;
mod sequence;
mod solver;
mod survival;
mod types;

pub use defaults::PlannerDefaults;
pub use engine::{
    MONTHS_PER_YEAR, apply_growth, effective_period_rate, nominal_period_rate, round_to_cents,
    round_to_unit, scheduled_amount, simulate, validate_config,
};
pub use error::{ConfigError, MAX_YEARS};
pub(crate) use error::ensure_years;
pub use sequence::{analyze_sequence_risk, return_schedule};
pub use solver::{GoalSolveConfig, future_value, reverse_goal, reverse_goal_with};
pub use survival::{build_survival_grid, survival_final_balance};
pub use types::{
    GoalInputs, GoalOutcome, GoalSolveIteration, Ledger, LedgerSummary, RateConvention,
    ScenarioLabel, ScenarioPath, ScenarioResult, SequenceInputs, SimulationConfig, SurvivalCell,
    SurvivalGrid, SurvivalInputs, YearRecord,
};
