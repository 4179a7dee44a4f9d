use serde::{Deserialize, Serialize};

/// How an annual percentage is turned into a per-month rate.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateConvention {
    /// `annual / 100 / 12`
    #[default]
    NominalMonthly,
    /// `(1 + annual / 100)^(1/12) - 1`
    EffectiveMonthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    pub base_contribution: f64,
    pub contribution_years: u32,
    pub annual_return_percent: f64,
    pub contribution_step_up_percent: f64,
    pub base_withdrawal: f64,
    pub withdrawal_step_up_percent: f64,
    pub withdrawal_years: u32,
    #[serde(default)]
    pub rate_convention: RateConvention,
}

impl SimulationConfig {
    /// Accumulation only: no withdrawal phase follows the contributions.
    pub fn contribution_only(
        base_contribution: f64,
        contribution_years: u32,
        annual_return_percent: f64,
        contribution_step_up_percent: f64,
    ) -> Self {
        Self {
            base_contribution,
            contribution_years,
            annual_return_percent,
            contribution_step_up_percent,
            base_withdrawal: 0.0,
            withdrawal_step_up_percent: 0.0,
            withdrawal_years: 0,
            rate_convention: RateConvention::NominalMonthly,
        }
    }

    pub fn horizon_years(&self) -> u32 {
        self.contribution_years.saturating_add(self.withdrawal_years)
    }
}

/// One simulated year. `None` marks a flow that does not apply in that year,
/// which is not the same as a flow of zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    pub year: u32,
    pub begin_balance: f64,
    pub monthly_contribution: Option<f64>,
    pub annual_contribution: f64,
    pub cumulative_contributed: f64,
    pub monthly_withdrawal: Option<f64>,
    pub annual_withdrawal: Option<f64>,
    pub cumulative_withdrawn: f64,
    pub interest_earned: f64,
    pub end_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ledger {
    pub years: Vec<YearRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub total_contributed: f64,
    pub total_withdrawn: f64,
    pub total_interest: f64,
    pub final_balance: f64,
    pub depleted_in_year: Option<u32>,
}

impl Ledger {
    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, YearRecord> {
        self.years.iter()
    }

    pub fn final_balance(&self) -> f64 {
        self.years.last().map_or(0.0, |row| row.end_balance)
    }

    pub fn summary(&self) -> LedgerSummary {
        let last = self.years.last();
        LedgerSummary {
            total_contributed: last.map_or(0.0, |row| row.cumulative_contributed),
            total_withdrawn: last.map_or(0.0, |row| row.cumulative_withdrawn),
            total_interest: self.years.iter().map(|row| row.interest_earned).sum(),
            final_balance: self.final_balance(),
            depleted_in_year: self
                .years
                .iter()
                .find(|row| row.annual_withdrawal.is_some() && row.end_balance <= 0.0)
                .map(|row| row.year),
        }
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a YearRecord;
    type IntoIter = std::slice::Iter<'a, YearRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.years.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalInputs {
    pub target: f64,
    pub initial_contribution: f64,
    pub years: u32,
    pub annual_return_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_step_up: f64,
    pub future_value: f64,
}

/// Result of the step-up search. An unreachable target is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "status",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum GoalOutcome {
    Achievable {
        step_up_percent: f64,
        future_value: f64,
        converged: bool,
        iterations: Vec<GoalSolveIteration>,
    },
    Unachievable {
        max_step_up_percent: f64,
        max_future_value: f64,
    },
}

impl GoalOutcome {
    pub fn step_up_percent(&self) -> Option<f64> {
        match self {
            GoalOutcome::Achievable {
                step_up_percent, ..
            } => Some(*step_up_percent),
            GoalOutcome::Unachievable { .. } => None,
        }
    }

    pub fn is_achievable(&self) -> bool {
        matches!(self, GoalOutcome::Achievable { .. })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioLabel {
    Bear,
    Flat,
    Bull,
}

impl ScenarioLabel {
    pub const ALL: [ScenarioLabel; 3] = [
        ScenarioLabel::Bear,
        ScenarioLabel::Flat,
        ScenarioLabel::Bull,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceInputs {
    pub initial_corpus: f64,
    pub monthly_withdrawal: f64,
    pub years: u32,
    pub withdrawal_increase_percent: f64,
    pub avg_return_percent: f64,
    pub bear_return_percent: f64,
    pub bull_return_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPath {
    pub label: ScenarioLabel,
    /// Annual return percent applied in each year, index 0 is year 1.
    pub returns: Vec<f64>,
    /// End-of-year balances, index 0 is the starting corpus.
    pub balances: Vec<f64>,
    pub depleted_in_year: Option<u32>,
}

impl ScenarioPath {
    pub fn final_balance(&self) -> f64 {
        self.balances.last().copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    /// Shared x-axis: `0..=years`.
    pub years: Vec<u32>,
    pub bear: ScenarioPath,
    pub flat: ScenarioPath,
    pub bull: ScenarioPath,
}

impl ScenarioResult {
    pub fn scenario(&self, label: ScenarioLabel) -> &ScenarioPath {
        match label {
            ScenarioLabel::Bear => &self.bear,
            ScenarioLabel::Flat => &self.flat,
            ScenarioLabel::Bull => &self.bull,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalInputs {
    pub corpus: f64,
    pub return_rate_percent: f64,
    pub inflation_rate_percent: f64,
    pub withdrawal_rates: Vec<f64>,
    pub durations: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalCell {
    pub withdrawal_rate_percent: f64,
    pub duration_years: u32,
    pub final_balance: f64,
    pub survived: bool,
}

/// Rows follow `withdrawal_rates`, columns follow `durations`, both in caller order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalGrid {
    pub withdrawal_rates: Vec<f64>,
    pub durations: Vec<u32>,
    pub rows: Vec<Vec<SurvivalCell>>,
}

impl SurvivalGrid {
    pub fn cell(&self, rate_index: usize, duration_index: usize) -> Option<&SurvivalCell> {
        self.rows.get(rate_index)?.get(duration_index)
    }

    pub fn cells(&self) -> impl Iterator<Item = &SurvivalCell> {
        self.rows.iter().flatten()
    }

    /// Share of cells that survived, 0 for an empty grid.
    pub fn survival_rate(&self) -> f64 {
        let total = self.cells().count();
        if total == 0 {
            return 0.0;
        }
        self.cells().filter(|cell| cell.survived).count() as f64 / total as f64
    }
}
