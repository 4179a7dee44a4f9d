use std::fmt::Display;
use std::str::FromStr;

use clap::{Args, ValueEnum};
use serde::{Deserialize, Deserializer};

use crate::core::{
    ConfigError, GoalInputs, PlannerDefaults, RateConvention, SequenceInputs, SimulationConfig,
    SurvivalInputs, ensure_years,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ApiRateConvention {
    #[serde(alias = "nominalMonthly", alias = "nominal_monthly", alias = "nominal")]
    NominalMonthly,
    #[serde(
        alias = "effectiveMonthly",
        alias = "effective_monthly",
        alias = "effective"
    )]
    EffectiveMonthly,
}

impl From<ApiRateConvention> for RateConvention {
    fn from(value: ApiRateConvention) -> Self {
        match value {
            ApiRateConvention::NominalMonthly => RateConvention::NominalMonthly,
            ApiRateConvention::EffectiveMonthly => RateConvention::EffectiveMonthly,
        }
    }
}

/// Overrides for a contribution-then-withdrawal ledger run.
#[derive(Args, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulateParams {
    #[arg(long, help = "Monthly contribution in the first year")]
    pub base_contribution: Option<f64>,
    #[arg(long, allow_negative_numbers = true, help = "Years of contributions")]
    pub contribution_years: Option<i64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Expected annual return in percent, e.g. 12"
    )]
    pub annual_return_percent: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Yearly increase of the monthly contribution in percent"
    )]
    pub contribution_step_up_percent: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Monthly withdrawal in the first withdrawal year"
    )]
    pub base_withdrawal: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Yearly increase of the monthly withdrawal in percent"
    )]
    pub withdrawal_step_up_percent: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Years of withdrawals, starting right after contributions end"
    )]
    pub withdrawal_years: Option<i64>,
    #[arg(long, value_enum, help = "How the annual return becomes a monthly rate")]
    pub rate_convention: Option<ApiRateConvention>,
}

impl SimulateParams {
    pub fn resolve(&self, defaults: &PlannerDefaults) -> Result<SimulationConfig, ConfigError> {
        let mut config = defaults.simulation;
        if let Some(v) = self.base_contribution {
            config.base_contribution = v;
        }
        if let Some(v) = self.contribution_years {
            config.contribution_years = ensure_years("contribution_years", v)?;
        }
        if let Some(v) = self.annual_return_percent {
            config.annual_return_percent = v;
        }
        if let Some(v) = self.contribution_step_up_percent {
            config.contribution_step_up_percent = v;
        }
        if let Some(v) = self.base_withdrawal {
            config.base_withdrawal = v;
        }
        if let Some(v) = self.withdrawal_step_up_percent {
            config.withdrawal_step_up_percent = v;
        }
        if let Some(v) = self.withdrawal_years {
            config.withdrawal_years = ensure_years("withdrawal_years", v)?;
        }
        if let Some(v) = self.rate_convention {
            config.rate_convention = v.into();
        }
        Ok(config)
    }
}

/// Overrides for the required step-up search.
#[derive(Args, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoalParams {
    #[arg(long, allow_negative_numbers = true, help = "Target final balance")]
    pub target: Option<f64>,
    #[arg(long, help = "Monthly contribution in the first year")]
    pub initial_contribution: Option<f64>,
    #[arg(long, allow_negative_numbers = true, help = "Years of contributions")]
    pub years: Option<i64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Expected annual return in percent"
    )]
    pub annual_return_percent: Option<f64>,
}

impl GoalParams {
    pub fn resolve(&self, defaults: &PlannerDefaults) -> Result<GoalInputs, ConfigError> {
        let mut inputs = defaults.goal;
        if let Some(v) = self.target {
            inputs.target = v;
        }
        if let Some(v) = self.initial_contribution {
            inputs.initial_contribution = v;
        }
        if let Some(v) = self.years {
            inputs.years = ensure_years("years", v)?;
        }
        if let Some(v) = self.annual_return_percent {
            inputs.annual_return_percent = v;
        }
        Ok(inputs)
    }
}

/// Overrides for the bear/flat/bull withdrawal comparison.
#[derive(Args, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SequenceParams {
    #[arg(long, help = "Starting balance")]
    pub initial_corpus: Option<f64>,
    #[arg(long, help = "Monthly withdrawal in the first year")]
    pub monthly_withdrawal: Option<f64>,
    #[arg(long, allow_negative_numbers = true, help = "Years of withdrawals")]
    pub years: Option<i64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Yearly increase of the monthly withdrawal in percent"
    )]
    pub withdrawal_increase_percent: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Long-run average annual return in percent"
    )]
    pub avg_return_percent: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Annual return in years 1 and 2 of the bear scenario"
    )]
    pub bear_return_percent: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Annual return in years 1 and 2 of the bull scenario"
    )]
    pub bull_return_percent: Option<f64>,
}

impl SequenceParams {
    pub fn resolve(&self, defaults: &PlannerDefaults) -> Result<SequenceInputs, ConfigError> {
        let mut inputs = defaults.sequence;
        if let Some(v) = self.initial_corpus {
            inputs.initial_corpus = v;
        }
        if let Some(v) = self.monthly_withdrawal {
            inputs.monthly_withdrawal = v;
        }
        if let Some(v) = self.years {
            inputs.years = ensure_years("years", v)?;
        }
        if let Some(v) = self.withdrawal_increase_percent {
            inputs.withdrawal_increase_percent = v;
        }
        if let Some(v) = self.avg_return_percent {
            inputs.avg_return_percent = v;
        }
        if let Some(v) = self.bear_return_percent {
            inputs.bear_return_percent = v;
        }
        if let Some(v) = self.bull_return_percent {
            inputs.bull_return_percent = v;
        }
        Ok(inputs)
    }
}

/// Overrides for the withdrawal-rate x duration survival grid.
#[derive(Args, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurvivalParams {
    #[arg(long, help = "Starting balance")]
    pub corpus: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Expected annual return in percent"
    )]
    pub return_rate_percent: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Annual increase of the withdrawal in percent"
    )]
    pub inflation_rate_percent: Option<f64>,
    #[arg(
        long,
        value_delimiter = ',',
        allow_negative_numbers = true,
        help = "Initial withdrawal rates in percent of the corpus, e.g. 3,4,5"
    )]
    #[serde(deserialize_with = "list_param")]
    pub rates: Option<Vec<f64>>,
    #[arg(
        long,
        value_delimiter = ',',
        allow_negative_numbers = true,
        help = "Durations in years, e.g. 10,20,30"
    )]
    #[serde(deserialize_with = "list_param")]
    pub durations: Option<Vec<i64>>,
}

impl SurvivalParams {
    pub fn resolve(&self, defaults: &PlannerDefaults) -> Result<SurvivalInputs, ConfigError> {
        let mut inputs = defaults.survival.clone();
        if let Some(v) = self.corpus {
            inputs.corpus = v;
        }
        if let Some(v) = self.return_rate_percent {
            inputs.return_rate_percent = v;
        }
        if let Some(v) = self.inflation_rate_percent {
            inputs.inflation_rate_percent = v;
        }
        if let Some(v) = &self.rates {
            inputs.withdrawal_rates = v.clone();
        }
        if let Some(v) = &self.durations {
            inputs.durations = v
                .iter()
                .map(|&years| ensure_years("durations", years))
                .collect::<Result<_, _>>()?;
        }
        Ok(inputs)
    }
}

/// Accepts a JSON array or a comma-separated string (query strings).
fn list_param<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListParam<T> {
        Many(Vec<T>),
        Csv(String),
    }

    match Option::<ListParam<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(ListParam::Many(values)) => Ok(Some(values)),
        Some(ListParam::Csv(raw)) => raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| item.parse::<T>().map_err(serde::de::Error::custom))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
    }
}
