use thiserror::Error;

/// Longest horizon any single duration field may request.
pub const MAX_YEARS: u32 = 1_000;

/// Structurally invalid engine input. Raised before any simulation work starts.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be >= 0, got {value}")]
    NegativeDuration { field: &'static str, value: i64 },

    #[error("{field} must be at most {max} years, got {value}", max = MAX_YEARS)]
    DurationTooLarge { field: &'static str, value: i64 },

    #[error("contribution years plus withdrawal years must be at least 1")]
    EmptyHorizon,

    #[error("{field} must be at least 1 year")]
    ZeroDuration { field: &'static str },

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be > -100, got {value}")]
    RateBelowTotalLoss { field: &'static str, value: f64 },

    #[error("{operation} produced a balance beyond the representable range")]
    Overflow { operation: &'static str },

    #[error("invalid goal solver config: {0}")]
    InvalidSolveConfig(&'static str),
}

pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(value)
}

/// Rates are percentages; anything at or below -100 wipes out the balance in one step.
pub(crate) fn ensure_rate(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    ensure_finite(field, value)?;
    if value <= -100.0 {
        return Err(ConfigError::RateBelowTotalLoss { field, value });
    }
    Ok(value)
}

pub(crate) fn ensure_years(field: &'static str, value: i64) -> Result<u32, ConfigError> {
    if value < 0 {
        return Err(ConfigError::NegativeDuration { field, value });
    }
    match u32::try_from(value) {
        Ok(years) if years <= MAX_YEARS => Ok(years),
        _ => Err(ConfigError::DurationTooLarge { field, value }),
    }
}

pub(crate) fn ensure_max_years(field: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value > MAX_YEARS {
        return Err(ConfigError::DurationTooLarge {
            field,
            value: i64::from(value),
        });
    }
    Ok(value)
}
