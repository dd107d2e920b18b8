use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Defines a grid-search job: the search space plus the acceptance filter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Candidates with fewer closed trades than this are discarded.
    pub min_trades: usize,
    /// Candidates with a lower win rate than this are discarded.
    pub target_win_rate: Decimal,
    /// Size of the worker pool. 0 means one worker per CPU core.
    pub worker_threads: usize,
    pub parameter_space: ParameterSpace,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_trades: 30,
            target_win_rate: dec!(0.55),
            worker_threads: 0,
            parameter_space: ParameterSpace::default(),
        }
    }
}

impl OptimizerConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.target_win_rate < Decimal::ZERO || self.target_win_rate > Decimal::ONE {
            return Err(ConfigError::ValidationError(
                "optimizer.target_win_rate must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// The four exit-rule axes searched by the optimizer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParameterSpace {
    pub sl_mult: ParameterRange,
    pub tp_mult: ParameterRange,
    pub max_duration_bars: ParameterRange,
    pub trail_atr_mult: ParameterRange,
}

// --- Default Implementations ---
// This allows a user to omit the `[optimizer.parameter_space]` section from
// their toml and still search the standard 11 x 11 x 4 x 3 grid.

impl Default for ParameterSpace {
    fn default() -> Self {
        Self {
            sl_mult: ParameterRange::LinearDecimal {
                start: dec!(0.5),
                end: dec!(3.0),
                step: dec!(0.25),
            },
            tp_mult: ParameterRange::LinearDecimal {
                start: dec!(0.5),
                end: dec!(3.0),
                step: dec!(0.25),
            },
            max_duration_bars: ParameterRange::DiscreteInt(vec![10, 20, 50, 100]),
            trail_atr_mult: ParameterRange::DiscreteDecimal(vec![dec!(0.5), dec!(1.0), dec!(1.5)]),
        }
    }
}

/// Represents a range of values for a single parameter to be tested.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ParameterRange {
    DiscreteInt(Vec<i64>),
    DiscreteDecimal(Vec<Decimal>),
    LinearInt { start: i64, end: i64, step: i64 },
    LinearDecimal { start: Decimal, end: Decimal, step: Decimal },
}
