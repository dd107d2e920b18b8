use crate::error::OptimizerError;
use backtester::SimulationParams;
use configuration::{ParameterRange, ParameterSpace, Simulation};
use itertools::Itertools;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// One point of the parameter grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterCandidate {
    pub sl_mult: Decimal,
    pub tp_mult: Decimal,
    pub max_duration_bars: usize,
    pub trail_atr_mult: Decimal,
}

impl ParameterCandidate {
    /// Simulator settings for this candidate. The trailing multiple only
    /// takes effect when the `[simulation]` table enables trailing stops.
    pub fn simulation_params(&self, simulation: &Simulation) -> SimulationParams {
        SimulationParams {
            atr_period: simulation.atr_period,
            sl_mult: self.sl_mult,
            tp_mult: self.tp_mult,
            max_duration_bars: self.max_duration_bars,
            warmup: simulation.warmup,
            trail_atr_mult: simulation.apply_trailing_stop.then_some(self.trail_atr_mult),
        }
    }
}

impl analyzer::Candidate for ParameterCandidate {
    fn max_duration_bars(&self) -> usize {
        self.max_duration_bars
    }
}

/// Expands one configured range into its concrete values, in ascending
/// generation order.
fn range_values(name: &str, range: &ParameterRange) -> Result<Vec<Decimal>, OptimizerError> {
    let values: Vec<Decimal> = match range {
        ParameterRange::DiscreteInt(vals) => vals.iter().map(|&v| Decimal::from(v)).collect(),
        ParameterRange::DiscreteDecimal(vals) => vals.clone(),
        ParameterRange::LinearInt { start, end, step } => {
            if *step <= 0 {
                return Err(OptimizerError::ParameterGeneration(format!(
                    "Step for '{}' must be positive.",
                    name
                )));
            }
            (*start..=*end).step_by(*step as usize).map(Decimal::from).collect()
        }
        ParameterRange::LinearDecimal { start, end, step } => {
            if step.is_sign_negative() || step.is_zero() {
                return Err(OptimizerError::ParameterGeneration(format!(
                    "Step for '{}' must be positive.",
                    name
                )));
            }
            let mut vals = Vec::new();
            let mut current = *start;
            while current <= *end {
                vals.push(current);
                current += *step;
            }
            vals
        }
    };

    if values.is_empty() {
        return Err(OptimizerError::ParameterGeneration(format!(
            "Range for '{}' produces no values.",
            name
        )));
    }
    Ok(values)
}

fn to_bar_count(value: Decimal) -> Result<usize, OptimizerError> {
    if value.fract() != Decimal::ZERO {
        return Err(OptimizerError::ParameterGeneration(format!(
            "max_duration_bars value {} is not a whole number.",
            value
        )));
    }
    value.to_usize().ok_or_else(|| {
        OptimizerError::ParameterGeneration(format!("max_duration_bars value {} is negative.", value))
    })
}

/// Generates every combination of the four searched parameters.
///
/// The result has exactly `|sl| * |tp| * |duration| * |trail|` entries,
/// ordered with `trail_atr_mult` varying fastest.
pub fn generate_candidates(space: &ParameterSpace) -> Result<Vec<ParameterCandidate>, OptimizerError> {
    // 1. Convert all parameter ranges into concrete lists of values.
    let sl = range_values("sl_mult", &space.sl_mult)?;
    let tp = range_values("tp_mult", &space.tp_mult)?;
    let durations = range_values("max_duration_bars", &space.max_duration_bars)?;
    let trails = range_values("trail_atr_mult", &space.trail_atr_mult)?;

    for (name, values) in [("sl_mult", &sl), ("tp_mult", &tp), ("trail_atr_mult", &trails)] {
        if let Some(bad) = values.iter().find(|v| **v <= Decimal::ZERO) {
            return Err(OptimizerError::ParameterGeneration(format!(
                "{} value {} must be positive.",
                name, bad
            )));
        }
    }
    durations.iter().try_for_each(|d| to_bar_count(*d).map(|_| ()))?;

    // 2. Use itertools::multi_cartesian_product to generate all combinations.
    vec![sl, tp, durations, trails]
        .into_iter()
        .multi_cartesian_product()
        .map(|combo| {
            Ok(ParameterCandidate {
                sl_mult: combo[0],
                tp_mult: combo[1],
                max_duration_bars: to_bar_count(combo[2])?,
                trail_atr_mult: combo[3],
            })
        })
        .collect()
}
