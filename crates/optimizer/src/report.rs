use crate::error::OptimizerError;
use crate::generator::ParameterCandidate;
use analytics::BacktestStats;
use core_types::StrategyId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A work unit that produced no stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub instrument: String,
    pub candidate: ParameterCandidate,
    pub reason: String,
}

/// The outcome of one grid search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub strategy: StrategyId,
    /// Top-ranked candidate per instrument that passed the acceptance filter.
    pub best: BTreeMap<String, ParameterCandidate>,
    pub best_stats: BTreeMap<String, BacktestStats>,
    /// Instruments where no candidate passed.
    pub no_viable: Vec<String>,
    pub failures: Vec<UnitFailure>,
    /// Units that ran to completion.
    pub evaluated: usize,
}

/// Strategy name → instrument → winning candidate.
///
/// This is the document handed to external storage; the core never writes it
/// anywhere itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BestParameters(pub BTreeMap<String, BTreeMap<String, ParameterCandidate>>);

impl BestParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a report's winners, replacing earlier entries for the same instrument.
    pub fn record(&mut self, report: &OptimizationReport) {
        let entry = self.0.entry(report.strategy.as_str().to_string()).or_default();
        for (instrument, candidate) in &report.best {
            entry.insert(instrument.clone(), candidate.clone());
        }
    }

    pub fn get(&self, strategy: StrategyId, instrument: &str) -> Option<&ParameterCandidate> {
        self.0.get(strategy.as_str()).and_then(|by_instrument| by_instrument.get(instrument))
    }

    pub fn to_json_string(&self) -> Result<String, OptimizerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, OptimizerError> {
        Ok(serde_json::from_str(json)?)
    }
}
