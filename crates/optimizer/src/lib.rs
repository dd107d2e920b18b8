//! # Tradewind Optimizer
//!
//! Exhaustive grid search over stop, target, holding-period and trailing
//! multiples. Every `(instrument, candidate)` pair is an independent unit run
//! on a fixed-size rayon pool; results are gathered once all units finish and
//! handed to the `analyzer` for filtering and ranking.

use crate::generator::generate_candidates;
use analyzer::{Analyzer, Evaluation};
use analytics::BacktestStats;
use backtester::Backtester;
use configuration::{OptimizerConfig, Simulation, Strategies};
use core_types::{Bar, StrategyId};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use strategies::create_strategy;

pub mod error;
pub mod generator;
pub mod report;

pub use error::OptimizerError;
pub use generator::ParameterCandidate;
pub use report::{BestParameters, OptimizationReport, UnitFailure};

pub struct Optimizer {
    config: OptimizerConfig,
    simulation: Simulation,
    strategies: Strategies,
    analyzer: Analyzer,
    backtester: Backtester,
    show_progress: bool,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig, simulation: Simulation, strategies: Strategies) -> Result<Self, OptimizerError> {
        let analyzer = Analyzer::from_config(&config)?;
        Ok(Self {
            config,
            simulation,
            strategies,
            analyzer,
            backtester: Backtester::new(),
            show_progress: false,
        })
    }

    /// Draw a terminal progress bar while units run.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn worker_count(&self) -> usize {
        match self.config.worker_threads {
            0 => num_cpus::get(),
            n => n,
        }
    }

    /// Runs the full grid for `strategy_id` on every instrument.
    ///
    /// A unit that errors or panics is recorded in `failures` and never aborts
    /// the search. Instruments missing from `bars_by_instrument` fail all of
    /// their units.
    pub fn optimize(
        &self,
        strategy_id: StrategyId,
        instruments: &[String],
        bars_by_instrument: &HashMap<String, Vec<Bar>>,
    ) -> Result<OptimizationReport, OptimizerError> {
        if instruments.is_empty() {
            return Err(OptimizerError::NoInstruments);
        }
        let candidates = generate_candidates(&self.config.parameter_space)?;

        let mut instrument_order: Vec<&String> = Vec::with_capacity(instruments.len());
        for instrument in instruments {
            if !instrument_order.contains(&instrument) {
                instrument_order.push(instrument);
            }
        }
        let units: Vec<(&String, &ParameterCandidate)> = instrument_order
            .iter()
            .flat_map(|instrument| candidates.iter().map(move |candidate| (*instrument, candidate)))
            .collect();
        let total_units = units.len();
        let workers = self.worker_count();

        tracing::info!(
            strategy = %strategy_id,
            instruments = instrument_order.len(),
            candidates = candidates.len(),
            units = total_units,
            workers,
            "Starting grid search"
        );

        let progress_bar = self.progress_bar(total_units as u64)?;
        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;

        // Fan out, then wait for every unit before touching the results.
        let outcomes: Vec<Result<BacktestStats, String>> = pool.install(|| {
            units
                .par_iter()
                .map(|(instrument, candidate)| {
                    let bars = bars_by_instrument.get(*instrument).map(Vec::as_slice);
                    let outcome = self.run_unit_isolated(strategy_id, instrument, candidate, bars);
                    progress_bar.inc(1);
                    outcome
                })
                .collect()
        });
        progress_bar.finish_with_message("Optimization runs complete.");

        // Fan in, grouped by instrument in the order given.
        let mut by_instrument: BTreeMap<&str, Vec<Evaluation<ParameterCandidate>>> = BTreeMap::new();
        let mut failures = Vec::new();
        for ((instrument, candidate), outcome) in units.iter().zip(outcomes) {
            match outcome {
                Ok(stats) => by_instrument
                    .entry(instrument.as_str())
                    .or_default()
                    .push(Evaluation { candidate: (*candidate).clone(), stats }),
                Err(reason) => {
                    tracing::warn!(instrument = %instrument, ?candidate, %reason, "Optimization unit failed");
                    failures.push(UnitFailure {
                        instrument: (*instrument).clone(),
                        candidate: (*candidate).clone(),
                        reason,
                    });
                }
            }
        }
        let evaluated = total_units - failures.len();

        let mut best = BTreeMap::new();
        let mut best_stats = BTreeMap::new();
        let mut no_viable = Vec::new();
        for instrument in instrument_order {
            let evaluations = by_instrument.remove(instrument.as_str()).unwrap_or_default();
            let winner = if evaluations.is_empty() {
                None
            } else {
                self.analyzer.best(instrument, evaluations)?
            };
            match winner {
                Some(evaluation) => {
                    tracing::info!(
                        instrument = %instrument,
                        expectancy = %evaluation.stats.expectancy,
                        win_rate = %evaluation.stats.win_rate,
                        trades = evaluation.stats.trade_count,
                        "Best parameters selected"
                    );
                    best.insert(instrument.clone(), evaluation.candidate);
                    best_stats.insert(instrument.clone(), evaluation.stats);
                }
                None => {
                    tracing::info!(instrument = %instrument, "No viable parameter set");
                    no_viable.push(instrument.clone());
                }
            }
        }

        Ok(OptimizationReport {
            strategy: strategy_id,
            best,
            best_stats,
            no_viable,
            failures,
            evaluated,
        })
    }

    /// Runs one unit, converting errors and panics into a failure reason.
    fn run_unit_isolated(
        &self,
        strategy_id: StrategyId,
        instrument: &str,
        candidate: &ParameterCandidate,
        bars: Option<&[Bar]>,
    ) -> Result<BacktestStats, String> {
        match catch_unwind(AssertUnwindSafe(|| self.run_unit(strategy_id, instrument, candidate, bars))) {
            Ok(result) => result,
            Err(payload) => Err(panic_message(payload.as_ref())),
        }
    }

    fn run_unit(
        &self,
        strategy_id: StrategyId,
        instrument: &str,
        candidate: &ParameterCandidate,
        bars: Option<&[Bar]>,
    ) -> Result<BacktestStats, String> {
        let bars = bars.ok_or_else(|| format!("no bars supplied for instrument {}", instrument))?;
        // Each unit gets a fresh strategy; none of them share state.
        let mut strategy = create_strategy(strategy_id, &self.strategies).map_err(|e| e.to_string())?;
        let params = candidate.simulation_params(&self.simulation);
        self.backtester
            .simulate(bars, strategy.as_mut(), &params)
            .map(|run| run.stats)
            .map_err(|e| e.to_string())
    }

    fn progress_bar(&self, len: u64) -> Result<ProgressBar, OptimizerError> {
        if !self.show_progress {
            return Ok(ProgressBar::hidden());
        }
        let progress_bar = ProgressBar::new(len);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("=>-"),
        );
        Ok(progress_bar)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panics_are_described() {
        let payload = catch_unwind(|| panic!("indicator blew up")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "panicked: indicator blew up");

        let payload = catch_unwind(|| panic!("{} bars", 3)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "panicked: 3 bars");
    }

    #[test]
    fn zero_workers_means_one_per_cpu() {
        let optimizer = Optimizer::new(OptimizerConfig::default(), Simulation::default(), Strategies::default()).unwrap();
        assert_eq!(optimizer.worker_count(), num_cpus::get());
    }
}
