use analytics::BacktestStats;
use configuration::OptimizerConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub mod error;

pub use error::AnalyzerError;

/// What the analyzer needs to know about a parameter set.
pub trait Candidate {
    /// Used as the final tie-break: shorter holding limits rank higher.
    fn max_duration_bars(&self) -> usize;
}

/// A parameter set together with the stats its simulation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation<C> {
    pub candidate: C,
    pub stats: BacktestStats,
}

/// The acceptance filter and ranking for grid-search results.
#[derive(Debug, Clone)]
pub struct Analyzer {
    min_trades: usize,
    target_win_rate: Decimal,
}

impl Analyzer {
    pub fn new(min_trades: usize, target_win_rate: Decimal) -> Result<Self, AnalyzerError> {
        if target_win_rate < Decimal::ZERO || target_win_rate > Decimal::ONE {
            return Err(AnalyzerError::InvalidRules(format!(
                "target_win_rate {} is outside [0, 1]",
                target_win_rate
            )));
        }
        Ok(Self { min_trades, target_win_rate })
    }

    pub fn from_config(config: &OptimizerConfig) -> Result<Self, AnalyzerError> {
        Self::new(config.min_trades, config.target_win_rate)
    }

    /// Filters and ranks all evaluations for one instrument.
    ///
    /// An empty result means nothing passed the filter.
    pub fn run<C: Candidate>(
        &self,
        instrument: &str,
        evaluations: Vec<Evaluation<C>>,
    ) -> Result<Vec<Evaluation<C>>, AnalyzerError> {
        // 1. Guard
        if evaluations.is_empty() {
            return Err(AnalyzerError::NoEvaluations(instrument.to_string()));
        }
        let total = evaluations.len();

        // 2. Filter
        let mut accepted = self.filter_evaluations(evaluations);
        tracing::debug!(instrument, total, accepted = accepted.len(), "Applied acceptance filter");

        // 3. Rank
        accepted.sort_by(rank_order);
        Ok(accepted)
    }

    /// The top-ranked evaluation, if any passed the filter.
    pub fn best<C: Candidate>(
        &self,
        instrument: &str,
        evaluations: Vec<Evaluation<C>>,
    ) -> Result<Option<Evaluation<C>>, AnalyzerError> {
        Ok(self.run(instrument, evaluations)?.into_iter().next())
    }

    pub fn accepts(&self, stats: &BacktestStats) -> bool {
        stats.trade_count >= self.min_trades && stats.win_rate >= self.target_win_rate
    }

    /// Applies hard filters to remove unacceptable runs.
    fn filter_evaluations<C>(&self, evaluations: Vec<Evaluation<C>>) -> Vec<Evaluation<C>> {
        evaluations.into_iter().filter(|e| self.accepts(&e.stats)).collect()
    }
}

/// Expectancy desc, then total PnL desc, then max duration asc.
fn rank_order<C: Candidate>(a: &Evaluation<C>, b: &Evaluation<C>) -> Ordering {
    b.stats
        .expectancy
        .cmp(&a.stats.expectancy)
        .then_with(|| b.stats.total_pnl.cmp(&a.stats.total_pnl))
        .then_with(|| a.candidate.max_duration_bars().cmp(&b.candidate.max_duration_bars()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Debug, Clone, PartialEq)]
    struct Grid {
        id: u32,
        max_duration_bars: usize,
    }

    impl Candidate for Grid {
        fn max_duration_bars(&self) -> usize {
            self.max_duration_bars
        }
    }

    fn eval(id: u32, duration: usize, trades: usize, win_rate: Decimal, expectancy: Decimal, pnl: Decimal) -> Evaluation<Grid> {
        let mut stats = BacktestStats::new();
        stats.trade_count = trades;
        stats.win_rate = win_rate;
        stats.expectancy = expectancy;
        stats.total_pnl = pnl;
        Evaluation { candidate: Grid { id, max_duration_bars: duration }, stats }
    }

    fn analyzer() -> Analyzer {
        Analyzer::new(30, dec!(0.55)).unwrap()
    }

    #[test]
    fn filter_requires_both_trade_count_and_win_rate() {
        let ranked = analyzer()
            .run(
                "EUR_USD",
                vec![
                    eval(1, 10, 29, dec!(0.9), dec!(5), dec!(50)), // too few trades
                    eval(2, 10, 40, dec!(0.54), dec!(5), dec!(50)), // win rate too low
                    eval(3, 10, 30, dec!(0.55), dec!(1), dec!(10)), // exactly on both thresholds
                ],
            )
            .unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate.id, 3);
    }

    #[test]
    fn ranks_by_expectancy_then_pnl_then_shorter_duration() {
        let ranked = analyzer()
            .run(
                "EUR_USD",
                vec![
                    eval(1, 50, 40, dec!(0.6), dec!(2), dec!(80)),
                    eval(2, 20, 40, dec!(0.6), dec!(3), dec!(10)),
                    eval(3, 20, 40, dec!(0.6), dec!(2), dec!(80)),
                    eval(4, 10, 40, dec!(0.6), dec!(2), dec!(90)),
                ],
            )
            .unwrap();
        let order: Vec<u32> = ranked.iter().map(|e| e.candidate.id).collect();
        assert_eq!(order, vec![2, 4, 3, 1]);
    }

    #[test]
    fn nothing_viable_is_an_empty_ranking() {
        let best = analyzer().best("GBP_USD", vec![eval(1, 10, 5, dec!(0.2), dec!(-1), dec!(-5))]).unwrap();
        assert!(best.is_none());
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            analyzer().run::<Grid>("USD_JPY", Vec::new()),
            Err(AnalyzerError::NoEvaluations(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_win_rate() {
        assert!(Analyzer::new(30, dec!(1.5)).is_err());
    }
}
