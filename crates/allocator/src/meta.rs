use crate::error::AllocatorError;
use crate::shared::SharedAllocator;
use crate::ucb::{AllocatorSnapshot, Ucb1Allocator};
use analytics::BacktestStats;
use backtester::{Backtester, SimulationParams};
use configuration::{AllocatorSettings, RewardPolicy, Simulation, Strategies};
use core_types::{Bar, StrategyId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strategies::create_strategy;

/// Which dataset a pull runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    Calibration,
    Main(usize),
}

/// Supplies the bars for each meta-optimisation pull.
pub trait RoundData {
    fn bars_for(&self, round: Round) -> Vec<Bar>;
}

impl<F> RoundData for F
where
    F: Fn(Round) -> Vec<Bar>,
{
    fn bars_for(&self, round: Round) -> Vec<Bar> {
        self(round)
    }
}

/// Slides a fixed-size window across one bar series: calibration uses the
/// first window, round `i` starts `i * step` bars in (wrapping around).
#[derive(Debug, Clone)]
pub struct RollingWindows {
    bars: Vec<Bar>,
    window: usize,
    step: usize,
}

impl RollingWindows {
    pub fn new(bars: Vec<Bar>, window: usize, step: usize) -> Self {
        let window = window.min(bars.len());
        Self { bars, window, step: step.max(1) }
    }
}

impl RoundData for RollingWindows {
    fn bars_for(&self, round: Round) -> Vec<Bar> {
        let starts = self.bars.len() - self.window + 1;
        let start = match round {
            Round::Calibration => 0,
            Round::Main(i) => (i * self.step) % starts,
        };
        self.bars[start..start + self.window].to_vec()
    }
}

/// How a simulation's stats turn into a bandit reward.
pub fn reward_for(policy: RewardPolicy, stats: &BacktestStats) -> Decimal {
    match policy {
        RewardPolicy::RawPnl => stats.total_pnl,
        RewardPolicy::PerTrade if stats.trade_count == 0 => Decimal::ZERO,
        RewardPolicy::PerTrade => stats.total_pnl / Decimal::from(stats.trade_count),
    }
}

/// Final arm statistics and the arms tied for the best cumulative reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaReport {
    pub snapshot: AllocatorSnapshot,
    pub winners: Vec<String>,
    pub rounds: usize,
}

/// Runs the bandit over whole strategies: each pull is one simulation of the
/// chosen strategy, and the reward is its PnL.
pub struct MetaOptimizer {
    settings: AllocatorSettings,
    strategies: Strategies,
    params: SimulationParams,
    backtester: Backtester,
}

impl MetaOptimizer {
    pub fn new(settings: AllocatorSettings, strategies: Strategies, simulation: &Simulation) -> Self {
        Self {
            settings,
            strategies,
            params: SimulationParams::from_config(simulation),
            backtester: Backtester::new(),
        }
    }

    /// A fresh allocator with one arm per configured strategy.
    pub fn new_allocator(&self) -> Result<SharedAllocator, AllocatorError> {
        let allocator = Ucb1Allocator::new(self.settings.strategies.iter().map(|id| id.as_str()))?;
        Ok(SharedAllocator::new(allocator))
    }

    /// Calibrates every unpulled arm once, then plays `rounds` UCB1 rounds.
    pub fn run(&self, allocator: &SharedAllocator, data: &dyn RoundData) -> Result<MetaReport, AllocatorError> {
        // --- 1. Calibration ---
        let unpulled = allocator.unpulled()?;
        if unpulled > 0 {
            let calibration = data.bars_for(Round::Calibration);
            for _ in 0..unpulled {
                let (arm, reward) = allocator.select_and_update(|name| self.pull(name, &calibration))?;
                tracing::info!(%arm, %reward, "Calibration pull");
            }
        }

        // --- 2. Main loop ---
        for round in 0..self.settings.rounds {
            let bars = data.bars_for(Round::Main(round));
            let (arm, reward) = allocator.select_and_update(|name| self.pull(name, &bars))?;
            tracing::debug!(round, %arm, %reward, "Bandit round");
        }

        // --- 3. Report ---
        let snapshot = allocator.snapshot()?;
        let winners: Vec<String> = allocator.winners()?.into_iter().map(|arm| arm.name).collect();
        for arm in &snapshot.arms {
            tracing::info!(
                arm = %arm.name,
                pulls = arm.pull_count,
                cumulative_reward = %arm.cumulative_reward,
                "Arm summary"
            );
        }
        tracing::info!(?winners, "Meta-optimisation complete");

        Ok(MetaReport { snapshot, winners, rounds: self.settings.rounds })
    }

    fn strategy_for(&self, name: &str) -> Result<StrategyId, AllocatorError> {
        self.settings
            .strategies
            .iter()
            .copied()
            .find(|id| id.as_str() == name)
            .ok_or_else(|| AllocatorError::UnknownArm(name.to_string()))
    }

    /// One simulation of a freshly built strategy.
    fn pull(&self, name: &str, bars: &[Bar]) -> Result<Decimal, AllocatorError> {
        let id = self.strategy_for(name)?;
        let mut strategy = create_strategy(id, &self.strategies)?;
        let run = self
            .backtester
            .simulate(bars, strategy.as_mut(), &self.params)
            .map_err(|source| AllocatorError::Simulation { arm: name.to_string(), source })?;
        Ok(reward_for(self.settings.reward, &run.stats))
    }
}
