use crate::error::ConfigError;
use crate::optimizer_config::OptimizerConfig;
use core_types::StrategyId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub simulation: Simulation,
    pub risk_management: RiskManagement,
    pub optimizer: OptimizerConfig,
    pub allocator: AllocatorSettings,
    pub strategies: Strategies,
    pub logging: LoggingSettings,
}

impl Config {
    /// Checks the cross-field rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.atr_period == 0 {
            return Err(ConfigError::ValidationError(
                "simulation.atr_period must be greater than 0".to_string(),
            ));
        }
        self.risk_management.validate()?;
        self.optimizer.validate()?;
        if self.allocator.strategies.is_empty() {
            return Err(ConfigError::ValidationError(
                "allocator.strategies must name at least one strategy".to_string(),
            ));
        }
        Ok(())
    }
}

/// Contains parameters for the trade simulator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Simulation {
    /// Number of trailing bars in the ATR used to place stops and targets.
    pub atr_period: usize,
    /// Leading bars that only prime strategy state and never trade.
    pub warmup: usize,
    /// Stop-loss distance in ATR multiples for single backtests.
    pub sl_mult: Decimal,
    /// Take-profit distance in ATR multiples for single backtests.
    pub tp_mult: Decimal,
    /// Forced exit after this many bars. 0 disables the timeout.
    pub max_duration_bars: usize,
    /// When set, `trail_atr_mult` from a parameter candidate ratchets the stop.
    pub apply_trailing_stop: bool,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            atr_period: 14,
            warmup: 0,
            sl_mult: dec!(1.0),
            tp_mult: dec!(2.0),
            max_duration_bars: 0,
            apply_trailing_stop: false,
        }
    }
}

/// One drawdown bracket: while drawdown is below `max_drawdown`, risk `risk_fraction`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RiskTier {
    pub max_drawdown: Decimal,
    pub risk_fraction: Decimal,
}

/// Contains parameters for trade-level risk management.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RiskManagement {
    /// Hard cap on order size, applied after every other calculation.
    pub max_units: u64,
    /// Drawdown brackets, ordered by ascending `max_drawdown`.
    pub tiers: Vec<RiskTier>,
    /// Risk fraction once drawdown is at or beyond the last tier.
    pub floor_risk_fraction: Decimal,
    /// Drawdown above which the allocator should be re-run.
    pub reoptimize_drawdown_pct: Decimal,
}

impl Default for RiskManagement {
    fn default() -> Self {
        Self {
            max_units: 1000,
            tiers: vec![
                RiskTier { max_drawdown: dec!(0.05), risk_fraction: dec!(0.02) },
                RiskTier { max_drawdown: dec!(0.10), risk_fraction: dec!(0.006) },
            ],
            floor_risk_fraction: dec!(0.0018),
            reoptimize_drawdown_pct: dec!(0.05),
        }
    }
}

impl RiskManagement {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_units == 0 {
            return Err(ConfigError::ValidationError(
                "risk_management.max_units must be greater than 0".to_string(),
            ));
        }
        let fractions = self
            .tiers
            .iter()
            .map(|t| t.risk_fraction)
            .chain(std::iter::once(self.floor_risk_fraction));
        for fraction in fractions {
            if fraction <= Decimal::ZERO || fraction >= Decimal::ONE {
                return Err(ConfigError::ValidationError(format!(
                    "risk fraction {} must be between 0 and 1",
                    fraction
                )));
            }
        }
        if self.tiers.windows(2).any(|w| w[0].max_drawdown >= w[1].max_drawdown) {
            return Err(ConfigError::ValidationError(
                "risk_management.tiers must be sorted by ascending max_drawdown".to_string(),
            ));
        }
        Ok(())
    }
}

/// How a backtest outcome is turned into a bandit reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardPolicy {
    /// Total PnL of the run, in price units.
    #[default]
    RawPnl,
    /// Total PnL divided by the number of trades (0 when there were none).
    PerTrade,
}

/// Settings for the bandit strategy allocator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AllocatorSettings {
    /// Arms, in enumeration order.
    pub strategies: Vec<StrategyId>,
    /// Rounds per meta-optimisation run (after calibration).
    pub rounds: usize,
    pub reward: RewardPolicy,
}

impl Default for AllocatorSettings {
    fn default() -> Self {
        Self {
            strategies: StrategyId::ALL.to_vec(),
            rounds: 50,
            reward: RewardPolicy::RawPnl,
        }
    }
}

/// Contains the parameter sets for all available strategies.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Strategies {
    pub ma_crossover: MACrossoverParams,
    pub macd_trend: MacdTrendParams,
    pub rsi_reversion: RsiReversionParams,
}

/// Parameters for the Triple Moving Average Crossover strategy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MACrossoverParams {
    pub ma_fast_period: usize,
    pub ma_slow_period: usize,
    /// A long-term MA to act as a trend filter.
    pub trend_filter_period: usize,
}

impl Default for MACrossoverParams {
    fn default() -> Self {
        Self { ma_fast_period: 10, ma_slow_period: 30, trend_filter_period: 100 }
    }
}

/// Parameters for the MACD crossover strategy gated by a long EMA trend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MacdTrendParams {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub ema_trend: usize,
}

impl Default for MacdTrendParams {
    fn default() -> Self {
        Self { macd_fast: 12, macd_slow: 26, macd_signal: 9, ema_trend: 200 }
    }
}

/// Parameters for the RSI mean-reversion strategy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RsiReversionParams {
    pub rsi_period: usize,
    pub overbought: Decimal,
    pub oversold: Decimal,
}

impl Default for RsiReversionParams {
    fn default() -> Self {
        Self { rsi_period: 14, overbought: dec!(70), oversold: dec!(30) }
    }
}

/// Where and how much to log.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Directory for daily rolling log files. Stdout only when absent.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "tradewind".to_string(),
        }
    }
}
