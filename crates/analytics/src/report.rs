use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate statistics over every closed trade of one simulation run.
///
/// `avg_loss` is stored as a positive magnitude. `win_rate` is a fraction in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestStats {
    pub trade_count: usize,
    pub win_count: usize,
    pub loss_count: usize,
    pub win_rate: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub expectancy: Decimal,
    pub total_pnl: Decimal,

    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub profit_factor: Option<Decimal>, // None when there were no losses
    /// Largest peak-to-trough fall of cumulative PnL, in price units.
    pub max_drawdown: Decimal,
}

impl BacktestStats {
    /// Creates a new, zeroed-out report: the result of a run with no trades.
    pub fn new() -> Self {
        Self {
            trade_count: 0,
            win_count: 0,
            loss_count: 0,
            win_rate: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            expectancy: Decimal::ZERO,
            total_pnl: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            profit_factor: None,
            max_drawdown: Decimal::ZERO,
        }
    }
}

impl Default for BacktestStats {
    fn default() -> Self {
        Self::new()
    }
}
