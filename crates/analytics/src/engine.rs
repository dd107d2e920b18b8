use crate::error::AnalyticsError;
use crate::report::BacktestStats;
use core_types::Trade;
use rust_decimal::Decimal;

/// A stateless calculator for deriving performance metrics from closed trades.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for calculating performance metrics.
    ///
    /// # Arguments
    ///
    /// * `trades` - Every closed `Trade` of a run, in closing order.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `BacktestStats` or an `AnalyticsError` if
    /// any trade is still open.
    pub fn calculate(&self, trades: &[Trade]) -> Result<BacktestStats, AnalyticsError> {
        let mut report = BacktestStats::new();

        if let Some(open) = trades.iter().find(|t| t.is_open()) {
            return Err(AnalyticsError::OpenTrade(open.entry_index));
        }
        if trades.is_empty() {
            return Ok(report);
        }

        self.calculate_profitability(trades, &mut report);
        self.calculate_drawdown(trades, &mut report);

        Ok(report)
    }

    /// Partitions trades into wins (`pnl > 0`) and losses, then derives rates and averages.
    fn calculate_profitability(&self, trades: &[Trade], report: &mut BacktestStats) {
        report.trade_count = trades.len();

        for trade in trades {
            let pnl = trade.pnl();
            report.total_pnl += pnl;

            if pnl > Decimal::ZERO {
                report.gross_profit += pnl;
                report.win_count += 1;
            } else {
                report.gross_loss += pnl.abs();
                report.loss_count += 1;
            }
        }

        // --- Ratios ---
        report.win_rate = Decimal::from(report.win_count) / Decimal::from(report.trade_count);

        if report.win_count > 0 {
            report.avg_win = report.gross_profit / Decimal::from(report.win_count);
        }
        if report.loss_count > 0 {
            report.avg_loss = report.gross_loss / Decimal::from(report.loss_count);
        }
        if report.gross_loss > Decimal::ZERO {
            report.profit_factor = Some(report.gross_profit / report.gross_loss);
        }

        report.expectancy =
            report.win_rate * report.avg_win - (Decimal::ONE - report.win_rate) * report.avg_loss.abs();
    }

    /// Maximum drawdown of the cumulative PnL curve, starting from zero.
    fn calculate_drawdown(&self, trades: &[Trade], report: &mut BacktestStats) {
        let mut equity = Decimal::ZERO;
        let mut peak = Decimal::ZERO;
        let mut max_drawdown = Decimal::ZERO;

        for trade in trades {
            equity += trade.pnl();
            if equity > peak {
                peak = equity;
            }
            let drawdown = peak - equity;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }

        report.max_drawdown = max_drawdown;
    }
}
