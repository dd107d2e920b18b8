use backtester::{Backtester, SimulationParams};
use chrono::{Duration, TimeZone, Utc};
use configuration::MACrossoverParams;
use core_types::{Bar, ExitReason, Signal};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use strategies::{MACrossover, Strategy, StrategyError};

fn bar(i: usize, close: Decimal, half_range: Decimal) -> Bar {
    Bar {
        timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::hours(i as i64),
        open: close,
        high: close + half_range,
        low: close - half_range,
        close,
    }
}

/// 100 bars rising 0.5 per bar, then flat for the rest.
fn uptrend_then_flat(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let step = Decimal::from(i.min(99));
            bar(i, dec!(100) + step * dec!(0.5), dec!(0.3))
        })
        .collect()
}

/// A choppy series whose closes cycle through a 13-bar pattern.
fn choppy(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let offset = Decimal::from((i * 7) % 13) - dec!(6);
            bar(i, dec!(100) + offset * dec!(0.4), dec!(0.5))
        })
        .collect()
}

/// Buys on one fixed bar index and stays quiet otherwise.
struct BuyOnce {
    at_index: usize,
}

impl Strategy for BuyOnce {
    fn name(&self) -> &str {
        "BuyOnce"
    }

    fn evaluate(&mut self, bars: &[Bar]) -> Result<Signal, StrategyError> {
        Ok(if bars.len() - 1 == self.at_index { Signal::Buy } else { Signal::None })
    }
}

struct AlwaysBuy;

impl Strategy for AlwaysBuy {
    fn name(&self) -> &str {
        "AlwaysBuy"
    }

    fn evaluate(&mut self, _bars: &[Bar]) -> Result<Signal, StrategyError> {
        Ok(Signal::Buy)
    }
}

#[test]
fn buy_and_hold_in_uptrend_takes_one_trade_to_target() {
    let bars = uptrend_then_flat(250);
    let params = SimulationParams {
        atr_period: 14,
        sl_mult: dec!(2.0),
        tp_mult: dec!(3.0),
        max_duration_bars: 50,
        warmup: 20,
        trail_atr_mult: None,
    };
    let mut strategy = BuyOnce { at_index: params.warmup + 10 };

    let run = Backtester::new().simulate(&bars, &mut strategy, &params).unwrap();

    assert_eq!(run.stats.trade_count, 1);
    let trade = &run.trades[0];
    assert_eq!(trade.entry_index, 30);
    // ATR is 0.8 per bar in the trend, so the target sits 2.4 above entry.
    assert_eq!(trade.target_price, trade.entry_price + dec!(2.4));
    assert_eq!(trade.exit_reason, Some(ExitReason::Target));
    assert_eq!(trade.exit_index, Some(35));
    assert_eq!(run.stats.total_pnl, dec!(2.4));
}

#[test]
fn never_holds_two_trades_at_once() {
    let bars = choppy(300);
    let params = SimulationParams {
        atr_period: 5,
        sl_mult: dec!(1.0),
        tp_mult: dec!(1.5),
        max_duration_bars: 7,
        warmup: 0,
        trail_atr_mult: None,
    };

    let run = Backtester::new().simulate(&bars, &mut AlwaysBuy, &params).unwrap();
    assert!(run.stats.trade_count > 10);
    for pair in run.trades.windows(2) {
        let previous_exit = pair[0].exit_index.unwrap();
        assert!(pair[1].entry_index >= previous_exit);
    }
    assert!(run.trades.iter().all(|t| !t.is_open()));
}

#[test]
fn identical_runs_produce_identical_stats() {
    let bars = choppy(400);
    let params = SimulationParams {
        atr_period: 14,
        sl_mult: dec!(1.5),
        tp_mult: dec!(2.0),
        max_duration_bars: 20,
        warmup: 30,
        trail_atr_mult: Some(dec!(1.0)),
    };
    let strategy_params = MACrossoverParams { ma_fast_period: 3, ma_slow_period: 8, trend_filter_period: 20 };

    let simulator = Backtester::new();
    let first = simulator
        .simulate(&bars, &mut MACrossover::new(strategy_params.clone()).unwrap(), &params)
        .unwrap();
    let second = simulator
        .simulate(&bars, &mut MACrossover::new(strategy_params).unwrap(), &params)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.stats).unwrap(),
        serde_json::to_string(&second.stats).unwrap()
    );
}
