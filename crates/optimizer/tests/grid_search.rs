use chrono::{Duration, TimeZone, Utc};
use configuration::{MACrossoverParams, OptimizerConfig, ParameterRange, ParameterSpace, Simulation, Strategies};
use core_types::{Bar, StrategyId};
use optimizer::{BestParameters, Optimizer, generator::generate_candidates};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// A slow sine wave with a 40-bar period, so moving averages cross regularly.
fn wave(n: usize, amplitude: f64) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let close = 100.0 + amplitude * (i as f64 * std::f64::consts::TAU / 40.0).sin();
            let close = Decimal::from_f64(close).unwrap().round_dp(4);
            Bar {
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::hours(i as i64),
                open: close,
                high: close + dec!(0.4),
                low: close - dec!(0.4),
                close,
            }
        })
        .collect()
}

fn small_space() -> ParameterSpace {
    ParameterSpace {
        sl_mult: ParameterRange::DiscreteDecimal(vec![dec!(1.0), dec!(2.0)]),
        tp_mult: ParameterRange::DiscreteDecimal(vec![dec!(1.5), dec!(3.0)]),
        max_duration_bars: ParameterRange::DiscreteInt(vec![10, 30]),
        trail_atr_mult: ParameterRange::DiscreteDecimal(vec![dec!(1.0)]),
    }
}

fn strategies() -> Strategies {
    Strategies {
        ma_crossover: MACrossoverParams { ma_fast_period: 3, ma_slow_period: 8, trend_filter_period: 5 },
        ..Strategies::default()
    }
}

fn optimizer(min_trades: usize, workers: usize) -> Optimizer {
    let config = OptimizerConfig {
        min_trades,
        target_win_rate: Decimal::ZERO,
        worker_threads: workers,
        parameter_space: small_space(),
    };
    let simulation = Simulation { atr_period: 5, ..Simulation::default() };
    Optimizer::new(config, simulation, strategies()).unwrap()
}

fn market() -> HashMap<String, Vec<Bar>> {
    HashMap::from([
        ("EUR_USD".to_string(), wave(400, 5.0)),
        ("GBP_USD".to_string(), wave(400, 8.0)),
    ])
}

#[test]
fn every_unit_is_evaluated_and_each_instrument_gets_a_winner() {
    let instruments = vec!["EUR_USD".to_string(), "GBP_USD".to_string()];
    let report = optimizer(1, 2).optimize(StrategyId::MACrossover, &instruments, &market()).unwrap();

    assert_eq!(report.evaluated, 2 * 8);
    assert!(report.failures.is_empty());
    assert_eq!(report.best.len(), 2);
    assert!(report.no_viable.is_empty());
    for instrument in &instruments {
        let winner = &report.best[instrument];
        assert!(generate_candidates(&small_space()).unwrap().contains(winner));
        assert!(report.best_stats[instrument].trade_count >= 1);
    }
}

#[test]
fn missing_bars_fail_only_that_instrument() {
    let instruments = vec!["EUR_USD".to_string(), "USD_JPY".to_string()];
    let report = optimizer(1, 2).optimize(StrategyId::MACrossover, &instruments, &market()).unwrap();

    assert_eq!(report.failures.len(), 8);
    assert!(report.failures.iter().all(|f| f.instrument == "USD_JPY"));
    assert_eq!(report.evaluated, 8);
    assert!(report.best.contains_key("EUR_USD"));
    assert_eq!(report.no_viable, vec!["USD_JPY".to_string()]);
}

/// Bars whose high-low range does not fit in a `Decimal`, so the simulator
/// panics computing ATR.
fn overflowing_bars(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::hours(i as i64),
            open: Decimal::ZERO,
            high: Decimal::MAX,
            low: Decimal::MIN,
            close: Decimal::ZERO,
        })
        .collect()
}

#[test]
fn panicking_units_are_isolated_from_their_siblings() {
    let mut bars = market();
    bars.insert("XAU_USD".to_string(), overflowing_bars(20));
    let instruments = vec!["EUR_USD".to_string(), "XAU_USD".to_string()];

    let report = optimizer(1, 4).optimize(StrategyId::MACrossover, &instruments, &bars).unwrap();

    assert_eq!(report.evaluated, 8);
    assert_eq!(report.failures.len(), 8);
    assert!(report.failures.iter().all(|f| f.instrument == "XAU_USD" && f.reason.starts_with("panicked")));
    assert!(report.best.contains_key("EUR_USD"));
    assert_eq!(report.no_viable, vec!["XAU_USD".to_string()]);
}

#[test]
fn unreachable_filter_leaves_no_viable_set() {
    let instruments = vec!["EUR_USD".to_string()];
    let report = optimizer(10_000, 1).optimize(StrategyId::MACrossover, &instruments, &market()).unwrap();
    assert!(report.best.is_empty());
    assert_eq!(report.no_viable, instruments);
}

#[test]
fn result_does_not_depend_on_worker_count() {
    let instruments = vec!["EUR_USD".to_string(), "GBP_USD".to_string()];
    let single = optimizer(1, 1).optimize(StrategyId::MACrossover, &instruments, &market()).unwrap();
    let pooled = optimizer(1, 4).optimize(StrategyId::MACrossover, &instruments, &market()).unwrap();
    assert_eq!(single, pooled);

    let mut best = BestParameters::new();
    best.record(&pooled);
    let restored = BestParameters::from_json_str(&best.to_json_string().unwrap()).unwrap();
    assert_eq!(restored.get(StrategyId::MACrossover, "GBP_USD"), pooled.best.get("GBP_USD"));
}

#[test]
fn no_instruments_is_an_error() {
    assert!(optimizer(1, 1).optimize(StrategyId::MACrossover, &[], &market()).is_err());
}
