use allocator::{MetaOptimizer, Round, SharedAllocator, Ucb1Allocator};
use chrono::{Duration, TimeZone, Utc};
use configuration::{AllocatorSettings, RewardPolicy, Simulation, Strategies};
use core_types::{Bar, StrategyId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn zigzag(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            // 30 bars up, 30 bars down.
            let phase = (i % 60) as i64;
            let offset = if phase < 30 { phase } else { 60 - phase };
            let close = dec!(100) + Decimal::from(offset) * dec!(0.25);
            Bar {
                timestamp: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap() + Duration::hours(i as i64),
                open: close,
                high: close + dec!(0.3),
                low: close - dec!(0.3),
                close,
            }
        })
        .collect()
}

fn meta(rounds: usize) -> MetaOptimizer {
    let settings = AllocatorSettings {
        strategies: StrategyId::ALL.to_vec(),
        rounds,
        reward: RewardPolicy::RawPnl,
    };
    MetaOptimizer::new(settings, Strategies::default(), &Simulation::default())
}

#[test]
fn calibrates_every_arm_then_plays_each_round() {
    let bars = zigzag(320);
    let data = |_: Round| bars.clone();
    let optimizer = meta(6);
    let allocator = optimizer.new_allocator().unwrap();

    let report = optimizer.run(&allocator, &data).unwrap();

    assert_eq!(report.rounds, 6);
    assert_eq!(report.snapshot.arms.len(), 3);
    assert!(report.snapshot.arms.iter().all(|arm| arm.pull_count >= 1));
    let total: u64 = report.snapshot.arms.iter().map(|arm| arm.pull_count).sum();
    assert_eq!(total, 3 + 6);
    assert!(!report.winners.is_empty());
}

#[test]
fn restored_allocator_skips_calibration() {
    let bars = zigzag(320);
    let data = |_: Round| bars.clone();
    let optimizer = meta(4);

    let first = optimizer.run(&optimizer.new_allocator().unwrap(), &data).unwrap();
    let restored = SharedAllocator::new(Ucb1Allocator::from_snapshot(first.snapshot.clone()).unwrap());
    let second = optimizer.run(&restored, &data).unwrap();

    let pulls = |report: &allocator::MetaReport| -> u64 { report.snapshot.arms.iter().map(|a| a.pull_count).sum() };
    assert_eq!(pulls(&second), pulls(&first) + 4);
}

#[test]
fn identical_data_gives_identical_reports() {
    let bars = zigzag(320);
    let data = |_: Round| bars.clone();
    let optimizer = meta(5);
    let a = optimizer.run(&optimizer.new_allocator().unwrap(), &data).unwrap();
    let b = optimizer.run(&optimizer.new_allocator().unwrap(), &data).unwrap();
    assert_eq!(a, b);
}
