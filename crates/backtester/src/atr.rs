use core_types::Bar;
use rust_decimal::Decimal;

fn true_range(bar: &Bar, prev_close: Decimal) -> Decimal {
    let high_low = bar.high - bar.low;
    let high_close = (bar.high - prev_close).abs();
    let low_close = (bar.low - prev_close).abs();
    high_low.max(high_close).max(low_close)
}

/// Average true range of the `period` bars ending at `index`.
///
/// Each true range looks one bar back, so `bars[index - period..=index]`
/// must exist. Returns `None` when it does not or `period` is zero.
pub fn average_true_range(bars: &[Bar], index: usize, period: usize) -> Option<Decimal> {
    if period == 0 || index < period || index >= bars.len() {
        return None;
    }
    let window = &bars[index - period..=index];
    let sum: Decimal = window.windows(2).map(|pair| true_range(&pair[1], pair[0].close)).sum();
    Some(sum / Decimal::from(period))
}
