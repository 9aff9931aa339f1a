//! Average True Range.
//!
//! TR[i] = max(high - low, |high - prev_close|, |low - prev_close|) for i >= 1.
//! The first ATR is the mean of the first n true ranges, then
//! ATR = (prev * (n-1) + TR) / n. Needs at least n + 1 bars.

use crate::domain::ohlcv::Bar;

pub fn atr(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }

    let true_ranges: Vec<f64> = bars
        .windows(2)
        .map(|w| w[1].true_range(w[0].close))
        .collect();

    let n = period as f64;
    let seed = true_ranges[..period].iter().sum::<f64>() / n;
    Some(
        true_ranges[period..]
            .iter()
            .fold(seed, |acc, tr| (acc * (n - 1.0) + tr) / n),
    )
}
