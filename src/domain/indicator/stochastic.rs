//! Stochastic oscillator.
//!
//! %K = 100 * (close - lowest_low(k)) / (highest_high(k) - lowest_low(k)),
//! 50 when the range is zero. %D = SMA(%K, d). Needs at least k + d bars.

use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stochastic {
    pub k: f64,
    pub d: f64,
}

pub fn stochastic(bars: &[Bar], k_period: usize, d_period: usize) -> Option<Stochastic> {
    if k_period == 0 || d_period == 0 || bars.len() < k_period + d_period {
        return None;
    }

    let k_values: Vec<f64> = bars
        .windows(k_period)
        .map(|window| {
            let highest = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let lowest = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            let close = window[k_period - 1].close;
            if highest == lowest {
                50.0
            } else {
                100.0 * (close - lowest) / (highest - lowest)
            }
        })
        .collect();

    let k = *k_values.last()?;
    let d = k_values[k_values.len() - d_period..].iter().sum::<f64>() / d_period as f64;
    Some(Stochastic { k, d })
}
