//! Bollinger Bands.
//!
//! middle = SMA(n); bands = middle ± k * population stddev(n);
//! %B = (close - lower) / (upper - lower), 0.5 when the bands coincide.

use super::stddev::population_stddev;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub percent_b: f64,
}

pub fn bollinger(closes: &[f64], period: usize, std_mult: f64) -> Option<BollingerBands> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let sd = population_stddev(window)?;

    let upper = middle + std_mult * sd;
    let lower = middle - std_mult * sd;
    let close = closes[closes.len() - 1];
    let percent_b = if upper != lower {
        (close - lower) / (upper - lower)
    } else {
        0.5
    };

    Some(BollingerBands {
        upper,
        middle,
        lower,
        percent_b,
    })
}
