//! MACD.
//!
//! The MACD line is EMA(fast) - EMA(slow) evaluated at every prefix from
//! index `slow` onward. The signal line is an EMA of that MACD series, not an
//! arithmetic mean of it. Needs at least `slow + signal` closes.

use super::ema::{ema, ema_series};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if fast == 0 || slow == 0 || signal == 0 || closes.len() < slow + signal {
        return None;
    }

    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);

    let line_series: Vec<f64> = (slow - 1..closes.len())
        .filter_map(|i| Some(fast_ema[i]? - slow_ema[i]?))
        .collect();

    let line = *line_series.last()?;
    let signal_line = ema(&line_series, signal)?;

    Some(Macd {
        line,
        signal: signal_line,
        histogram: line - signal_line,
    })
}
