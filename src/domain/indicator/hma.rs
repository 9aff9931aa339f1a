//! Hull Moving Average: WMA(2*WMA(n/2) - WMA(n), floor(sqrt(n))).
//!
//! The outer WMA runs over the raw difference series from the first index
//! where WMA(n) is defined.

use super::wma::wma_series;

pub fn hma(values: &[f64], period: usize) -> Option<f64> {
    hma_series(values, period).last().copied().flatten()
}

pub fn hma_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let half = period / 2;
    if half == 0 || values.len() < period {
        return vec![None; values.len()];
    }
    let sqrt_period = (period as f64).sqrt().floor() as usize;

    let wma_half = wma_series(values, half);
    let wma_full = wma_series(values, period);

    let raw: Vec<f64> = wma_half[period - 1..]
        .iter()
        .zip(&wma_full[period - 1..])
        .filter_map(|(h, f)| Some(2.0 * (*h)? - (*f)?))
        .collect();

    if raw.len() < sqrt_period {
        return vec![None; values.len()];
    }

    let smoothed = wma_series(&raw, sqrt_period);
    let mut out = vec![None; values.len() - smoothed.len()];
    out.extend(smoothed);
    out
}
