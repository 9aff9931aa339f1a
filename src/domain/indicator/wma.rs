//! Weighted Moving Average (linear weights 1..n, newest heaviest).

pub fn wma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    Some(weighted(&values[values.len() - period..]))
}

/// WMA at every index; the first `period - 1` entries are `None`.
pub fn wma_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                Some(weighted(&values[i + 1 - period..=i]))
            }
        })
        .collect()
}

fn weighted(window: &[f64]) -> f64 {
    let n = window.len();
    let weight_sum = (n * (n + 1)) as f64 / 2.0;
    let total: f64 = window
        .iter()
        .enumerate()
        .map(|(i, v)| v * (i + 1) as f64)
        .sum();
    total / weight_sum
}
