//! Average Directional Index.
//!
//! +DM/-DM compare consecutive bars; +DM, -DM and TR are Wilder-summed
//! (first value is the plain sum of n, then s - s/n + v). Each smoothed
//! step yields +DI, -DI and DX = 100 * |+DI - -DI| / (+DI + -DI), 0 when both
//! DI are zero. ADX is the Wilder average of DX, seeded with the mean of the
//! first n DX values. Needs at least 2n bars.

use crate::domain::ohlcv::Bar;

pub fn adx(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period * 2 {
        return None;
    }

    let mut plus_dm = Vec::with_capacity(bars.len() - 1);
    let mut minus_dm = Vec::with_capacity(bars.len() - 1);
    let mut true_ranges = Vec::with_capacity(bars.len() - 1);

    for w in bars.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);
        let up_move = cur.high - prev.high;
        let down_move = prev.low - cur.low;

        plus_dm.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
        true_ranges.push(cur.true_range(prev.close));
    }

    let smooth_plus = wilder_sum(&plus_dm, period);
    let smooth_minus = wilder_sum(&minus_dm, period);
    let smooth_tr = wilder_sum(&true_ranges, period);

    let dx_values: Vec<f64> = smooth_tr
        .iter()
        .zip(smooth_plus.iter().zip(&smooth_minus))
        .filter(|(tr, _)| **tr != 0.0)
        .map(|(tr, (p, m))| {
            let plus_di = 100.0 * p / tr;
            let minus_di = 100.0 * m / tr;
            let di_sum = plus_di + minus_di;
            if di_sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / di_sum
            }
        })
        .collect();

    if dx_values.len() < period {
        return None;
    }

    let n = period as f64;
    let seed = dx_values[..period].iter().sum::<f64>() / n;
    Some(
        dx_values[period..]
            .iter()
            .fold(seed, |acc, dx| (acc * (n - 1.0) + dx) / n),
    )
}

fn wilder_sum(values: &[f64], period: usize) -> Vec<f64> {
    if values.len() < period {
        return Vec::new();
    }
    let n = period as f64;
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut acc: f64 = values[..period].iter().sum();
    out.push(acc);
    for v in &values[period..] {
        acc = acc - acc / n + v;
        out.push(acc);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bars(hlc: &[(f64, f64, f64)]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        hlc.iter()
            .enumerate()
            .map(|(i, &(h, l, c))| {
                Bar::new(start + chrono::Duration::minutes(5 * i as i64), c, h, l, c, 100)
            })
            .collect()
    }

    fn choppy(n: usize) -> Vec<Bar> {
        let hlc: Vec<(f64, f64, f64)> = (0..n)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.7).sin() * 3.0 + i as f64 * 0.05;
                (c + 1.0 + (i % 3) as f64 * 0.2, c - 1.0 - (i % 2) as f64 * 0.3, c)
            })
            .collect();
        make_bars(&hlc)
    }

    /// Raw DX at the last bar, the un-smoothed value ADX must not equal.
    fn last_raw_dx(bars: &[Bar], period: usize) -> f64 {
        let mut p = Vec::new();
        let mut m = Vec::new();
        let mut t = Vec::new();
        for w in bars.windows(2) {
            let up = w[1].high - w[0].high;
            let down = w[0].low - w[1].low;
            p.push(if up > down && up > 0.0 { up } else { 0.0 });
            m.push(if down > up && down > 0.0 { down } else { 0.0 });
            t.push(w[1].true_range(w[0].close));
        }
        let sp = *wilder_sum(&p, period).last().unwrap();
        let sm = *wilder_sum(&m, period).last().unwrap();
        let st = *wilder_sum(&t, period).last().unwrap();
        let (pdi, mdi) = (100.0 * sp / st, 100.0 * sm / st);
        100.0 * (pdi - mdi).abs() / (pdi + mdi)
    }

    #[test]
    fn needs_two_periods() {
        assert_eq!(adx(&choppy(27), 14), None);
        assert!(adx(&choppy(28), 14).is_some());
        assert_eq!(adx(&choppy(28), 0), None);
    }

    #[test]
    fn adx_is_smoothed_not_raw_dx() {
        let bars = choppy(60);
        let value = adx(&bars, 14).unwrap();
        assert!((value - last_raw_dx(&bars, 14)).abs() > 1e-6);
    }

    #[test]
    fn strong_uptrend_reads_high() {
        let hlc: Vec<(f64, f64, f64)> = (0..40)
            .map(|i| {
                let c = 100.0 + 2.0 * i as f64;
                (c + 0.5, c - 0.5, c)
            })
            .collect();
        // every bar is pure +DM, so DX is 100 throughout
        assert_relative_eq!(adx(&make_bars(&hlc), 14).unwrap(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn flat_market_is_zero() {
        let hlc = vec![(101.0, 99.0, 100.0); 30];
        assert_relative_eq!(adx(&make_bars(&hlc), 14).unwrap(), 0.0);
    }

    #[test]
    fn bounded() {
        let value = adx(&choppy(120), 14).unwrap();
        assert!((0.0..=100.0).contains(&value));
    }

    #[test]
    fn wilder_sum_steps() {
        let s = wilder_sum(&[1.0, 2.0, 3.0, 4.0], 2);
        // 3, then 3 - 1.5 + 3 = 4.5, then 4.5 - 2.25 + 4 = 6.25
        assert_eq!(s, vec![3.0, 4.5, 6.25]);
    }
}
