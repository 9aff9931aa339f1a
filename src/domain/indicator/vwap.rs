//! Volume Weighted Average Price.
//!
//! VWAP = sum(typical_price * volume) / sum(volume) with
//! typical_price = (high + low + close) / 3. `vwap` covers an arbitrary
//! window; `session_vwap` and [`SessionVwap`] restart at each calendar day.

use chrono::NaiveDate;

use crate::domain::ohlcv::Bar;

/// VWAP over `bars`; `None` when empty or total volume is zero.
pub fn vwap(bars: &[Bar]) -> Option<f64> {
    if bars.is_empty() {
        return None;
    }
    let total_volume: i64 = bars.iter().map(|b| b.volume).sum();
    if total_volume == 0 {
        return None;
    }
    let cum_pv: f64 = bars
        .iter()
        .map(|b| b.typical_price() * b.volume as f64)
        .sum();
    Some(cum_pv / total_volume as f64)
}

/// VWAP over the trailing bars that share the last bar's calendar date.
pub fn session_vwap(bars: &[Bar]) -> Option<f64> {
    let date = bars.last()?.session_date();
    let start = bars
        .iter()
        .rposition(|b| b.session_date() != date)
        .map_or(0, |i| i + 1);
    vwap(&bars[start..])
}

/// Incremental session VWAP fed one bar at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionVwap {
    session: Option<NaiveDate>,
    cum_pv: f64,
    cum_volume: i64,
}

impl SessionVwap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bar, resetting the accumulators when its date differs from the
    /// current session.
    pub fn update(&mut self, bar: &Bar) {
        let date = bar.session_date();
        if self.session != Some(date) {
            self.session = Some(date);
            self.cum_pv = 0.0;
            self.cum_volume = 0;
        }
        self.cum_pv += bar.typical_price() * bar.volume as f64;
        self.cum_volume += bar.volume;
    }

    pub fn value(&self) -> Option<f64> {
        if self.cum_volume == 0 {
            return None;
        }
        Some(self.cum_pv / self.cum_volume as f64)
    }

    pub fn session(&self) -> Option<NaiveDate> {
        self.session
    }
}
