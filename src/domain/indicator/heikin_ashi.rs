//! Heikin-Ashi candle transform.
//!
//! ha_close = (O + H + L + C) / 4; ha_open = (prev ha_open + prev ha_close) / 2,
//! or (O + C) / 2 for the first candle; ha_high/ha_low extend the raw range to
//! cover the HA body.

use crate::domain::ohlcv::Bar;

const FLAT_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaCandle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl HaCandle {
    pub fn is_green(&self) -> bool {
        self.close > self.open
    }

    pub fn is_red(&self) -> bool {
        self.close < self.open
    }

    /// No lower wick.
    pub fn is_flat_bottom(&self) -> bool {
        (self.low - self.open.min(self.close)).abs() < FLAT_TOLERANCE
    }

    /// No upper wick.
    pub fn is_flat_top(&self) -> bool {
        (self.high - self.open.max(self.close)).abs() < FLAT_TOLERANCE
    }
}

pub fn heikin_ashi(bars: &[Bar]) -> Vec<HaCandle> {
    let mut candles: Vec<HaCandle> = Vec::with_capacity(bars.len());
    for bar in bars {
        let close = (bar.open + bar.high + bar.low + bar.close) / 4.0;
        let open = match candles.last() {
            Some(prev) => (prev.open + prev.close) / 2.0,
            None => (bar.open + bar.close) / 2.0,
        };
        candles.push(HaCandle {
            open,
            high: bar.high.max(open).max(close),
            low: bar.low.min(open).min(close),
            close,
        });
    }
    candles
}
