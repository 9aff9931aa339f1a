//! Trend entries on Heikin-Ashi candles crossing a weighted average.
//!
//! Both variants look only at the trailing `lookback` bars and trade inside
//! one session: entries from 09:35, forced `eod` exit at 15:45.

use super::intraday::{hm, IntradayRules};
use super::Decision;
use crate::domain::indicator::{heikin_ashi, hma_series, wma_series};
use crate::domain::ohlcv::{closes, Bar};

fn trailing(history: &[Bar], lookback: usize) -> &[Bar] {
    &history[history.len().saturating_sub(lookback)..]
}

/// Two green flat-bottomed HA candles that have just crossed above WMA(n).
#[derive(Debug, Clone, PartialEq)]
pub struct WmaHeikinAshiParams {
    pub wma_period: usize,
    pub lookback: usize,
    pub min_bars: usize,
    pub session: IntradayRules,
}

impl Default for WmaHeikinAshiParams {
    fn default() -> Self {
        WmaHeikinAshiParams {
            wma_period: 20,
            lookback: 50,
            min_bars: 25,
            session: IntradayRules::new(hm(9, 35), hm(15, 45)),
        }
    }
}

impl WmaHeikinAshiParams {
    pub(crate) fn evaluate(&self, history: &[Bar], position_open: bool) -> Option<Decision> {
        let window = trailing(history, self.lookback);
        if window.len() < self.min_bars.max(3) {
            return None;
        }
        let bar = &window[window.len() - 1];
        if position_open && self.session.is_eod(bar) {
            return Some(Decision::exit("eod"));
        }
        if !position_open && !self.session.can_enter(bar) {
            return None;
        }
        let wma = wma_series(&closes(window), self.wma_period);
        let ha = heikin_ashi(window);
        let n = ha.len();
        let (current, prev, prev2) = (ha[n - 1], ha[n - 2], ha[n - 3]);
        let current_wma = wma[n - 1]?;

        if position_open {
            if current.close < current_wma {
                return Some(Decision::exit("HA<WMA"));
            }
            if current.is_red() {
                return Some(Decision::exit("HA red"));
            }
            if !current.is_flat_bottom() && prev.is_flat_bottom() {
                return Some(Decision::exit("Lower wick"));
            }
            return None;
        }

        let two_strong = [current, prev]
            .iter()
            .all(|c| c.is_green() && c.is_flat_bottom());
        if !two_strong || current.close <= current_wma {
            return None;
        }
        // already above the average before the two green candles
        if wma[n - 3].is_some_and(|w| prev2.close > w) {
            return None;
        }
        Some(Decision::enter(
            1.0,
            format!("HA crossed above WMA({})", self.wma_period),
        ))
    }
}

/// A green HA candle crossing above HMA(n).
#[derive(Debug, Clone, PartialEq)]
pub struct HmaHeikinAshiParams {
    pub hma_period: usize,
    pub lookback: usize,
    pub min_bars: usize,
    pub session: IntradayRules,
}

impl Default for HmaHeikinAshiParams {
    fn default() -> Self {
        HmaHeikinAshiParams {
            hma_period: 9,
            lookback: 50,
            min_bars: 20,
            session: IntradayRules::new(hm(9, 35), hm(15, 45)),
        }
    }
}

impl HmaHeikinAshiParams {
    pub(crate) fn evaluate(&self, history: &[Bar], position_open: bool) -> Option<Decision> {
        let window = trailing(history, self.lookback);
        if window.len() < self.min_bars.max(3) {
            return None;
        }
        let bar = &window[window.len() - 1];
        if position_open && self.session.is_eod(bar) {
            return Some(Decision::exit("eod"));
        }
        if !position_open && !self.session.can_enter(bar) {
            return None;
        }
        let hma = hma_series(&closes(window), self.hma_period);
        let ha = heikin_ashi(window);
        let n = ha.len();
        let (current, prev) = (ha[n - 1], ha[n - 2]);
        let current_hma = hma[n - 1]?;
        let prev_hma = hma[n - 2]?;

        if position_open {
            if current.close < current_hma && prev.close < prev_hma {
                return Some(Decision::exit("2 HA closes below HMA"));
            }
            if current.is_red() && prev.is_red() {
                return Some(Decision::exit("2 red HA"));
            }
            return None;
        }

        (current.is_green() && current.close > current_hma && prev.close <= prev_hma).then(|| {
            Decision::enter(1.0, format!("HA crossed above HMA({})", self.hma_period))
        })
    }
}
