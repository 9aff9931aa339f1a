//! Same-day trading window shared by the intraday variants.
//!
//! Everything is read from the bar timestamp, never the wall clock, so a
//! replay is deterministic.

use chrono::NaiveTime;

use crate::domain::ohlcv::Bar;

pub(crate) fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntradayRules {
    /// First bar time at which entries are allowed.
    pub entry_start: NaiveTime,
    /// Open positions are closed with reason `eod` from this time on, and no
    /// entries are taken.
    pub eod_exit: NaiveTime,
    /// Entries below this close are ignored.
    pub min_price: f64,
}

impl IntradayRules {
    pub fn new(entry_start: NaiveTime, eod_exit: NaiveTime) -> Self {
        IntradayRules {
            entry_start,
            eod_exit,
            min_price: 5.0,
        }
    }

    pub fn is_eod(&self, bar: &Bar) -> bool {
        bar.timestamp.time() >= self.eod_exit
    }

    pub fn can_enter(&self, bar: &Bar) -> bool {
        let time = bar.timestamp.time();
        time >= self.entry_start && time < self.eod_exit && bar.close >= self.min_price
    }
}

/// Trailing bars that share the last bar's calendar date.
pub(crate) fn today(history: &[Bar]) -> &[Bar] {
    let Some(last) = history.last() else {
        return history;
    };
    let date = last.session_date();
    let start = history.partition_point(|b| b.session_date() < date);
    &history[start..]
}
