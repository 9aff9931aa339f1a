//! Opening range breakout.
//!
//! The first hour of each session (09:30 to 10:30, both ends inclusive)
//! sets the range. After it closes, a bar closing above the range high on
//! heavy relative volume, above session VWAP and with a rising EMA is bought.
//! The stop sits just inside the range high and the target projects the range
//! height from the breakout close. Anything still open at 14:00 is closed.

use chrono::{Datelike, Duration, NaiveTime, Weekday};

use super::intraday::{hm, today, IntradayRules};
use super::Decision;
use crate::domain::indicator::{ema_series, vwap};
use crate::domain::ohlcv::{closes, Bar};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpeningRange {
    pub high: f64,
    pub low: f64,
}

impl OpeningRange {
    pub fn size(&self) -> f64 {
        self.high - self.low
    }
}

/// High and low of `session` bars stamped within `[start, end]`.
pub fn opening_range(session: &[Bar], start: NaiveTime, end: NaiveTime) -> Option<OpeningRange> {
    session
        .iter()
        .filter(|b| (start..=end).contains(&b.timestamp.time()))
        .fold(None, |range, b| {
            Some(match range {
                None => OpeningRange {
                    high: b.high,
                    low: b.low,
                },
                Some(r) => OpeningRange {
                    high: r.high.max(b.high),
                    low: r.low.min(b.low),
                },
            })
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpeningRangeParams {
    pub range_start: NaiveTime,
    pub range_end: NaiveTime,
    pub session: IntradayRules,
    pub min_relative_volume: f64,
    /// Calendar days searched for earlier sessions to compare volume with.
    pub volume_lookback_days: usize,
    pub ema_period: usize,
    /// Trailing bars fed to the EMA.
    pub lookback: usize,
    /// Stop distance below the range high, in percent of it.
    pub stop_buffer_pct: f64,
}

impl Default for OpeningRangeParams {
    fn default() -> Self {
        OpeningRangeParams {
            range_start: hm(9, 30),
            range_end: hm(10, 30),
            session: IntradayRules::new(hm(10, 30), hm(14, 0)),
            min_relative_volume: 1.5,
            volume_lookback_days: 20,
            ema_period: 20,
            lookback: 100,
            stop_buffer_pct: 0.1,
        }
    }
}

impl OpeningRangeParams {
    pub(crate) fn evaluate(&self, history: &[Bar], position_open: bool) -> Option<Decision> {
        let bar = history.last()?;
        if position_open {
            // stop and target ride on the position
            return self.session.is_eod(bar).then(|| Decision::exit("eod"));
        }
        if bar.timestamp.time() < self.range_end || !self.session.can_enter(bar) {
            return None;
        }

        let session = today(history);
        let range = opening_range(session, self.range_start, self.range_end)?;
        if bar.close <= range.high {
            return None;
        }

        let rel_volume = self.relative_volume(history)?;
        if rel_volume < self.min_relative_volume {
            return None;
        }

        let since_open: Vec<Bar> = session
            .iter()
            .filter(|b| b.timestamp.time() >= self.range_start)
            .cloned()
            .collect();
        if bar.close <= vwap(&since_open)? {
            return None;
        }

        let window = &history[history.len().saturating_sub(self.lookback)..];
        let ema = ema_series(&closes(window), self.ema_period);
        let mut valid = ema.iter().rev().flatten();
        let (current, previous) = (valid.next()?, valid.next()?);
        if current - previous <= 0.0 {
            return None;
        }

        let stop = range.high * (1.0 - self.stop_buffer_pct / 100.0);
        let target = bar.close + range.size();
        Some(
            Decision::enter(rel_volume, "ORB breakout above range high")
                .with_levels(Some(stop), Some(target)),
        )
    }

    /// Volume since the open today over the average volume traded up to the
    /// same time of day in earlier weekday sessions of the lookback window.
    pub fn relative_volume(&self, history: &[Bar]) -> Option<f64> {
        let bar = history.last()?;
        let now = bar.timestamp.time();
        let date = bar.session_date();
        let session = today(history);
        let earlier = &history[..history.len() - session.len()];

        let traded = |bars: &[Bar]| -> Option<i64> {
            let mut in_window = bars
                .iter()
                .filter(|b| (self.range_start..=now).contains(&b.timestamp.time()))
                .peekable();
            in_window.peek()?;
            Some(in_window.map(|b| b.volume).sum())
        };

        let current = traded(session)?;
        let cutoff = date - Duration::days(self.volume_lookback_days as i64);
        let from = earlier.partition_point(|b| b.session_date() < cutoff);
        let past: Vec<i64> = earlier[from..]
            .chunk_by(|a, b| a.session_date() == b.session_date())
            .filter(|day| !matches!(day[0].timestamp.weekday(), Weekday::Sat | Weekday::Sun))
            .filter_map(traded)
            .collect();
        if past.is_empty() {
            return None;
        }
        let average = past.iter().sum::<i64>() as f64 / past.len() as f64;
        (average > 0.0).then(|| current as f64 / average)
    }
}
