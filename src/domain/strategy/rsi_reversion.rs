//! Mean-reversion entries gated by a short RSI.
//!
//! Each variant reads `history` (oldest first, last bar current) and answers
//! with an exit decision when a position is open or an entry decision when
//! flat. Stops and targets are applied by the caller.

use chrono::NaiveDateTime;

use super::Decision;
use crate::domain::indicator::{bollinger, keltner, rsi, sma, SessionVwap};
use crate::domain::ohlcv::{closes, Bar};

/// Connors RSI(2): buy short-term oversold dips inside a long-term uptrend.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnorsRsi2Params {
    pub rsi_period: usize,
    pub rsi_entry: f64,
    pub rsi_exit: f64,
    pub ma_period: usize,
    pub ma_short_period: usize,
}

impl Default for ConnorsRsi2Params {
    fn default() -> Self {
        ConnorsRsi2Params {
            rsi_period: 2,
            rsi_entry: 5.0,
            rsi_exit: 60.0,
            ma_period: 200,
            ma_short_period: 5,
        }
    }
}

impl ConnorsRsi2Params {
    pub(crate) fn evaluate(&self, history: &[Bar], position_open: bool) -> Option<Decision> {
        if history.len() < self.ma_period + 1 {
            return None;
        }
        let closes = closes(history);
        let close = *closes.last()?;
        let rsi = rsi(&closes, self.rsi_period)?;
        let ma_long = sma(&closes, self.ma_period)?;
        let ma_short = sma(&closes, self.ma_short_period)?;

        if position_open {
            if rsi > self.rsi_exit {
                return Some(Decision::exit(format!("RSI={rsi:.1}")));
            }
            if close > ma_short {
                return Some(Decision::exit(format!(
                    "Close > {}MA",
                    self.ma_short_period
                )));
            }
            return None;
        }

        (rsi < self.rsi_entry && close > ma_long).then(|| {
            Decision::enter(
                self.rsi_entry - rsi,
                format!(
                    "RSI({})={rsi:.1}, above {}MA",
                    self.rsi_period, self.ma_period
                ),
            )
        })
    }
}

/// Sum of the last few RSI readings against a threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeRsiParams {
    pub rsi_period: usize,
    pub cumulative_bars: usize,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub ma_period: usize,
}

impl Default for CumulativeRsiParams {
    fn default() -> Self {
        CumulativeRsiParams {
            rsi_period: 2,
            cumulative_bars: 2,
            entry_threshold: 10.0,
            exit_threshold: 65.0,
            ma_period: 200,
        }
    }
}

impl CumulativeRsiParams {
    /// RSI evaluated on each of the last `cumulative_bars` prefixes, summed.
    fn cumulative_rsi(&self, closes: &[f64]) -> Option<f64> {
        if closes.len() < self.rsi_period + self.cumulative_bars + 1 {
            return None;
        }
        (0..self.cumulative_bars)
            .map(|i| rsi(&closes[..closes.len() - i], self.rsi_period))
            .sum()
    }

    pub(crate) fn evaluate(&self, history: &[Bar], position_open: bool) -> Option<Decision> {
        if history.len() < self.ma_period + 1 {
            return None;
        }
        let closes = closes(history);
        let close = *closes.last()?;
        let cum_rsi = self.cumulative_rsi(&closes)?;
        let ma = sma(&closes, self.ma_period)?;

        if position_open {
            return (cum_rsi > self.exit_threshold)
                .then(|| Decision::exit(format!("CumRSI={cum_rsi:.1}")));
        }

        (cum_rsi < self.entry_threshold && close > ma).then(|| {
            Decision::enter(
                self.entry_threshold - cum_rsi,
                format!("CumRSI={cum_rsi:.1}, above {}MA", self.ma_period),
            )
        })
    }
}

/// Close below the lower Bollinger band while RSI is oversold.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerRsiParams {
    pub bb_period: usize,
    pub bb_std: f64,
    pub rsi_period: usize,
    pub rsi_entry: f64,
    pub rsi_exit: f64,
}

impl Default for BollingerRsiParams {
    fn default() -> Self {
        BollingerRsiParams {
            bb_period: 20,
            bb_std: 2.0,
            rsi_period: 14,
            rsi_entry: 30.0,
            rsi_exit: 50.0,
        }
    }
}

impl BollingerRsiParams {
    pub(crate) fn evaluate(&self, history: &[Bar], position_open: bool) -> Option<Decision> {
        if history.len() < self.bb_period.max(self.rsi_period) + 1 {
            return None;
        }
        let closes = closes(history);
        let close = *closes.last()?;
        let bands = bollinger(&closes, self.bb_period, self.bb_std)?;
        let rsi = rsi(&closes, self.rsi_period)?;

        if position_open {
            if close > bands.middle {
                return Some(Decision::exit("Price>MidBB"));
            }
            if rsi > self.rsi_exit {
                return Some(Decision::exit(format!("RSI={rsi:.1}")));
            }
            return None;
        }

        (close < bands.lower && rsi < self.rsi_entry).then(|| {
            Decision::enter(
                self.rsi_entry - rsi,
                format!("RSI={rsi:.1}, below lower BB"),
            )
        })
    }
}

/// Close below the lower Keltner channel while RSI is oversold.
#[derive(Debug, Clone, PartialEq)]
pub struct KeltnerRsiParams {
    pub kc_period: usize,
    pub kc_multiplier: f64,
    pub rsi_period: usize,
    pub rsi_entry: f64,
    pub rsi_exit: f64,
}

impl Default for KeltnerRsiParams {
    fn default() -> Self {
        KeltnerRsiParams {
            kc_period: 20,
            kc_multiplier: 2.0,
            rsi_period: 14,
            rsi_entry: 30.0,
            rsi_exit: 50.0,
        }
    }
}

impl KeltnerRsiParams {
    pub(crate) fn evaluate(&self, history: &[Bar], position_open: bool) -> Option<Decision> {
        if history.len() < self.kc_period.max(self.rsi_period) + 1 {
            return None;
        }
        let closes = closes(history);
        let close = *closes.last()?;
        let channels = keltner(history, self.kc_period, self.kc_multiplier)?;
        let rsi = rsi(&closes, self.rsi_period)?;

        if position_open {
            if close > channels.middle {
                return Some(Decision::exit("Price>EMA"));
            }
            if rsi > self.rsi_exit {
                return Some(Decision::exit(format!("RSI={rsi:.1}")));
            }
            return None;
        }

        (close < channels.lower && rsi < self.rsi_entry).then(|| {
            Decision::enter(
                self.rsi_entry - rsi,
                format!("RSI={rsi:.1}, below lower KC"),
            )
        })
    }
}

/// Close below the session VWAP while RSI is oversold.
#[derive(Debug, Clone, PartialEq)]
pub struct VwapRsiParams {
    pub rsi_period: usize,
    pub rsi_entry: f64,
    pub rsi_exit: f64,
}

impl Default for VwapRsiParams {
    fn default() -> Self {
        VwapRsiParams {
            rsi_period: 14,
            rsi_entry: 35.0,
            rsi_exit: 55.0,
        }
    }
}

impl VwapRsiParams {
    /// `session` carries the running VWAP between calls; bars newer than the
    /// last one it consumed are fed in before deciding.
    pub(crate) fn evaluate(
        &self,
        history: &[Bar],
        position_open: bool,
        session: &mut SessionState,
    ) -> Option<Decision> {
        session.catch_up(history);
        if history.len() < self.rsi_period + 1 {
            return None;
        }
        let closes = closes(history);
        let close = *closes.last()?;
        let rsi = rsi(&closes, self.rsi_period)?;
        let vwap = session.vwap.value()?;

        if position_open {
            if close > vwap {
                return Some(Decision::exit("Price>VWAP"));
            }
            if rsi > self.rsi_exit {
                return Some(Decision::exit(format!("RSI={rsi:.1}")));
            }
            return None;
        }

        if close < vwap && rsi < self.rsi_entry {
            let discount_pct = (vwap - close) / vwap * 100.0;
            return Some(Decision::enter(
                discount_pct,
                format!("RSI={rsi:.1}, {discount_pct:.1}% below VWAP"),
            ));
        }
        None
    }
}

/// Per-symbol running VWAP.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub vwap: SessionVwap,
    last_seen: Option<NaiveDateTime>,
}

impl SessionState {
    fn catch_up(&mut self, history: &[Bar]) {
        let start = match self.last_seen {
            Some(ts) => history.partition_point(|b| b.timestamp <= ts),
            None => 0,
        };
        for bar in &history[start..] {
            self.vwap.update(bar);
            self.last_seen = Some(bar.timestamp);
        }
    }
}
