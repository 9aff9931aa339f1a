//! Technical indicator library.
//!
//! Every function is pure and returns `None` when the input is shorter than
//! the window requires or the period is zero. Close-based indicators take
//! `&[f64]`; indicators that need high/low/volume take `&[Bar]`. Series
//! variants return one `Option<f64>` per input element, aligned by index.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod heikin_ashi;
pub mod hma;
pub mod keltner;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;
pub mod vwap;
pub mod wma;

pub use adx::adx;
pub use atr::atr;
pub use bollinger::{bollinger, BollingerBands};
pub use ema::{ema, ema_series};
pub use heikin_ashi::{heikin_ashi, HaCandle};
pub use hma::{hma, hma_series};
pub use keltner::{keltner, KeltnerChannels};
pub use macd::{macd, Macd};
pub use rsi::{rsi, rsi_series};
pub use sma::{sma, sma_series};
pub use stddev::population_stddev;
pub use stochastic::{stochastic, Stochastic};
pub use vwap::{session_vwap, vwap, SessionVwap};
pub use wma::{wma, wma_series};

/// Last element of an aligned series, flattened.
pub fn latest(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}
