//! Keltner Channels: EMA(n) ± multiplier * ATR(n).

use super::{atr::atr, ema::ema};
use crate::domain::ohlcv::{closes, Bar};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeltnerChannels {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn keltner(bars: &[Bar], period: usize, multiplier: f64) -> Option<KeltnerChannels> {
    let middle = ema(&closes(bars), period)?;
    let range = atr(bars, period)?;
    Some(KeltnerChannels {
        upper: middle + multiplier * range,
        middle,
        lower: middle - multiplier * range,
    })
}
