//! Strategy capability consumed by the backtest engine.

use crate::domain::ohlcv::Bar;
use crate::domain::signal::Signal;

pub trait StrategyPort {
    fn name(&self) -> &str;

    /// Decide on `bar` for `symbol`.
    ///
    /// `history` is oldest first and ends with `bar`. With `position_open`
    /// a `Sell` signal requests an exit; without, a `Buy` signal requests an
    /// entry. Any other result is ignored.
    fn evaluate(
        &mut self,
        symbol: &str,
        bar: &Bar,
        history: &[Bar],
        position_open: bool,
    ) -> Option<Signal>;

    /// Drop all per-symbol state. Called at the start of every run.
    fn reset(&mut self);
}
