//! Open positions and closed trade records.

use chrono::{Duration, NaiveDateTime};
use std::fmt;

/// A long position held by the engine between entry and exit.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub shares: i64,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub strategy_name: String,
}

impl Position {
    /// shares * entry_price
    pub fn cost_basis(&self) -> f64 {
        self.shares as f64 * self.entry_price
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.shares as f64
    }

    pub fn unrealized_pnl_pct(&self, price: f64) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (price - self.entry_price) / self.entry_price * 100.0
    }

    /// Stop is hit when the bar's low reaches it.
    pub fn stop_hit(&self, low: f64) -> bool {
        self.stop_loss.is_some_and(|stop| low <= stop)
    }

    /// Target is hit when the bar's high reaches it.
    pub fn target_hit(&self, high: f64) -> bool {
        self.take_profit.is_some_and(|target| high >= target)
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    StopLossGap,
    TakeProfit,
    TakeProfitGap,
    EndOfTest,
    /// Strategy exit; carries the strategy's reason text.
    Signal(String),
}

impl ExitReason {
    /// Build a signal exit, defaulting blank reasons to `signal`.
    pub fn from_signal(reason: &str) -> Self {
        if reason.trim().is_empty() {
            ExitReason::Signal("signal".to_string())
        } else {
            ExitReason::Signal(reason.to_string())
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::StopLossGap => write!(f, "stop_loss_gap"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
            ExitReason::TakeProfitGap => write!(f, "take_profit_gap"),
            ExitReason::EndOfTest => write!(f, "end_of_test"),
            ExitReason::Signal(reason) => write!(f, "{reason}"),
        }
    }
}

/// Immutable record of a closed position.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeResult {
    pub symbol: String,
    pub strategy_name: String,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_time: NaiveDateTime,
    pub shares: i64,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub reason: ExitReason,
}

impl TradeResult {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn holding_period(&self) -> Duration {
        self.exit_time - self.entry_time
    }
}
