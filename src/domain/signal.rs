//! Strategy signals.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "buy"),
            Action::Sell => write!(f, "sell"),
            Action::Hold => write!(f, "hold"),
        }
    }
}

/// A decision emitted by a strategy for one bar. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub symbol: String,
    pub action: Action,
    pub strategy_name: String,
    pub reference_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub strength: f64,
    pub reason: String,
    pub timestamp: NaiveDateTime,
}

impl Signal {
    pub fn is_entry(&self) -> bool {
        self.action == Action::Buy
    }

    pub fn is_exit(&self) -> bool {
        self.action == Action::Sell
    }
}
