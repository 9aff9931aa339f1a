#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use tradelab::domain::backtest::BacktestConfig;
use tradelab::domain::error::TradelabError;
pub use tradelab::domain::ohlcv::Bar;
use tradelab::domain::signal::{Action, Signal};
use tradelab::ports::data_port::{within_dates, DataPort};
use tradelab::ports::strategy_port::StrategyPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, TradelabError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradelabError::DataQuery {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| within_dates(b.timestamp, start, end))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradelabError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, TradelabError> {
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => Ok(Some((
                bars[0].timestamp,
                bars[bars.len() - 1].timestamp,
                bars.len(),
            ))),
            _ => Ok(None),
        }
    }
}

/// Five-minute slot `n` of the session starting 2024-01-02 09:30.
pub fn ts(n: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
        + Duration::minutes(5 * n)
}

/// Flat-open bar with a one-point range either side of `close`.
pub fn make_bar(n: i64, close: f64) -> Bar {
    Bar::new(ts(n), close, close + 1.0, close - 1.0, close, 1_000)
}

pub fn make_ohlc(n: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar::new(ts(n), open, high, low, close, 1_000)
}

pub fn series(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i as i64, c))
        .collect()
}

/// Deterministic zig-zag around a drifting mean; enough movement for every
/// catalogue strategy to trade.
pub fn generate_bars(count: usize, start_price: f64, drift: f64) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let wave = [0.0, -1.5, -3.0, -4.0, -2.0, 1.0, 3.0, 4.5, 2.5, 0.5][i % 10];
            let mid = start_price + drift * i as f64 + wave;
            let open = mid - 0.3 * wave.signum();
            Bar::new(
                ts(i as i64),
                open,
                mid.max(open) + 0.6,
                mid.min(open) - 0.6,
                mid,
                1_000 + (i as i64 % 7) * 150,
            )
        })
        .collect()
}

pub fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn bar_map(entries: Vec<(&str, Vec<Bar>)>) -> HashMap<String, Vec<Bar>> {
    entries
        .into_iter()
        .map(|(s, bars)| (s.to_string(), bars))
        .collect()
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig::default()
}

/// Strategy that buys and sells at preset (symbol, timestamp) pairs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStrategy {
    entries: HashSet<(String, NaiveDateTime)>,
    exits: HashSet<(String, NaiveDateTime)>,
    always_buy: bool,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
    pub resets: usize,
}

impl ScriptedStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buys every symbol whenever flat.
    pub fn always_buy() -> Self {
        Self {
            always_buy: true,
            ..Self::default()
        }
    }

    pub fn enter_at(mut self, symbol: &str, n: i64) -> Self {
        self.entries.insert((symbol.to_string(), ts(n)));
        self
    }

    pub fn exit_at(mut self, symbol: &str, n: i64) -> Self {
        self.exits.insert((symbol.to_string(), ts(n)));
        self
    }

    pub fn with_levels(mut self, stop_loss: Option<f64>, take_profit: Option<f64>) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }

    fn signal(&self, symbol: &str, bar: &Bar, action: Action, reason: &str) -> Signal {
        Signal {
            symbol: symbol.to_string(),
            action,
            strategy_name: "scripted".to_string(),
            reference_price: bar.close,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            strength: 1.0,
            reason: reason.to_string(),
            timestamp: bar.timestamp,
        }
    }
}

impl StrategyPort for ScriptedStrategy {
    fn name(&self) -> &str {
        "scripted"
    }

    fn evaluate(
        &mut self,
        symbol: &str,
        bar: &Bar,
        _history: &[Bar],
        position_open: bool,
    ) -> Option<Signal> {
        let key = (symbol.to_string(), bar.timestamp);
        if position_open {
            self.exits
                .contains(&key)
                .then(|| self.signal(symbol, bar, Action::Sell, "scripted exit"))
        } else if self.always_buy || self.entries.contains(&key) {
            Some(self.signal(symbol, bar, Action::Buy, "scripted entry"))
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.resets += 1;
    }
}
