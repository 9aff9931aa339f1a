//! Symbol universe for multi-symbol backtests.
//!
//! Parses symbol lists from configuration and loads each symbol's bars,
//! skipping symbols with too little data to trade.

use crate::domain::error::TradelabError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

pub const MIN_BARS: usize = 30;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

/// Symbols that survived loading, in request order, with their bars.
#[derive(Debug, Clone)]
pub struct Universe {
    pub symbols: Vec<String>,
    pub bars_by_symbol: HashMap<String, Vec<Bar>>,
    pub skipped: Vec<SkippedSymbol>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.symbols.len()
    }

    pub fn total_bars(&self) -> usize {
        self.bars_by_symbol.values().map(Vec::len).sum()
    }
}

pub fn load_universe(
    data_port: &dyn DataPort,
    symbols: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    min_bars: usize,
) -> Result<Universe, TradelabError> {
    let mut loaded = Vec::new();
    let mut bars_by_symbol = HashMap::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        let bars = match data_port.fetch_bars(symbol, start, end) {
            Ok(bars) if bars.is_empty() => {
                log::warn!("skipping {symbol}: no data in range");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::NoData,
                });
                continue;
            }
            Ok(bars) => bars,
            Err(e) => {
                log::warn!("skipping {symbol}: {e}");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if bars.len() < min_bars {
            log::warn!(
                "skipping {symbol}: only {} bars, minimum {min_bars} required",
                bars.len()
            );
            skipped.push(SkippedSymbol {
                symbol: symbol.clone(),
                reason: SkipReason::InsufficientBars { bars: bars.len() },
            });
            continue;
        }

        log::debug!("{symbol}: {} bars", bars.len());
        loaded.push(symbol.clone());
        bars_by_symbol.insert(symbol.clone(), bars);
    }

    if loaded.is_empty() {
        return Err(TradelabError::NoData {
            symbol: symbols.join(","),
        });
    }

    if !skipped.is_empty() {
        log::info!(
            "backtesting {} of {} symbols",
            loaded.len(),
            loaded.len() + skipped.len()
        );
    }

    Ok(Universe {
        symbols: loaded,
        bars_by_symbol,
        skipped,
    })
}
