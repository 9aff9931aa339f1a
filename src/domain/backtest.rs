//! Backtest engine and event loop.
//!
//! The simulation clock is the sorted union of the timestamps of every series
//! in the bar map, requested or not. At each tick exits are resolved before
//! entries, then one equity point is recorded with open positions marked at
//! this tick's closes. Positions still open after the last tick are closed at
//! their symbol's final bar.

use std::collections::{HashMap, HashSet};

use log::{debug, info, trace};
use rayon::prelude::*;

use super::error::TradelabError;
use super::execution::{
    close_position, enter_position, resolve_exit, EntryResult, ExecutionConfig, ExitDecision,
};
use super::metrics::{Metrics, MetricsOptions};
use super::ohlcv::Bar;
use super::portfolio::Portfolio;
use super::position::{ExitReason, TradeResult};
use super::signal::Signal;
use super::symbol_data::{build_unified_timeline, SymbolData};
use crate::ports::strategy_port::StrategyPort;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Percent of available cash per entry (10.0 == 10 %).
    pub position_size_pct: f64,
    pub max_positions: usize,
    pub commission_per_trade: f64,
    pub metrics: MetricsOptions,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            position_size_pct: 10.0,
            max_positions: 5,
            commission_per_trade: 0.0,
            metrics: MetricsOptions::default(),
        }
    }
}

impl BacktestConfig {
    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            position_size_pct: self.position_size_pct,
            commission_per_trade: self.commission_per_trade,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub config: BacktestConfig,
    pub trades: Vec<TradeResult>,
    /// One point per timeline tick.
    pub equity_curve: Vec<f64>,
    pub metrics: Metrics,
}

impl BacktestResult {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .copied()
            .unwrap_or(self.config.initial_capital)
    }
}

/// Replay `symbols` from `bars_by_symbol` through `strategy`.
///
/// Fails only on structurally invalid input: a requested symbol missing from
/// the map, or a series that is not strictly ascending by timestamp. Rejected
/// entries (zero shares, insufficient cash, position cap) are silent.
pub fn run_backtest<S>(
    strategy: &mut S,
    symbols: &[String],
    bars_by_symbol: &HashMap<String, Vec<Bar>>,
    config: &BacktestConfig,
) -> Result<BacktestResult, TradelabError>
where
    S: StrategyPort + ?Sized,
{
    let mut seen = HashSet::new();
    let series = symbols
        .iter()
        .filter(|s| seen.insert(s.as_str()))
        .map(|symbol| {
            let bars = bars_by_symbol
                .get(symbol)
                .ok_or_else(|| TradelabError::UnknownSymbol {
                    symbol: symbol.clone(),
                })?;
            SymbolData::new(symbol, bars)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let timeline = build_unified_timeline(bars_by_symbol.values().map(Vec::as_slice));
    let execution = config.execution();
    let mut portfolio = Portfolio::new(config.initial_capital);

    strategy.reset();
    debug!(
        "{}: {} symbols, {} timestamps",
        strategy.name(),
        series.len(),
        timeline.len()
    );

    for &timestamp in &timeline {
        // symbols without a bar this tick fall back to their entry price
        let mut current_prices: HashMap<String, f64> = HashMap::new();

        // exit pass
        for sd in &series {
            let Some(idx) = sd.get_bar_index(timestamp) else {
                continue;
            };
            let bar = &sd.bars[idx];
            current_prices.insert(sd.symbol.to_string(), bar.close);

            let Some(position) = portfolio.get_position(sd.symbol) else {
                continue;
            };
            let exit = match resolve_exit(position, bar) {
                Some(decision) => Some(decision),
                None => strategy
                    .evaluate(sd.symbol, bar, sd.history(idx), true)
                    .filter(Signal::is_exit)
                    .map(|signal| ExitDecision {
                        price: bar.close,
                        reason: ExitReason::from_signal(&signal.reason),
                    }),
            };
            let Some(exit) = exit else {
                continue;
            };
            if let Some(trade) = close_position(
                &mut portfolio,
                sd.symbol,
                exit.price,
                bar.timestamp,
                exit.reason,
                &execution,
            ) {
                debug!(
                    "{} exit {} x{} @ {:.4} ({}) pnl {:.2}",
                    trade.exit_time, trade.symbol, trade.shares, trade.exit_price, trade.reason,
                    trade.pnl
                );
            }
        }

        // entry pass
        for sd in &series {
            let Some(idx) = sd.get_bar_index(timestamp) else {
                continue;
            };
            if portfolio.has_position(sd.symbol) {
                continue;
            }
            if portfolio.position_count() >= config.max_positions {
                trace!(
                    "{timestamp}: position cap {} reached, skipping remaining entries",
                    config.max_positions
                );
                break;
            }

            let bar = &sd.bars[idx];
            let Some(signal) = strategy
                .evaluate(sd.symbol, bar, sd.history(idx), false)
                .filter(Signal::is_entry)
            else {
                continue;
            };
            match enter_position(&mut portfolio, bar, &signal, &execution) {
                EntryResult::Entered {
                    shares,
                    execution_price,
                    ..
                } => debug!(
                    "{timestamp} entry {} x{shares} @ {execution_price:.4} ({})",
                    sd.symbol, signal.reason
                ),
                rejected => trace!("{timestamp} entry {} rejected: {rejected:?}", sd.symbol),
            }
        }

        let equity = portfolio.total_equity(&current_prices);
        portfolio.record_equity(equity);
    }

    for sd in &series {
        if !portfolio.has_position(sd.symbol) {
            continue;
        }
        let Some(last) = sd.last_bar() else {
            continue;
        };
        if let Some(trade) = close_position(
            &mut portfolio,
            sd.symbol,
            last.close,
            last.timestamp,
            ExitReason::EndOfTest,
            &execution,
        ) {
            debug!(
                "{} forced exit {} @ {:.4} pnl {:.2}",
                trade.exit_time, trade.symbol, trade.exit_price, trade.pnl
            );
        }
    }

    let metrics = Metrics::compute_with(
        &portfolio.closed_trades,
        &portfolio.equity_curve,
        config.initial_capital,
        &config.metrics,
    );

    info!(
        "{}: {} trades, return {:.2}%, max drawdown {:.2}%",
        strategy.name(),
        metrics.total_trades,
        metrics.total_return_pct,
        metrics.max_drawdown
    );

    Ok(BacktestResult {
        strategy_name: strategy.name().to_string(),
        config: config.clone(),
        trades: portfolio.closed_trades,
        equity_curve: portfolio.equity_curve,
        metrics,
    })
}

/// Run independent (strategy, config) jobs over the same bars in parallel.
/// Results come back in job order.
pub fn run_batch<S>(
    jobs: Vec<(S, BacktestConfig)>,
    symbols: &[String],
    bars_by_symbol: &HashMap<String, Vec<Bar>>,
) -> Vec<Result<BacktestResult, TradelabError>>
where
    S: StrategyPort + Send,
{
    jobs.into_par_iter()
        .map(|(mut strategy, config)| run_backtest(&mut strategy, symbols, bars_by_symbol, &config))
        .collect()
}
