//! Fill simulation: entry sizing, exit bookkeeping and gap-aware exit
//! price resolution.
//!
//! Exit levels are resolved from OHLC alone, so the true intrabar order of
//! a bar that touches both the stop and the target is unknowable. The level
//! closer to the bar's open is assumed to have traded first; an exact tie
//! goes to the target.

use chrono::NaiveDateTime;

use super::ohlcv::Bar;
use super::portfolio::Portfolio;
use super::position::{ExitReason, Position, TradeResult};
use super::signal::Signal;

/// Sizing and cost parameters applied to every fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    /// Percent of available cash committed per entry (10.0 == 10 %).
    pub position_size_pct: f64,
    pub commission_per_trade: f64,
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        shares: i64,
        execution_price: f64,
        cost: f64,
        commission: f64,
    },
    /// Sizing produced zero shares.
    ZeroShares,
    /// Cost plus commission exceeds available cash.
    InsufficientCapital,
}

/// A triggered hard-level exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitDecision {
    pub price: f64,
    pub reason: ExitReason,
}

/// Resolve stop/target exits for `position` against `bar`.
///
/// Returns `None` when neither level was touched; the caller then asks the
/// strategy for a discretionary exit.
pub fn resolve_exit(position: &Position, bar: &Bar) -> Option<ExitDecision> {
    let stop_hit = position.stop_hit(bar.low);
    let target_hit = position.target_hit(bar.high);

    match (position.stop_loss, position.take_profit) {
        (Some(stop), _) if stop_hit && bar.open < stop => Some(ExitDecision {
            price: bar.open,
            reason: ExitReason::StopLossGap,
        }),
        (_, Some(target)) if target_hit && bar.open > target => Some(ExitDecision {
            price: bar.open,
            reason: ExitReason::TakeProfitGap,
        }),
        (Some(stop), Some(target)) if stop_hit && target_hit => {
            if (bar.open - stop).abs() < (bar.open - target).abs() {
                Some(ExitDecision {
                    price: stop,
                    reason: ExitReason::StopLoss,
                })
            } else {
                Some(ExitDecision {
                    price: target,
                    reason: ExitReason::TakeProfit,
                })
            }
        }
        (Some(stop), _) if stop_hit => Some(ExitDecision {
            price: stop,
            reason: ExitReason::StopLoss,
        }),
        (_, Some(target)) if target_hit => Some(ExitDecision {
            price: target,
            reason: ExitReason::TakeProfit,
        }),
        _ => None,
    }
}

/// Open a long position at `bar.close` sized from available cash.
///
/// Steps:
/// 1. position value = cash * position_size_pct / 100
/// 2. shares = floor(position value / close); zero shares is a no-op
/// 3. reject if shares * close + commission exceeds cash
/// 4. debit cost + commission and record the position with the signal's levels
pub fn enter_position(
    portfolio: &mut Portfolio,
    bar: &Bar,
    signal: &Signal,
    config: &ExecutionConfig,
) -> EntryResult {
    let execution_price = bar.close;
    if execution_price <= 0.0 {
        return EntryResult::ZeroShares;
    }

    let position_value = portfolio.cash * config.position_size_pct / 100.0;
    let shares = (position_value / execution_price).floor() as i64;

    if shares <= 0 {
        return EntryResult::ZeroShares;
    }

    let cost = shares as f64 * execution_price;
    let commission = config.commission_per_trade;
    let total_cost = cost + commission;

    if total_cost > portfolio.cash {
        return EntryResult::InsufficientCapital;
    }

    portfolio.cash -= total_cost;
    portfolio.add_position(Position {
        symbol: signal.symbol.clone(),
        shares,
        entry_price: execution_price,
        entry_time: bar.timestamp,
        stop_loss: signal.stop_loss,
        take_profit: signal.take_profit,
        strategy_name: signal.strategy_name.clone(),
    });

    EntryResult::Entered {
        shares,
        execution_price,
        cost,
        commission,
    }
}

/// Close the position for `symbol` at `exit_price`.
///
/// Credits `exit_price * shares - commission`, records the trade and removes
/// the position. Returns `None` if no position is open for the symbol.
pub fn close_position(
    portfolio: &mut Portfolio,
    symbol: &str,
    exit_price: f64,
    exit_time: NaiveDateTime,
    reason: ExitReason,
    config: &ExecutionConfig,
) -> Option<TradeResult> {
    let position = portfolio.remove_position(symbol)?;
    let commission = config.commission_per_trade;
    let shares = position.shares as f64;

    let pnl = (exit_price - position.entry_price) * shares - commission;
    let pnl_pct = (exit_price - position.entry_price) / position.entry_price * 100.0;

    portfolio.cash += exit_price * shares - commission;

    let trade = TradeResult {
        symbol: position.symbol,
        strategy_name: position.strategy_name,
        entry_price: position.entry_price,
        entry_time: position.entry_time,
        exit_price,
        exit_time,
        shares: position.shares,
        pnl,
        pnl_pct,
        reason,
    };
    portfolio.record_trade(trade.clone());
    Some(trade)
}
