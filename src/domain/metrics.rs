//! Performance metrics computed from a run's trades and equity curve.

use std::collections::BTreeMap;

use super::position::TradeResult;

/// 252 sessions of 78 five-minute bars.
pub const DEFAULT_PERIODS_PER_YEAR: f64 = 252.0 * 78.0;

/// Annualisation parameters for the ratio metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsOptions {
    pub periods_per_year: f64,
    /// Annual rate, as a fraction.
    pub risk_free_rate: f64,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        MetricsOptions {
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            risk_free_rate: 0.0,
        }
    }
}

/// Percentages are on a 0-100 scale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub total_return_pct: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub calmar_ratio: f64,
}

impl Metrics {
    pub fn compute(trades: &[TradeResult], equity_curve: &[f64], initial_capital: f64) -> Self {
        Self::compute_with(trades, equity_curve, initial_capital, &MetricsOptions::default())
    }

    /// An empty trade list yields the all-zero record.
    pub fn compute_with(
        trades: &[TradeResult],
        equity_curve: &[f64],
        initial_capital: f64,
        options: &MetricsOptions,
    ) -> Self {
        if trades.is_empty() {
            return Metrics::default();
        }

        let mut winning_trades = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;

        for trade in trades {
            if trade.is_winner() {
                winning_trades += 1;
                gross_profit += trade.pnl;
            } else {
                gross_loss += trade.pnl;
            }
        }
        let gross_loss = gross_loss.abs();

        let total_trades = trades.len();
        let losing_trades = total_trades - winning_trades;
        let win_rate = winning_trades as f64 / total_trades as f64 * 100.0;

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if winning_trades > 0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if winning_trades > 0 {
            gross_profit / winning_trades as f64
        } else {
            0.0
        };
        let avg_loss = if losing_trades > 0 {
            gross_loss / losing_trades as f64
        } else {
            0.0
        };

        let total_return_pct = match equity_curve.last() {
            Some(last) if initial_capital > 0.0 => (last - initial_capital) / initial_capital * 100.0,
            _ => 0.0,
        };

        Metrics {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            profit_factor,
            total_pnl: trades.iter().map(|t| t.pnl).sum(),
            avg_win,
            avg_loss,
            total_return_pct,
            max_drawdown: max_drawdown(equity_curve),
            sharpe_ratio: sharpe_ratio(equity_curve, options),
            calmar_ratio: calmar_ratio(equity_curve, options),
        }
    }
}

/// Largest peak-to-trough decline, in percent. 0 for fewer than two points.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }

    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;
    for &equity in equity_curve {
        if equity > peak {
            peak = equity;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - equity) / peak * 100.0);
        }
    }
    max_dd
}

/// Annualised Sharpe ratio of per-step returns.
///
/// Steps whose previous equity is not positive are skipped. Returns 0 with
/// fewer than two returns or a zero sample standard deviation.
pub fn sharpe_ratio(equity_curve: &[f64], options: &MetricsOptions) -> f64 {
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev == 0.0 {
        return 0.0;
    }

    let annual_return = mean * options.periods_per_year;
    let annual_stddev = stddev * options.periods_per_year.sqrt();
    (annual_return - options.risk_free_rate) / annual_stddev
}

/// Annualised total return over max drawdown (as a fraction).
///
/// Infinity when there is no drawdown; 0 for fewer than two points.
pub fn calmar_ratio(equity_curve: &[f64], options: &MetricsOptions) -> f64 {
    if equity_curve.len() < 2 || equity_curve[0] == 0.0 {
        return 0.0;
    }

    let first = equity_curve[0];
    let last = equity_curve[equity_curve.len() - 1];
    let total_return = (last - first) / first;
    let annual_return = total_return * (options.periods_per_year / equity_curve.len() as f64);

    let max_dd = max_drawdown(equity_curve) / 100.0;
    if max_dd == 0.0 {
        return f64::INFINITY;
    }
    annual_return / max_dd
}

/// Trade statistics for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSummary {
    pub symbol: String,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
}

impl SymbolSummary {
    /// Group trades by symbol, sorted by symbol.
    pub fn compute_per_symbol(trades: &[TradeResult]) -> Vec<SymbolSummary> {
        let mut grouped: BTreeMap<&str, Vec<&TradeResult>> = BTreeMap::new();
        for trade in trades {
            grouped.entry(trade.symbol.as_str()).or_default().push(trade);
        }

        grouped
            .into_iter()
            .map(|(symbol, symbol_trades)| {
                let total_trades = symbol_trades.len();
                let winning_trades = symbol_trades.iter().filter(|t| t.is_winner()).count();
                SymbolSummary {
                    symbol: symbol.to_string(),
                    total_trades,
                    winning_trades,
                    losing_trades: total_trades - winning_trades,
                    win_rate: winning_trades as f64 / total_trades as f64 * 100.0,
                    total_pnl: symbol_trades.iter().map(|t| t.pnl).sum(),
                }
            })
            .collect()
    }
}
