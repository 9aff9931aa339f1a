//! Property tests for the engine and indicator invariants.

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;
use std::collections::HashMap;
use tradelab::domain::backtest::{run_backtest, BacktestConfig};
use tradelab::domain::indicator::{rsi, rsi_series};
use tradelab::domain::position::ExitReason;

fn closes(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..500.0, len)
}

proptest! {
    #[test]
    fn rsi_stays_in_range(prices in closes(2..120), period in 1usize..30) {
        if let Some(value) = rsi(&prices, period) {
            prop_assert!((0.0..=100.0).contains(&value));
        }
        for value in rsi_series(&prices, period).into_iter().flatten() {
            prop_assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn capital_is_conserved(
        spy in closes(5..40),
        qqq_gaps in prop::collection::vec(any::<bool>(), 40),
        schedule in prop::collection::vec((any::<bool>(), any::<bool>()), 40),
        commission in 0.0f64..10.0,
    ) {
        // QQQ misses some of SPY's timestamps but shares the last one, so the
        // final point marks both at the closes used for liquidation
        let last = spy.len() - 1;
        let qqq: Vec<Bar> = spy
            .iter()
            .enumerate()
            .filter(|(i, _)| !qqq_gaps[*i] || *i == last)
            .map(|(i, c)| make_bar(i as i64, c * 0.5 + 3.0))
            .collect();
        let bars = bar_map(vec![("SPY", series(&spy)), ("QQQ", qqq)]);

        let mut strategy = ScriptedStrategy::new();
        for (i, &(enter, exit)) in schedule.iter().enumerate().take(spy.len()) {
            if enter {
                strategy = strategy.enter_at("SPY", i as i64).enter_at("QQQ", i as i64);
            }
            if exit {
                strategy = strategy.exit_at("SPY", i as i64).exit_at("QQQ", i as i64);
            }
        }
        let config = BacktestConfig {
            commission_per_trade: commission,
            ..sample_config()
        };

        let result = run_backtest(&mut strategy, &symbols(&["SPY", "QQQ"]), &bars, &config)
            .unwrap();
        prop_assert_eq!(result.equity_curve.len(), spy.len());

        let close_at = |symbol: &str, t| {
            bars[symbol]
                .iter()
                .find(|b| b.timestamp == t)
                .map(|b| b.close)
        };

        // rebuild cash and holdings at every tick from the trade log
        for (i, &equity) in result.equity_curve.iter().enumerate() {
            let t = ts(i as i64);
            let mut cash = config.initial_capital;
            let mut held = 0.0;
            for trade in result.trades.iter().filter(|trade| trade.entry_time <= t) {
                let shares = trade.shares as f64;
                cash -= shares * trade.entry_price + commission;
                if trade.reason != ExitReason::EndOfTest && trade.exit_time <= t {
                    cash += shares * trade.exit_price - commission;
                } else {
                    held += shares * close_at(&trade.symbol, t).unwrap_or(trade.entry_price);
                }
            }
            assert_relative_eq!(cash + held, equity, epsilon = 1e-6);
        }

        // the last equity point is taken before liquidation, which only
        // costs the exit commissions; trade pnl excludes the entry commission
        let forced = result
            .trades
            .iter()
            .filter(|t| t.reason == ExitReason::EndOfTest)
            .count() as f64;
        let entries = result.trades.len() as f64;
        let realized: f64 = result.trades.iter().map(|t| t.pnl).sum();
        assert_relative_eq!(
            result.final_equity() - forced * commission,
            config.initial_capital + realized - entries * commission,
            epsilon = 1e-6
        );
        prop_assert!(result.equity_curve.iter().all(|e| *e > 0.0));
    }

    #[test]
    fn position_cap_never_exceeded(symbol_count in 1usize..8, cap in 1usize..6) {
        let names: Vec<String> = (0..symbol_count).map(|i| format!("S{i}")).collect();
        let bars: HashMap<String, Vec<Bar>> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let base = 10.0 + 7.0 * i as f64;
                (name.clone(), series(&[base, base + 1.0, base + 2.0, base + 1.5]))
            })
            .collect();

        let mut strategy = ScriptedStrategy::always_buy();
        let config = BacktestConfig {
            max_positions: cap,
            ..sample_config()
        };

        let result = run_backtest(&mut strategy, &names, &bars, &config).unwrap();

        // nothing exits before the end, so every trade was open at once
        prop_assert_eq!(result.trades.len(), symbol_count.min(cap));
        prop_assert!(result.trades.iter().all(|t| t.entry_time == ts(0)));
    }
}
