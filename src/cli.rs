//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_data_config, validate_strategy_config,
};
use crate::domain::error::TradelabError;
use crate::domain::metrics::{MetricsOptions, SymbolSummary, DEFAULT_PERIODS_PER_YEAR};
use crate::domain::strategy::{Strategy, StrategyKind, STRATEGY_NAMES};
use crate::domain::universe::{load_universe, parse_symbols, SkipReason, Universe, MIN_BARS};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "tradelab", about = "Deterministic multi-symbol strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Catalogue key overriding [strategy] kind
        #[arg(short, long)]
        strategy: Option<String>,
        /// Comma-separated symbols overriding [backtest] symbols
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// List the strategy catalogue
    Strategies,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            strategy,
            symbols,
        } => run_backtest(&config, strategy.as_deref(), symbols.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
        Command::Strategies => {
            print!("{}", format_catalogue());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TradelabError> {
    log::info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

fn run_backtest(
    config_path: &Path,
    strategy_override: Option<&str>,
    symbols_override: Option<&str>,
) -> Result<(), TradelabError> {
    let config = load_config(config_path)?;

    validate_backtest_config(&config)?;
    validate_data_config(&config)?;
    if strategy_override.is_none() {
        validate_strategy_config(&config)?;
    }

    let mut strategy = Strategy::from_config(&config, strategy_override)?;
    log::info!("strategy: {} ({})", strategy.name, strategy.kind.key());

    let bt_config = build_backtest_config(&config)?;
    let symbols = resolve_symbols(symbols_override, &config)?;
    let start = parse_date(&config, "start_date")?;
    let end = parse_date(&config, "end_date")?;

    let data_port = open_data_port(&config)?;
    let min_bars = config.get_int("data", "min_bars", MIN_BARS as i64).max(1) as usize;
    let universe = load_universe(data_port.as_ref(), &symbols, start, end, min_bars)?;

    log::info!(
        "running backtest: {} symbols, {} bars",
        universe.count(),
        universe.total_bars()
    );
    let result = backtest_engine::run_backtest(
        &mut strategy,
        &universe.symbols,
        &universe.bars_by_symbol,
        &bt_config,
    )?;

    print!("{}", format_report(&result, &universe));
    Ok(())
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TradelabError> {
    let defaults = BacktestConfig::default();
    let max_positions = config.get_int("backtest", "max_positions", defaults.max_positions as i64);
    if max_positions < 1 {
        return Err(TradelabError::ConfigInvalid {
            section: "backtest".into(),
            key: "max_positions".into(),
            reason: "max_positions must be at least 1".into(),
        });
    }

    Ok(BacktestConfig {
        initial_capital: config.get_double("backtest", "initial_capital", defaults.initial_capital),
        position_size_pct: config.get_double(
            "backtest",
            "position_size_pct",
            defaults.position_size_pct,
        ),
        max_positions: max_positions as usize,
        commission_per_trade: config.get_double(
            "backtest",
            "commission_per_trade",
            defaults.commission_per_trade,
        ),
        metrics: MetricsOptions {
            periods_per_year: config.get_double(
                "backtest",
                "periods_per_year",
                DEFAULT_PERIODS_PER_YEAR,
            ),
            risk_free_rate: config.get_double("backtest", "risk_free_rate", 0.0),
        },
    })
}

/// `--symbols` wins over `[backtest] symbols`.
pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, TradelabError> {
    let (list, key) = match symbols_override {
        Some(list) => (list.to_string(), "--symbols"),
        None => (
            config
                .get_string("backtest", "symbols")
                .ok_or_else(|| TradelabError::ConfigMissing {
                    section: "backtest".into(),
                    key: "symbols".into(),
                })?,
            "symbols",
        ),
    };

    parse_symbols(&list).map_err(|e| TradelabError::ConfigInvalid {
        section: "backtest".into(),
        key: key.into(),
        reason: e.to_string(),
    })
}

/// Data source selected by `[data] source` (`csv` when unset).
pub fn open_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, TradelabError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());

    match source.as_str() {
        "csv" => {
            let path = config
                .get_string("data", "path")
                .ok_or_else(|| TradelabError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(path))))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            Ok(Box::new(SqliteAdapter::from_config(config)?))
        }
        #[cfg(not(feature = "sqlite"))]
        "sqlite" => Err(TradelabError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: "built without the sqlite feature".into(),
        }),
        other => Err(TradelabError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown data source '{other}'"),
        }),
    }
}

pub fn format_report(result: &BacktestResult, universe: &Universe) -> String {
    let m = &result.metrics;
    let mut out = String::new();

    let _ = writeln!(out, "=== {} ===", result.strategy_name);
    let _ = writeln!(out, "Initial Capital:  {:.2}", result.config.initial_capital);
    let _ = writeln!(out, "Final Equity:     {:.2}", result.final_equity());
    let _ = writeln!(out, "Total Return:     {:.2}%", m.total_return_pct);
    let _ = writeln!(out, "Total P&L:        {:.2}", m.total_pnl);
    let _ = writeln!(out, "Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    let _ = writeln!(out, "Calmar Ratio:     {:.2}", m.calmar_ratio);
    let _ = writeln!(out, "Max Drawdown:     -{:.2}%", m.max_drawdown);
    let _ = writeln!(
        out,
        "Total Trades:     {} ({} won, {} lost)",
        m.total_trades, m.winning_trades, m.losing_trades
    );
    let _ = writeln!(out, "Win Rate:         {:.1}%", m.win_rate);
    let _ = writeln!(out, "Profit Factor:    {:.2}", m.profit_factor);
    let _ = writeln!(out, "Avg Win / Loss:   {:.2} / {:.2}", m.avg_win, m.avg_loss);

    let per_symbol = SymbolSummary::compute_per_symbol(&result.trades);
    if !per_symbol.is_empty() {
        let _ = writeln!(out, "\n=== Per-Symbol Summary ===");
        for s in &per_symbol {
            let sign = if s.total_pnl >= 0.0 { "+" } else { "" };
            let _ = writeln!(
                out,
                "  {}:  {} trades, {:.1}% win rate, {}{:.2}",
                s.symbol, s.total_trades, s.win_rate, sign, s.total_pnl
            );
        }
    }

    if !universe.skipped.is_empty() {
        let _ = writeln!(out, "\n=== Skipped ===");
        for skipped in &universe.skipped {
            let why = match skipped.reason {
                SkipReason::NoData => "no data".to_string(),
                SkipReason::InsufficientBars { bars } => format!("only {bars} bars"),
            };
            let _ = writeln!(out, "  {}: {}", skipped.symbol, why);
        }
    }

    out
}

fn run_validate(config_path: &Path) -> Result<(), TradelabError> {
    let config = load_config(config_path)?;

    validate_backtest_config(&config)?;
    validate_strategy_config(&config)?;
    validate_data_config(&config)?;

    let strategy = Strategy::from_config(&config, None)?;
    let bt_config = build_backtest_config(&config)?;

    println!("Strategy:        {} ({})", strategy.name, strategy.kind.key());
    println!("Stop Loss:       {}", format_pct(strategy.stop_loss_pct));
    println!("Take Profit:     {}", format_pct(strategy.take_profit_pct));
    println!("Initial Capital: {:.2}", bt_config.initial_capital);
    println!("Position Size:   {}%", bt_config.position_size_pct);
    println!("Max Positions:   {}", bt_config.max_positions);
    if let Some(list) = config.get_string("backtest", "symbols") {
        println!("Symbols:         {}", resolve_symbols(Some(&list), &config)?.join(", "));
    }
    println!("\nConfiguration is valid.");
    Ok(())
}

fn format_pct(pct: Option<f64>) -> String {
    pct.map(|p| format!("{p}%"))
        .unwrap_or_else(|| "none".to_string())
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> Result<(), TradelabError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    let data_port = open_data_port(&config)?;

    let symbols = match symbol {
        Some(s) => vec![s.trim().to_uppercase()],
        None => match config.get_string("backtest", "symbols") {
            Some(_) => resolve_symbols(None, &config)?,
            None => data_port.list_symbols()?,
        },
    };

    for s in &symbols {
        match data_port.get_data_range(s)? {
            Some((first, last, count)) => println!("{s}: {count} bars, {first} to {last}"),
            None => println!("{s}: no data found"),
        }
    }
    Ok(())
}

pub fn format_catalogue() -> String {
    let mut out = String::new();
    for key in STRATEGY_NAMES {
        if let Ok(kind) = StrategyKind::from_name(key) {
            let _ = writeln!(
                out,
                "{:<16}{:<14}stop {}",
                key,
                kind.default_name(),
                format_pct(kind.default_stop_loss_pct())
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn backtest_config_defaults() {
        let cfg = build_backtest_config(&config("[backtest]\n")).unwrap();
        assert_eq!(cfg, BacktestConfig::default());
    }

    #[test]
    fn backtest_config_reads_values() {
        let cfg = build_backtest_config(&config(
            "[backtest]\ninitial_capital = 5000\nposition_size_pct = 25\nmax_positions = 2\n\
             commission_per_trade = 1.5\nperiods_per_year = 252\nrisk_free_rate = 0.02\n",
        ))
        .unwrap();
        assert_eq!(cfg.initial_capital, 5000.0);
        assert_eq!(cfg.position_size_pct, 25.0);
        assert_eq!(cfg.max_positions, 2);
        assert_eq!(cfg.commission_per_trade, 1.5);
        assert_eq!(cfg.metrics.periods_per_year, 252.0);
        assert_eq!(cfg.metrics.risk_free_rate, 0.02);
    }

    #[test]
    fn backtest_config_rejects_negative_cap() {
        assert!(matches!(
            build_backtest_config(&config("[backtest]\nmax_positions = -1\n")),
            Err(TradelabError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn symbols_override_wins() {
        let cfg = config("[backtest]\nsymbols = SPY,QQQ\n");
        assert_eq!(resolve_symbols(Some("aapl"), &cfg).unwrap(), vec!["AAPL"]);
        assert_eq!(resolve_symbols(None, &cfg).unwrap(), vec!["SPY", "QQQ"]);
    }

    #[test]
    fn symbols_missing_is_config_missing() {
        assert!(matches!(
            resolve_symbols(None, &config("[backtest]\n")),
            Err(TradelabError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn unknown_source_rejected() {
        let cfg = config("[data]\nsource = parquet\npath = /tmp\n");
        assert!(matches!(
            open_data_port(&cfg),
            Err(TradelabError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn catalogue_lists_every_strategy() {
        let listing = format_catalogue();
        for key in STRATEGY_NAMES {
            assert!(listing.contains(key), "{key} missing from {listing}");
        }
        assert!(listing.contains("ConnorsRSI2"));
        assert_eq!(listing.lines().count(), STRATEGY_NAMES.len());
    }
}
