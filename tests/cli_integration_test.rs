//! CLI integration tests.
//!
//! Tests cover:
//! - Argument parsing for every subcommand
//! - Config loading helpers (build_backtest_config, resolve_symbols)
//! - Exit codes for config, strategy and data failures
//! - Full backtest over CSV files written to a temp directory
//! - Report formatting

mod common;

use clap::Parser;
use common::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;
use tradelab::adapters::file_config_adapter::FileConfigAdapter;
use tradelab::cli::{self, Cli, Command};
use tradelab::domain::backtest::run_backtest;
use tradelab::domain::error::TradelabError;
use tradelab::domain::universe::load_universe;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_csv(dir: &Path, symbol: &str, bars: &[Bar]) {
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for bar in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.timestamp.format("%Y-%m-%d %H:%M:%S"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), "SPY", &generate_bars(120, 100.0, 0.05));
    write_csv(dir.path(), "QQQ", &generate_bars(120, 60.0, -0.02));
    dir
}

fn ini_for(dir: &Path, strategy_kind: &str, extra_backtest: &str) -> String {
    format!(
        "[backtest]\n\
         initial_capital = 50000\n\
         position_size_pct = 20\n\
         max_positions = 2\n\
         periods_per_year = 19656\n\
         symbols = SPY,QQQ\n\
         {extra_backtest}\n\
         [strategy]\n\
         kind = {strategy_kind}\n\
         stop_loss_pct = 2.5\n\
         \n\
         [data]\n\
         source = csv\n\
         path = {}\n",
        dir.display()
    )
}

fn exit_code(args: &[&str]) -> String {
    format!("{:?}", cli::run(Cli::try_parse_from(args).unwrap()))
}

fn code(n: u8) -> String {
    format!("{:?}", ExitCode::from(n))
}

fn success() -> String {
    format!("{:?}", ExitCode::SUCCESS)
}

mod argument_parsing {
    use super::*;

    #[test]
    fn backtest_with_overrides() {
        let cli = Cli::try_parse_from([
            "tradelab",
            "backtest",
            "--config",
            "run.ini",
            "--strategy",
            "vwap_rsi",
            "--symbols",
            "SPY,QQQ",
        ])
        .unwrap();

        match cli.command {
            Command::Backtest {
                config,
                strategy,
                symbols,
            } => {
                assert_eq!(config, Path::new("run.ini"));
                assert_eq!(strategy.as_deref(), Some("vwap_rsi"));
                assert_eq!(symbols.as_deref(), Some("SPY,QQQ"));
            }
            other => panic!("expected backtest, got {other:?}"),
        }
    }

    #[test]
    fn info_and_strategies() {
        let cli =
            Cli::try_parse_from(["tradelab", "info", "-c", "run.ini", "--symbol", "spy"]).unwrap();
        assert!(matches!(cli.command, Command::Info { symbol: Some(s), .. } if s == "spy"));

        let cli = Cli::try_parse_from(["tradelab", "strategies"]).unwrap();
        assert!(matches!(cli.command, Command::Strategies));
    }

    #[test]
    fn backtest_requires_config() {
        assert!(Cli::try_parse_from(["tradelab", "backtest"]).is_err());
    }
}

mod config_loading {
    use super::*;

    #[test]
    fn build_backtest_config_from_file() {
        let dir = data_dir();
        let file = write_temp_ini(&ini_for(dir.path(), "bollinger_rsi", ""));
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();

        let config = cli::build_backtest_config(&adapter).unwrap();
        assert_eq!(config.initial_capital, 50_000.0);
        assert_eq!(config.position_size_pct, 20.0);
        assert_eq!(config.max_positions, 2);
        assert_eq!(config.commission_per_trade, 0.0);
        assert_eq!(config.metrics.periods_per_year, 19_656.0);

        assert_eq!(
            cli::resolve_symbols(None, &adapter).unwrap(),
            vec!["SPY", "QQQ"]
        );
    }

    #[test]
    fn duplicate_override_symbols_rejected() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert!(matches!(
            cli::resolve_symbols(Some("SPY,spy"), &adapter),
            Err(TradelabError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn csv_port_from_config() {
        let dir = data_dir();
        let adapter =
            FileConfigAdapter::from_string(&ini_for(dir.path(), "connors_rsi2", "")).unwrap();
        let port = cli::open_data_port(&adapter).unwrap();
        assert_eq!(port.list_symbols().unwrap(), vec!["QQQ", "SPY"]);
    }
}

mod commands {
    use super::*;

    #[test]
    fn backtest_over_csv_succeeds() {
        let dir = data_dir();
        let file = write_temp_ini(&ini_for(dir.path(), "bollinger_rsi", ""));
        let path = file.path().to_str().unwrap();

        assert_eq!(exit_code(&["tradelab", "backtest", "-c", path]), success());
        assert_eq!(
            exit_code(&["tradelab", "backtest", "-c", path, "-s", "hma_ha", "--symbols", "qqq"]),
            success()
        );
    }

    #[test]
    fn missing_config_file_is_config_error() {
        assert_eq!(
            exit_code(&["tradelab", "backtest", "-c", "/nonexistent/run.ini"]),
            code(2)
        );
    }

    #[test]
    fn unknown_strategy_exit_code() {
        let dir = data_dir();
        let file = write_temp_ini(&ini_for(dir.path(), "bollinger_rsi", ""));
        let path = file.path().to_str().unwrap();
        assert_eq!(
            exit_code(&["tradelab", "backtest", "-c", path, "-s", "martingale"]),
            code(4)
        );
    }

    #[test]
    fn symbols_without_data_exit_code() {
        let dir = data_dir();
        let file = write_temp_ini(&ini_for(dir.path(), "bollinger_rsi", ""));
        let path = file.path().to_str().unwrap();
        assert_eq!(
            exit_code(&["tradelab", "backtest", "-c", path, "--symbols", "IWM,DIA"]),
            code(5)
        );
    }

    #[test]
    fn date_window_outside_data_is_no_data() {
        let dir = data_dir();
        let file = write_temp_ini(&ini_for(
            dir.path(),
            "bollinger_rsi",
            "start_date = 2030-01-01",
        ));
        let path = file.path().to_str().unwrap();
        assert_eq!(exit_code(&["tradelab", "backtest", "-c", path]), code(5));
    }

    #[test]
    fn validate_accepts_and_rejects() {
        let dir = data_dir();
        let good = write_temp_ini(&ini_for(dir.path(), "keltner_rsi", ""));
        assert_eq!(
            exit_code(&["tradelab", "validate", "-c", good.path().to_str().unwrap()]),
            success()
        );

        let bad = write_temp_ini(&ini_for(
            dir.path(),
            "keltner_rsi",
            "risk_free_rate = 2",
        ));
        assert_eq!(
            exit_code(&["tradelab", "validate", "-c", bad.path().to_str().unwrap()]),
            code(2)
        );
    }

    #[test]
    fn info_and_strategies_succeed() {
        let dir = data_dir();
        let file = write_temp_ini(&ini_for(dir.path(), "wma_ha", ""));
        let path = file.path().to_str().unwrap();

        assert_eq!(exit_code(&["tradelab", "info", "-c", path]), success());
        assert_eq!(
            exit_code(&["tradelab", "info", "-c", path, "--symbol", "IWM"]),
            success()
        );
        assert_eq!(exit_code(&["tradelab", "strategies"]), success());
    }
}

mod report {
    use super::*;

    #[test]
    fn report_lists_metrics_and_symbols() {
        let port = MockDataPort::new().with_bars("SPY", series(&[100.0, 110.0, 120.0]));
        let universe =
            load_universe(&port, &symbols(&["SPY", "QQQ"]), None, None, 1).unwrap();

        let mut strategy = ScriptedStrategy::new().enter_at("SPY", 0).exit_at("SPY", 2);
        let result = run_backtest(
            &mut strategy,
            &universe.symbols,
            &universe.bars_by_symbol,
            &sample_config(),
        )
        .unwrap();

        let report = cli::format_report(&result, &universe);
        assert!(report.contains("=== scripted ==="), "{report}");
        assert!(report.contains("Final Equity:     102000.00"), "{report}");
        assert!(report.contains("Total Trades:     1 (1 won, 0 lost)"), "{report}");
        assert!(report.contains("SPY:  1 trades, 100.0% win rate, +2000.00"), "{report}");
        assert!(report.contains("QQQ: no data"), "{report}");
    }
}
