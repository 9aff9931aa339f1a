//! Configuration validation.
//!
//! Checks every `[backtest]`, `[strategy]` and `[data]` value before a run
//! so that bad input fails with the offending key instead of a silent
//! default.

use crate::domain::error::TradelabError;
use crate::domain::strategy::StrategyKind;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATA_SOURCES: [&str; 2] = ["csv", "sqlite"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradelabError> {
    validate_initial_capital(config)?;
    validate_position_size(config)?;
    validate_max_positions(config)?;
    validate_commission(config)?;
    validate_periods_per_year(config)?;
    validate_risk_free_rate(config)?;
    validate_symbols(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TradelabError> {
    let kind = config
        .get_string("strategy", "kind")
        .ok_or_else(|| TradelabError::ConfigMissing {
            section: "strategy".into(),
            key: "kind".into(),
        })?;
    validate_non_negative(config, "strategy", "stop_loss_pct")?;
    validate_non_negative(config, "strategy", "take_profit_pct")?;
    StrategyKind::from_config(&kind, config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TradelabError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    if !DATA_SOURCES.contains(&source.as_str()) {
        return Err(invalid(
            "data",
            "source",
            format!("must be one of {}", DATA_SOURCES.join(", ")),
        ));
    }
    if config.get_string("data", "path").is_none() {
        return Err(TradelabError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        });
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TradelabError {
    TradelabError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TradelabError> {
    let value = config.get_double("backtest", "initial_capital", 100_000.0);
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_position_size(config: &dyn ConfigPort) -> Result<(), TradelabError> {
    let value = config.get_double("backtest", "position_size_pct", 10.0);
    if value <= 0.0 || value > 100.0 {
        return Err(invalid(
            "backtest",
            "position_size_pct",
            "position_size_pct must be in (0, 100]",
        ));
    }
    Ok(())
}

fn validate_max_positions(config: &dyn ConfigPort) -> Result<(), TradelabError> {
    let value = config.get_int("backtest", "max_positions", 5);
    if value < 1 {
        return Err(invalid(
            "backtest",
            "max_positions",
            "max_positions must be at least 1",
        ));
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), TradelabError> {
    validate_non_negative(config, "backtest", "commission_per_trade")
}

fn validate_periods_per_year(config: &dyn ConfigPort) -> Result<(), TradelabError> {
    let value = config.get_double("backtest", "periods_per_year", 1.0);
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), TradelabError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_non_negative(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), TradelabError> {
    if config.get_double(section, key, 0.0) < 0.0 {
        return Err(invalid(section, key, format!("{key} must be non-negative")));
    }
    Ok(())
}

/// Symbols are optional here since the CLI may supply them.
fn validate_symbols(config: &dyn ConfigPort) -> Result<(), TradelabError> {
    match config.get_string("backtest", "symbols") {
        Some(list) => parse_symbols(&list)
            .map(|_| ())
            .map_err(|e| invalid("backtest", "symbols", e.to_string())),
        None => Ok(()),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TradelabError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

/// Optional `YYYY-MM-DD` date from `[backtest]`.
pub fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, TradelabError> {
    config
        .get_string("backtest", key)
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                invalid(
                    "backtest",
                    key,
                    format!("invalid {key} format, expected YYYY-MM-DD"),
                )
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TestConfig {
        values: HashMap<(String, String), String>,
    }

    impl TestConfig {
        fn new() -> Self {
            Self {
                values: HashMap::new(),
            }
        }

        fn set(mut self, section: &str, key: &str, value: &str) -> Self {
            self.values
                .insert((section.to_string(), key.to_string()), value.to_string());
            self
        }
    }

    impl ConfigPort for TestConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
    }

    fn assert_invalid_key(result: Result<(), TradelabError>, expected: &str) {
        match result {
            Err(TradelabError::ConfigInvalid { key, .. }) => assert_eq!(key, expected),
            other => panic!("expected ConfigInvalid for {expected}, got {other:?}"),
        }
    }

    #[test]
    fn empty_backtest_section_uses_valid_defaults() {
        assert!(validate_backtest_config(&TestConfig::new()).is_ok());
    }

    #[test]
    fn full_backtest_section_is_valid() {
        let config = TestConfig::new()
            .set("backtest", "initial_capital", "250000")
            .set("backtest", "position_size_pct", "20")
            .set("backtest", "max_positions", "3")
            .set("backtest", "commission_per_trade", "1.0")
            .set("backtest", "periods_per_year", "252")
            .set("backtest", "risk_free_rate", "0.04")
            .set("backtest", "symbols", "spy, qqq")
            .set("backtest", "start_date", "2024-01-01")
            .set("backtest", "end_date", "2024-06-30");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn rejects_non_positive_capital() {
        let config = TestConfig::new().set("backtest", "initial_capital", "0");
        assert_invalid_key(validate_backtest_config(&config), "initial_capital");
    }

    #[test]
    fn rejects_position_size_above_100() {
        let config = TestConfig::new().set("backtest", "position_size_pct", "150");
        assert_invalid_key(validate_backtest_config(&config), "position_size_pct");
    }

    #[test]
    fn rejects_zero_max_positions() {
        let config = TestConfig::new().set("backtest", "max_positions", "0");
        assert_invalid_key(validate_backtest_config(&config), "max_positions");
    }

    #[test]
    fn rejects_negative_commission() {
        let config = TestConfig::new().set("backtest", "commission_per_trade", "-1");
        assert_invalid_key(validate_backtest_config(&config), "commission_per_trade");
    }

    #[test]
    fn rejects_risk_free_rate_out_of_range() {
        let config = TestConfig::new().set("backtest", "risk_free_rate", "1.5");
        assert_invalid_key(validate_backtest_config(&config), "risk_free_rate");
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let config = TestConfig::new().set("backtest", "symbols", "SPY,spy");
        assert_invalid_key(validate_backtest_config(&config), "symbols");
    }

    #[test]
    fn rejects_inverted_dates() {
        let config = TestConfig::new()
            .set("backtest", "start_date", "2024-06-30")
            .set("backtest", "end_date", "2024-01-01");
        assert_invalid_key(validate_backtest_config(&config), "start_date");
    }

    #[test]
    fn rejects_malformed_date() {
        let config = TestConfig::new().set("backtest", "end_date", "30/06/2024");
        assert_invalid_key(validate_backtest_config(&config), "end_date");
    }

    #[test]
    fn strategy_requires_kind() {
        assert!(matches!(
            validate_strategy_config(&TestConfig::new()),
            Err(TradelabError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn strategy_rejects_unknown_kind() {
        let config = TestConfig::new().set("strategy", "kind", "grid_martingale");
        assert!(matches!(
            validate_strategy_config(&config),
            Err(TradelabError::UnknownStrategy { .. })
        ));
    }

    #[test]
    fn strategy_rejects_negative_stop() {
        let config = TestConfig::new()
            .set("strategy", "kind", "connors_rsi2")
            .set("strategy", "stop_loss_pct", "-3");
        assert_invalid_key(validate_strategy_config(&config), "stop_loss_pct");
    }

    #[test]
    fn strategy_rejects_zero_period() {
        let config = TestConfig::new()
            .set("strategy", "kind", "bollinger_rsi")
            .set("strategy", "bb_period", "0");
        assert_invalid_key(validate_strategy_config(&config), "bb_period");
    }

    #[test]
    fn data_source_must_be_known() {
        let config = TestConfig::new()
            .set("data", "source", "parquet")
            .set("data", "path", "/tmp");
        assert_invalid_key(validate_data_config(&config), "source");
    }

    #[test]
    fn data_requires_path() {
        assert!(matches!(
            validate_data_config(&TestConfig::new()),
            Err(TradelabError::ConfigMissing { key, .. }) if key == "path"
        ));
    }

    #[test]
    fn parse_date_optional() {
        let config = TestConfig::new().set("backtest", "start_date", "2024-03-01");
        assert_eq!(
            parse_date(&config, "start_date").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_date(&config, "end_date").unwrap(), None);
    }
}
