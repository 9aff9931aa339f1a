//! Strategy catalogue.
//!
//! A [`Strategy`] pairs one [`StrategyKind`] (the decision rule and its
//! parameters) with naming, default stop/target percentages and per-symbol
//! state. Variants answer with a [`Decision`]; the wrapper turns it into a
//! [`Signal`] and fills in stop and target prices.

pub mod heikin_ashi_trend;
pub mod intraday;
pub mod opening_range;
pub mod rsi_reversion;

use std::collections::HashMap;

use chrono::NaiveTime;

use crate::domain::error::TradelabError;
use crate::domain::ohlcv::Bar;
use crate::domain::risk::{stop_loss_price, take_profit_price};
use crate::domain::signal::{Action, Signal};
use crate::ports::config_port::ConfigPort;
use crate::ports::strategy_port::StrategyPort;

pub use heikin_ashi_trend::{HmaHeikinAshiParams, WmaHeikinAshiParams};
pub use intraday::IntradayRules;
pub use opening_range::{OpeningRange, OpeningRangeParams};
pub use rsi_reversion::{
    BollingerRsiParams, ConnorsRsi2Params, CumulativeRsiParams, KeltnerRsiParams, SessionState,
    VwapRsiParams,
};

/// Catalogue keys accepted by [`StrategyKind::from_name`].
pub const STRATEGY_NAMES: [&str; 8] = [
    "connors_rsi2",
    "cumulative_rsi",
    "bollinger_rsi",
    "keltner_rsi",
    "vwap_rsi",
    "wma_ha",
    "hma_ha",
    "orb",
];

/// Variant verdict before it is turned into a signal.
///
/// Entry levels set here take precedence over the strategy's percentages.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Enter {
        strength: f64,
        reason: String,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    },
    Exit {
        reason: String,
    },
}

impl Decision {
    pub(crate) fn enter(strength: f64, reason: impl Into<String>) -> Self {
        Decision::Enter {
            strength,
            reason: reason.into(),
            stop_loss: None,
            take_profit: None,
        }
    }

    pub(crate) fn with_levels(self, stop: Option<f64>, target: Option<f64>) -> Self {
        match self {
            Decision::Enter {
                strength, reason, ..
            } => Decision::Enter {
                strength,
                reason,
                stop_loss: stop,
                take_profit: target,
            },
            exit => exit,
        }
    }

    pub(crate) fn exit(reason: impl Into<String>) -> Self {
        Decision::Exit {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyKind {
    ConnorsRsi2(ConnorsRsi2Params),
    CumulativeRsi(CumulativeRsiParams),
    BollingerRsi(BollingerRsiParams),
    KeltnerRsi(KeltnerRsiParams),
    VwapRsi(VwapRsiParams),
    WmaHeikinAshi(WmaHeikinAshiParams),
    HmaHeikinAshi(HmaHeikinAshiParams),
    Orb(OpeningRangeParams),
}

impl StrategyKind {
    /// Default parameters for a catalogue key.
    pub fn from_name(name: &str) -> Result<Self, TradelabError> {
        let kind = match name.trim().to_lowercase().as_str() {
            "connors_rsi2" => StrategyKind::ConnorsRsi2(ConnorsRsi2Params::default()),
            "cumulative_rsi" => StrategyKind::CumulativeRsi(CumulativeRsiParams::default()),
            "bollinger_rsi" => StrategyKind::BollingerRsi(BollingerRsiParams::default()),
            "keltner_rsi" => StrategyKind::KeltnerRsi(KeltnerRsiParams::default()),
            "vwap_rsi" => StrategyKind::VwapRsi(VwapRsiParams::default()),
            "wma_ha" => StrategyKind::WmaHeikinAshi(WmaHeikinAshiParams::default()),
            "hma_ha" => StrategyKind::HmaHeikinAshi(HmaHeikinAshiParams::default()),
            "orb" => StrategyKind::Orb(OpeningRangeParams::default()),
            _ => {
                return Err(TradelabError::UnknownStrategy {
                    name: name.to_string(),
                })
            }
        };
        Ok(kind)
    }

    /// Catalogue key, the inverse of [`StrategyKind::from_name`].
    pub fn key(&self) -> &'static str {
        match self {
            StrategyKind::ConnorsRsi2(_) => "connors_rsi2",
            StrategyKind::CumulativeRsi(_) => "cumulative_rsi",
            StrategyKind::BollingerRsi(_) => "bollinger_rsi",
            StrategyKind::KeltnerRsi(_) => "keltner_rsi",
            StrategyKind::VwapRsi(_) => "vwap_rsi",
            StrategyKind::WmaHeikinAshi(_) => "wma_ha",
            StrategyKind::HmaHeikinAshi(_) => "hma_ha",
            StrategyKind::Orb(_) => "orb",
        }
    }

    pub fn default_name(&self) -> &'static str {
        match self {
            StrategyKind::ConnorsRsi2(_) => "ConnorsRSI2",
            StrategyKind::CumulativeRsi(_) => "CumulativeRSI",
            StrategyKind::BollingerRsi(_) => "BB_RSI",
            StrategyKind::KeltnerRsi(_) => "Keltner_RSI",
            StrategyKind::VwapRsi(_) => "VWAP_RSI",
            StrategyKind::WmaHeikinAshi(_) => "WMA20_HA",
            StrategyKind::HmaHeikinAshi(_) => "HMA_HA",
            StrategyKind::Orb(_) => "ORB",
        }
    }

    pub fn default_stop_loss_pct(&self) -> Option<f64> {
        match self {
            StrategyKind::ConnorsRsi2(_)
            | StrategyKind::CumulativeRsi(_)
            | StrategyKind::HmaHeikinAshi(_) => Some(3.0),
            StrategyKind::BollingerRsi(_) | StrategyKind::KeltnerRsi(_) => Some(2.0),
            StrategyKind::VwapRsi(_) => Some(1.5),
            StrategyKind::WmaHeikinAshi(_) | StrategyKind::Orb(_) => None,
        }
    }

    /// Parameters for `key` read from the `[strategy]` section, falling back
    /// to the variant defaults for absent keys.
    pub fn from_config(key: &str, config: &dyn ConfigPort) -> Result<Self, TradelabError> {
        let reader = ParamReader { config };
        let kind = match StrategyKind::from_name(key)? {
            StrategyKind::ConnorsRsi2(d) => StrategyKind::ConnorsRsi2(ConnorsRsi2Params {
                rsi_period: reader.period("rsi_period", d.rsi_period)?,
                rsi_entry: reader.value("rsi_entry", d.rsi_entry),
                rsi_exit: reader.value("rsi_exit", d.rsi_exit),
                ma_period: reader.period("ma_period", d.ma_period)?,
                ma_short_period: reader.period("ma_short_period", d.ma_short_period)?,
            }),
            StrategyKind::CumulativeRsi(d) => StrategyKind::CumulativeRsi(CumulativeRsiParams {
                rsi_period: reader.period("rsi_period", d.rsi_period)?,
                cumulative_bars: reader.period("cumulative_bars", d.cumulative_bars)?,
                entry_threshold: reader.value("entry_threshold", d.entry_threshold),
                exit_threshold: reader.value("exit_threshold", d.exit_threshold),
                ma_period: reader.period("ma_period", d.ma_period)?,
            }),
            StrategyKind::BollingerRsi(d) => StrategyKind::BollingerRsi(BollingerRsiParams {
                bb_period: reader.period("bb_period", d.bb_period)?,
                bb_std: reader.value("bb_std", d.bb_std),
                rsi_period: reader.period("rsi_period", d.rsi_period)?,
                rsi_entry: reader.value("rsi_entry", d.rsi_entry),
                rsi_exit: reader.value("rsi_exit", d.rsi_exit),
            }),
            StrategyKind::KeltnerRsi(d) => StrategyKind::KeltnerRsi(KeltnerRsiParams {
                kc_period: reader.period("kc_period", d.kc_period)?,
                kc_multiplier: reader.value("kc_multiplier", d.kc_multiplier),
                rsi_period: reader.period("rsi_period", d.rsi_period)?,
                rsi_entry: reader.value("rsi_entry", d.rsi_entry),
                rsi_exit: reader.value("rsi_exit", d.rsi_exit),
            }),
            StrategyKind::VwapRsi(d) => StrategyKind::VwapRsi(VwapRsiParams {
                rsi_period: reader.period("rsi_period", d.rsi_period)?,
                rsi_entry: reader.value("rsi_entry", d.rsi_entry),
                rsi_exit: reader.value("rsi_exit", d.rsi_exit),
            }),
            StrategyKind::WmaHeikinAshi(d) => StrategyKind::WmaHeikinAshi(WmaHeikinAshiParams {
                wma_period: reader.period("wma_period", d.wma_period)?,
                lookback: reader.period("lookback", d.lookback)?,
                min_bars: reader.period("min_bars", d.min_bars)?,
                session: reader.session(&d.session)?,
            }),
            StrategyKind::HmaHeikinAshi(d) => StrategyKind::HmaHeikinAshi(HmaHeikinAshiParams {
                hma_period: reader.period("hma_period", d.hma_period)?,
                lookback: reader.period("lookback", d.lookback)?,
                min_bars: reader.period("min_bars", d.min_bars)?,
                session: reader.session(&d.session)?,
            }),
            StrategyKind::Orb(d) => StrategyKind::Orb(OpeningRangeParams {
                range_start: reader.time("range_start", d.range_start)?,
                range_end: reader.time("range_end", d.range_end)?,
                session: reader.session(&d.session)?,
                min_relative_volume: reader.value("min_relative_volume", d.min_relative_volume),
                volume_lookback_days: reader
                    .period("volume_lookback_days", d.volume_lookback_days)?,
                ema_period: reader.period("ema_period", d.ema_period)?,
                lookback: reader.period("lookback", d.lookback)?,
                stop_buffer_pct: reader.value("stop_buffer_pct", d.stop_buffer_pct),
            }),
        };
        Ok(kind)
    }

    fn decide(
        &self,
        history: &[Bar],
        position_open: bool,
        state: &mut SymbolState,
    ) -> Option<Decision> {
        match self {
            StrategyKind::ConnorsRsi2(p) => p.evaluate(history, position_open),
            StrategyKind::CumulativeRsi(p) => p.evaluate(history, position_open),
            StrategyKind::BollingerRsi(p) => p.evaluate(history, position_open),
            StrategyKind::KeltnerRsi(p) => p.evaluate(history, position_open),
            StrategyKind::VwapRsi(p) => p.evaluate(history, position_open, &mut state.session),
            StrategyKind::WmaHeikinAshi(p) => p.evaluate(history, position_open),
            StrategyKind::HmaHeikinAshi(p) => p.evaluate(history, position_open),
            StrategyKind::Orb(p) => p.evaluate(history, position_open),
        }
    }
}

struct ParamReader<'a> {
    config: &'a dyn ConfigPort,
}

impl ParamReader<'_> {
    const SECTION: &'static str = "strategy";

    fn period(&self, key: &str, default: usize) -> Result<usize, TradelabError> {
        let raw = self.config.get_int(Self::SECTION, key, default as i64);
        match usize::try_from(raw) {
            Ok(period) if period > 0 => Ok(period),
            _ => Err(TradelabError::ConfigInvalid {
                section: Self::SECTION.into(),
                key: key.into(),
                reason: format!("must be a positive integer, got {raw}"),
            }),
        }
    }

    fn value(&self, key: &str, default: f64) -> f64 {
        self.config.get_double(Self::SECTION, key, default)
    }

    /// `HH:MM` or `HH:MM:SS`.
    fn time(&self, key: &str, default: NaiveTime) -> Result<NaiveTime, TradelabError> {
        let Some(raw) = self.config.get_string(Self::SECTION, key) else {
            return Ok(default);
        };
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map_err(|_| TradelabError::ConfigInvalid {
                section: Self::SECTION.into(),
                key: key.into(),
                reason: format!("expected HH:MM, got '{raw}'"),
            })
    }

    fn session(&self, defaults: &IntradayRules) -> Result<IntradayRules, TradelabError> {
        Ok(IntradayRules {
            entry_start: self.time("entry_start", defaults.entry_start)?,
            eod_exit: self.time("eod_exit", defaults.eod_exit)?,
            min_price: self.value("min_price", defaults.min_price),
        })
    }
}

/// Mutable per-symbol data carried between bars.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolState {
    pub session: SessionState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub kind: StrategyKind,
    state: HashMap<String, SymbolState>,
}

impl Strategy {
    /// Variant defaults for name and stop; no take-profit.
    pub fn new(kind: StrategyKind) -> Self {
        Strategy {
            name: kind.default_name().to_string(),
            stop_loss_pct: kind.default_stop_loss_pct(),
            take_profit_pct: None,
            kind,
            state: HashMap::new(),
        }
    }

    pub fn from_name(key: &str) -> Result<Self, TradelabError> {
        Ok(Strategy::new(StrategyKind::from_name(key)?))
    }

    /// Build from the `[strategy]` section. `kind_override` replaces the
    /// configured `kind`.
    pub fn from_config(
        config: &dyn ConfigPort,
        kind_override: Option<&str>,
    ) -> Result<Self, TradelabError> {
        let key = match kind_override {
            Some(k) => k.to_string(),
            None => config
                .get_string("strategy", "kind")
                .ok_or_else(|| TradelabError::ConfigMissing {
                    section: "strategy".into(),
                    key: "kind".into(),
                })?,
        };
        let mut strategy = Strategy::new(StrategyKind::from_config(&key, config)?);

        if let Some(name) = config.get_string("strategy", "name") {
            strategy.name = name;
        }
        if config.get_string("strategy", "stop_loss_pct").is_some() {
            strategy.stop_loss_pct =
                positive(config.get_double("strategy", "stop_loss_pct", 0.0));
        }
        if config.get_string("strategy", "take_profit_pct").is_some() {
            strategy.take_profit_pct =
                positive(config.get_double("strategy", "take_profit_pct", 0.0));
        }
        Ok(strategy)
    }

    pub fn with_stop_loss_pct(mut self, pct: Option<f64>) -> Self {
        self.stop_loss_pct = pct;
        self
    }

    pub fn with_take_profit_pct(mut self, pct: Option<f64>) -> Self {
        self.take_profit_pct = pct;
        self
    }

    pub fn reset_symbol(&mut self, symbol: &str) {
        self.state.remove(symbol);
    }

    /// Buy signal at `bar.close`, stop and target from the percentages.
    pub fn create_entry_signal(
        &self,
        symbol: &str,
        bar: &Bar,
        strength: f64,
        reason: String,
    ) -> Signal {
        Signal {
            symbol: symbol.to_string(),
            action: Action::Buy,
            strategy_name: self.name.clone(),
            reference_price: bar.close,
            stop_loss: self.stop_loss_pct.map(|pct| stop_loss_price(bar.close, pct)),
            take_profit: self
                .take_profit_pct
                .map(|pct| take_profit_price(bar.close, pct)),
            strength,
            reason,
            timestamp: bar.timestamp,
        }
    }

    pub fn create_exit_signal(&self, symbol: &str, bar: &Bar, reason: String) -> Signal {
        Signal {
            symbol: symbol.to_string(),
            action: Action::Sell,
            strategy_name: self.name.clone(),
            reference_price: bar.close,
            stop_loss: None,
            take_profit: None,
            strength: 1.0,
            reason,
            timestamp: bar.timestamp,
        }
    }
}

fn positive(pct: f64) -> Option<f64> {
    (pct > 0.0).then_some(pct)
}

impl StrategyPort for Strategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &mut self,
        symbol: &str,
        bar: &Bar,
        history: &[Bar],
        position_open: bool,
    ) -> Option<Signal> {
        let state = self.state.entry(symbol.to_string()).or_default();
        match self.kind.decide(history, position_open, state)? {
            Decision::Enter {
                strength,
                reason,
                stop_loss,
                take_profit,
            } if !position_open => {
                let mut signal = self.create_entry_signal(symbol, bar, strength, reason);
                signal.stop_loss = stop_loss.or(signal.stop_loss);
                signal.take_profit = take_profit.or(signal.take_profit);
                Some(signal)
            }
            Decision::Exit { reason } if position_open => {
                Some(self.create_exit_signal(symbol, bar, reason))
            }
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.state.clear();
    }
}
