//! Position sizing and account-level risk limits.
//!
//! Sizing uses half-Kelly when win/loss statistics are known, otherwise a
//! fixed percent of capital, and is capped by the per-trade risk budget
//! whenever a stop below entry is supplied.

/// Percent fields are on a 0-100 scale; `kelly_fraction` is a multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskConfig {
    pub position_size_pct: f64,
    pub risk_per_trade_pct: f64,
    pub kelly_fraction: f64,
    pub max_positions: usize,
    pub daily_drawdown_limit_pct: f64,
    pub total_drawdown_limit_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            position_size_pct: 10.0,
            risk_per_trade_pct: 2.0,
            kelly_fraction: 0.5,
            max_positions: 5,
            daily_drawdown_limit_pct: 3.0,
            total_drawdown_limit_pct: 10.0,
        }
    }
}

/// Historical trade statistics feeding the Kelly sizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeStats {
    /// Fraction of winning trades, 0-1.
    pub win_rate: f64,
    pub avg_win: f64,
    /// Average loss as a positive amount.
    pub avg_loss: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RiskLimits {
    CanTrade,
    MaxPositions { limit: usize },
    DailyDrawdown { drawdown_pct: f64 },
    TotalDrawdown { drawdown_pct: f64 },
}

impl RiskLimits {
    pub fn can_trade(&self) -> bool {
        matches!(self, RiskLimits::CanTrade)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskManager {
    pub config: RiskConfig,
    daily_start_equity: Option<f64>,
    peak_equity: Option<f64>,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        RiskManager {
            config,
            daily_start_equity: None,
            peak_equity: None,
        }
    }

    pub fn set_daily_start(&mut self, equity: f64) {
        self.daily_start_equity = Some(equity);
        self.update_peak(equity);
    }

    pub fn update_peak(&mut self, equity: f64) {
        if self.peak_equity.is_none_or(|peak| equity > peak) {
            self.peak_equity = Some(equity);
        }
    }

    pub fn peak_equity(&self) -> Option<f64> {
        self.peak_equity
    }

    /// Position-count cap first, then daily drawdown, then drawdown from peak.
    pub fn check_limits(&self, current_equity: f64, open_positions: usize) -> RiskLimits {
        if open_positions >= self.config.max_positions {
            return RiskLimits::MaxPositions {
                limit: self.config.max_positions,
            };
        }

        if let Some(start) = self.daily_start_equity.filter(|s| *s > 0.0) {
            let drawdown_pct = (start - current_equity) / start * 100.0;
            if drawdown_pct >= self.config.daily_drawdown_limit_pct {
                return RiskLimits::DailyDrawdown { drawdown_pct };
            }
        }

        if let Some(peak) = self.peak_equity.filter(|p| *p > 0.0) {
            let drawdown_pct = (peak - current_equity) / peak * 100.0;
            if drawdown_pct >= self.config.total_drawdown_limit_pct {
                return RiskLimits::TotalDrawdown { drawdown_pct };
            }
        }

        RiskLimits::CanTrade
    }

    /// Whole shares to buy at `entry_price`.
    ///
    /// With `stats` and a positive average loss the percent of capital is
    /// `max(0, W - (1 - W) / (avg_win / avg_loss)) * kelly_fraction * 100`;
    /// otherwise `position_size_pct`. A stop below entry caps the result at
    /// `capital * risk_per_trade_pct / 100 / (entry - stop)` shares.
    pub fn position_size(
        &self,
        capital: f64,
        entry_price: f64,
        stop_loss: Option<f64>,
        stats: Option<TradeStats>,
    ) -> i64 {
        if entry_price <= 0.0 || capital <= 0.0 {
            return 0;
        }

        let position_pct = match stats {
            Some(s) if s.win_rate > 0.0 && s.avg_win > 0.0 && s.avg_loss > 0.0 => {
                let payoff = s.avg_win / s.avg_loss;
                let kelly = (s.win_rate - (1.0 - s.win_rate) / payoff).max(0.0);
                kelly * self.config.kelly_fraction * 100.0
            }
            _ => self.config.position_size_pct,
        };

        let shares_by_pct = (capital * position_pct / 100.0 / entry_price).floor() as i64;

        let shares = match stop_loss {
            Some(stop) if entry_price > stop => {
                let max_loss = capital * self.config.risk_per_trade_pct / 100.0;
                let max_by_risk = (max_loss / (entry_price - stop)).floor() as i64;
                shares_by_pct.min(max_by_risk)
            }
            _ => shares_by_pct,
        };

        shares.max(0)
    }
}

pub fn stop_loss_price(entry_price: f64, stop_pct: f64) -> f64 {
    entry_price * (1.0 - stop_pct / 100.0)
}

pub fn take_profit_price(entry_price: f64, target_pct: f64) -> f64 {
    entry_price * (1.0 + target_pct / 100.0)
}
