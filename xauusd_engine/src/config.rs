//! config.rs — Centralised configuration loaded from .env
//!
//! All parameters consumed by the engine are defined here.
//! Loading happens once at startup; the strategy and the broker each take
//! their own settings block by value and never see the environment.
use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Signal-generation parameters (SMA crossover + RSI filter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySettings {
    pub fast_period:    usize,
    pub slow_period:    usize,
    pub rsi_period:     usize,
    /// BUY crosses are suppressed at or above this RSI
    pub rsi_overbought: f64,
    /// SELL crosses are suppressed at or below this RSI
    pub rsi_oversold:   f64,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            fast_period:    5,
            slow_period:    20,
            rsi_period:     14,
            rsi_overbought: 70.0,
            rsi_oversold:   30.0,
        }
    }
}

/// Paper-broker parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerSettings {
    /// Units per trade; the sign is taken from the signal
    pub position_size:     f64,
    /// Percent of entry price, e.g. 0.6 = 0.6%
    pub take_profit_pct:   f64,
    pub stop_loss_pct:     f64,
    /// Re-open in the opposite direction on the bar that closes on reversal
    pub reverse_on_signal: bool,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            position_size:     1.0,
            take_profit_pct:   0.6,
            stop_loss_pct:     0.3,
            reverse_on_signal: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    // ── Instrument ───────────────────────────────────────────────────
    pub from_symbol: String,
    pub to_symbol:   String,

    // ── Components ───────────────────────────────────────────────────
    pub strategy: StrategySettings,
    pub broker:   BrokerSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            from_symbol: "XAU".into(),
            to_symbol:   "USD".into(),
            strategy:    StrategySettings::default(),
            broker:      BrokerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables (after dotenv).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // ignore missing .env
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Missing or empty values take the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = AppConfig::default();
        let strategy = StrategySettings::default();
        let broker = BrokerSettings::default();

        Ok(Self {
            from_symbol: get("XAUUSD_FROM_SYMBOL")
                .unwrap_or(defaults.from_symbol)
                .to_uppercase(),
            to_symbol: get("XAUUSD_TO_SYMBOL")
                .unwrap_or(defaults.to_symbol)
                .to_uppercase(),

            strategy: StrategySettings {
                fast_period:    parse_var(&get, "XAUUSD_FAST_MA",        strategy.fast_period)?,
                slow_period:    parse_var(&get, "XAUUSD_SLOW_MA",        strategy.slow_period)?,
                rsi_period:     parse_var(&get, "XAUUSD_RSI_PERIOD",     strategy.rsi_period)?,
                rsi_overbought: parse_var(&get, "XAUUSD_RSI_OVERBOUGHT", strategy.rsi_overbought)?,
                rsi_oversold:   parse_var(&get, "XAUUSD_RSI_OVERSOLD",   strategy.rsi_oversold)?,
            },

            broker: BrokerSettings {
                position_size:     parse_size(&get, "XAUUSD_POSITION_SIZE", broker.position_size)?,
                take_profit_pct:   parse_var(&get, "XAUUSD_TP_PCT",        broker.take_profit_pct)?,
                stop_loss_pct:     parse_var(&get, "XAUUSD_SL_PCT",        broker.stop_loss_pct)?,
                reverse_on_signal: parse_flag(&get, "XAUUSD_REVERSE_ON_SIGNAL", broker.reverse_on_signal)?,
            },
        })
    }

    /// Instrument label, e.g. `XAUUSD`.
    pub fn pair(&self) -> String {
        format!("{}{}", self.from_symbol, self.to_symbol)
    }

    /// Bars kept in the rolling history handed to the strategy.
    pub fn history_window(&self) -> usize {
        self.strategy.slow_period.max(self.strategy.rsi_period).saturating_mul(2)
    }
}

/// Position size must be positive and finite: a zero size opens a ledger
/// entry without opening the position, and the side comes from the signal.
fn parse_size<G>(get: &G, key: &str, default: f64) -> Result<f64>
where
    G: Fn(&str) -> Option<String>,
{
    let size: f64 = parse_var(get, key, default)?;
    if size.is_finite() && size > 0.0 {
        Ok(size)
    } else {
        Err(Error::InvalidEnv {
            key:     key.to_owned(),
            message: format!("expected a positive finite size, got {size}"),
        })
    }
}

fn parse_var<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v.trim().parse::<T>().map_err(|e| Error::InvalidEnv {
            key:     key.to_owned(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_flag<G>(get: &G, key: &str, default: bool) -> Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(Error::InvalidEnv {
                key:     key.to_owned(),
                message: format!("expected a boolean, got {v:?}"),
            }),
        },
    }
}
