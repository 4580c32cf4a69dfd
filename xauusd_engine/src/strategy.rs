//! strategy.rs — Dual SMA crossover filtered by RSI
//!
//! ─────────────────────────────────────────────────────────────────────────
//! DECISION RULE
//! ─────────────────────────────────────────────────────────────────────────
//!
//!   fast_t = SMA_fast(close)_t          slow_t = SMA_slow(close)_t
//!   fast_{t−1}, slow_{t−1}              same windows, one bar earlier
//!
//!   bullish cross:  fast_{t−1} ≤ slow_{t−1}  ∧  fast_t > slow_t
//!   bearish cross:  fast_{t−1} ≥ slow_{t−1}  ∧  fast_t < slow_t
//!
//!   BUY   if bullish ∧ RSI < overbought
//!   SELL  if bearish ∧ RSI > oversold
//!   HOLD  otherwise
//!
//! The non-strict prior comparison fires on the first bar after the two
//! averages were exactly equal.  RSI is taken over the trailing
//! 2 × rsi_period closes.
//! ─────────────────────────────────────────────────────────────────────────
use serde::Serialize;
use tracing::debug;

use crate::config::StrategySettings;
use crate::error::{Error, Result};
use crate::indicators::{compute_rsi, mean};
use crate::models::{PriceBar, TradeSignal};

/// Intermediate values behind one decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalSnapshot {
    pub fast_now:  f64,
    pub slow_now:  f64,
    pub fast_prev: f64,
    pub slow_prev: f64,
    pub rsi:       f64,
    pub signal:    TradeSignal,
}

#[derive(Debug, Clone)]
pub struct MovingAverageRsiStrategy {
    settings: StrategySettings,
}

impl MovingAverageRsiStrategy {
    /// Fails when `fast_period >= slow_period`.  Thresholds are not checked:
    /// out-of-range values just make the filter always pass or always block.
    pub fn new(settings: StrategySettings) -> Result<Self> {
        if settings.fast_period >= settings.slow_period {
            return Err(Error::InvalidPeriods {
                fast: settings.fast_period,
                slow: settings.slow_period,
            });
        }
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &StrategySettings {
        &self.settings
    }

    /// Bars needed before any crossover can be detected.
    pub fn min_history(&self) -> usize {
        self.settings.slow_period.saturating_add(1)
    }

    /// Signal for the newest bar of `history` (oldest → newest).
    pub fn generate_signal(&self, history: &[PriceBar]) -> TradeSignal {
        self.evaluate(history)
            .map_or(TradeSignal::Hold, |snapshot| snapshot.signal)
    }

    /// Full evaluation, `None` while history is shorter than `min_history()`.
    pub fn evaluate(&self, history: &[PriceBar]) -> Option<SignalSnapshot> {
        if history.len() < self.min_history() {
            return None;
        }

        let closes: Vec<f64> = history.iter().map(|bar| bar.close).collect();
        let n = closes.len();
        let StrategySettings { fast_period: fast, slow_period: slow, rsi_period, .. } = self.settings;

        let fast_now  = mean(&closes[n - fast..]);
        let slow_now  = mean(&closes[n - slow..]);
        let fast_prev = mean(&closes[n - fast - 1..n - 1]);
        let slow_prev = mean(&closes[n - slow - 1..n - 1]);
        let rsi = compute_rsi(&closes[n.saturating_sub(rsi_period.saturating_mul(2))..], rsi_period);

        let bullish_cross = fast_prev <= slow_prev && fast_now > slow_now;
        let bearish_cross = fast_prev >= slow_prev && fast_now < slow_now;

        let signal = if bullish_cross && rsi < self.settings.rsi_overbought {
            TradeSignal::Buy
        } else if bearish_cross && rsi > self.settings.rsi_oversold {
            TradeSignal::Sell
        } else {
            TradeSignal::Hold
        };

        if signal == TradeSignal::Hold && (bullish_cross || bearish_cross) {
            debug!(
                "Cross suppressed by RSI filter: rsi={:.2} bullish={} bearish={}",
                rsi, bullish_cross, bearish_cross
            );
        }

        Some(SignalSnapshot { fast_now, slow_now, fast_prev, slow_prev, rsi, signal })
    }
}
