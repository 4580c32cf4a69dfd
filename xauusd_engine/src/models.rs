//! models.rs — Domain entities shared by the strategy, broker and backtest.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decimal places used when reporting the account balance.
pub const REPORT_DECIMALS: i32 = 2;

/// One OHLC bar.  Produced by the data layer, read-only everywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open:      f64,
    pub high:      f64,
    pub low:       f64,
    pub close:     f64,
}

impl PriceBar {
    /// A bar whose four prices are all `price`.
    pub fn flat(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, open: price, high: price, low: price, close: price }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeSignal {
    Buy,
    Sell,
    Hold,
}

impl TradeSignal {
    /// +1 for Buy, −1 for Sell, 0 for Hold.
    pub fn direction(self) -> f64 {
        match self {
            TradeSignal::Buy  => 1.0,
            TradeSignal::Sell => -1.0,
            TradeSignal::Hold => 0.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            TradeSignal::Buy  => TradeSignal::Sell,
            TradeSignal::Sell => TradeSignal::Buy,
            TradeSignal::Hold => TradeSignal::Hold,
        }
    }
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeSignal::Buy  => "BUY",
            TradeSignal::Sell => "SELL",
            TradeSignal::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    SignalReversal,
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::TakeProfit     => "Take Profit",
            ExitReason::StopLoss       => "Stop Loss",
            ExitReason::SignalReversal => "Cambio de señal",
            ExitReason::EndOfData      => "End of data",
        };
        f.write_str(s)
    }
}

/// The single open exposure.  `size > 0` is long, `size < 0` short, `0` flat.
///
/// Never updated in place: the broker swaps in a new value on open and
/// resets to `Position::default()` on close.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub size:        f64,
    pub entry_price: Option<f64>,
    pub take_profit: Option<f64>,
    pub stop_loss:   Option<f64>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.size != 0.0 && self.entry_price.is_some()
    }

    /// Direction of the open position, `None` when flat.
    pub fn side(&self) -> Option<TradeSignal> {
        if !self.is_open() {
            None
        } else if self.size > 0.0 {
            Some(TradeSignal::Buy)
        } else {
            Some(TradeSignal::Sell)
        }
    }
}

/// Ledger entry.  Appended open; finalised in place when the position closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub opened_at:   DateTime<Utc>,
    pub side:        TradeSignal,
    pub entry_price: f64,
    /// Signed, mirrors `Position::size` at open.
    pub size:        f64,
    pub closed_at:   Option<DateTime<Utc>>,
    pub exit_price:  Option<f64>,
    pub pnl:         Option<f64>,
    /// Close reason text, empty while open.
    pub notes:       String,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

/// Account summary as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub trades:  usize,
    pub wins:    usize,
    pub losses:  usize,
    pub balance: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trades={} wins={} losses={} balance={:.2}",
            self.trades, self.wins, self.losses, self.balance
        )
    }
}

/// Round `value` to `REPORT_DECIMALS` places.
pub fn round_report(value: f64) -> f64 {
    let factor = 10f64.powi(REPORT_DECIMALS);
    (value * factor).round() / factor
}
