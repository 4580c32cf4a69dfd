//! broker.rs — Paper broker: single-position state machine and trade ledger
//!
//! STATES
//!   Flat ──BUY/SELL──▶ Open(long|short)
//!   Open ──TP/SL hit──▶ Flat
//!   Open ──opposite signal──▶ Flat ──(reverse_on_signal)──▶ Open(opposite)
//!
//! ORDER WITHIN `on_signal` (changing it changes results)
//!   1. protective levels against the bar close; a close here ends the call
//!   2. HOLD, or a signal matching the open side → nothing
//!   3. flat + BUY/SELL → open
//!   4. opposite signal → close "Cambio de señal", optionally re-open
//!
//! A reversal closes and re-opens on the same bar, so the exit price of one
//! trade is the entry price of the next.
use tracing::debug;

use crate::config::BrokerSettings;
use crate::models::{round_report, ExitReason, Position, PriceBar, Summary, Trade, TradeSignal};
use crate::risk::{check_protective_levels, protective_levels};

#[derive(Debug, Clone)]
pub struct PaperBroker {
    settings:  BrokerSettings,
    position:  Position,
    /// Realised PnL of every closed trade
    balance:   f64,
    /// Append-only; only the last entry may be open
    trade_log: Vec<Trade>,
}

impl PaperBroker {
    pub fn new(settings: BrokerSettings) -> Self {
        Self {
            settings,
            position:  Position::default(),
            balance:   0.0,
            trade_log: Vec::new(),
        }
    }

    pub fn settings(&self) -> &BrokerSettings {
        &self.settings
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn trade_log(&self) -> &[Trade] {
        &self.trade_log
    }

    /// The ledger entry backing the open position, if any.
    pub fn open_trade(&self) -> Option<&Trade> {
        self.trade_log.last().filter(|t| t.is_open())
    }

    /// Apply one signal for `bar`.  Bars must arrive in timestamp order.
    ///
    /// Returns the reason of the close performed during this call, if any.
    pub fn on_signal(&mut self, signal: TradeSignal, bar: &PriceBar) -> Option<ExitReason> {
        if let Some(reason) = check_protective_levels(&self.position, bar.close) {
            self.close_position(bar, reason);
            return Some(reason);
        }

        if signal == TradeSignal::Hold {
            return None;
        }

        let Some(current_side) = self.position.side() else {
            self.open_position(signal, bar);
            return None;
        };

        if signal == current_side {
            // already positioned that way
            return None;
        }

        self.close_position(bar, ExitReason::SignalReversal);
        if self.settings.reverse_on_signal {
            self.open_position(signal, bar);
        }
        Some(ExitReason::SignalReversal)
    }

    /// Close whatever is open at `bar`'s close.  No-op when flat.
    pub fn flatten(&mut self, bar: &PriceBar, reason: ExitReason) {
        self.close_position(bar, reason);
    }

    /// Trade count, wins (pnl > 0), losses (pnl < 0) and the rounded balance.
    ///
    /// Break-even and still-open trades count toward `trades` only.
    pub fn summary(&self) -> Summary {
        let pnls = || self.trade_log.iter().filter_map(|t| t.pnl);
        Summary {
            trades:  self.trade_log.len(),
            wins:    pnls().filter(|&p| p > 0.0).count(),
            losses:  pnls().filter(|&p| p < 0.0).count(),
            balance: round_report(self.balance),
        }
    }

    fn open_position(&mut self, signal: TradeSignal, bar: &PriceBar) {
        let direction = signal.direction();
        let entry_price = bar.close;
        let size = self.settings.position_size * direction;

        self.trade_log.push(Trade {
            opened_at:  bar.timestamp,
            side:       signal,
            entry_price,
            size,
            closed_at:  None,
            exit_price: None,
            pnl:        None,
            notes:      String::new(),
        });

        let (take_profit, stop_loss) = protective_levels(
            entry_price,
            direction,
            self.settings.take_profit_pct,
            self.settings.stop_loss_pct,
        );
        self.position = Position {
            size,
            entry_price: Some(entry_price),
            take_profit: Some(take_profit),
            stop_loss:   Some(stop_loss),
        };

        debug!(
            "OPEN  {} {:+.4} @ {:.2}  TP={:.2} SL={:.2}",
            signal, size, entry_price, take_profit, stop_loss
        );
    }

    fn close_position(&mut self, bar: &PriceBar, reason: ExitReason) {
        if !self.position.is_open() {
            return;
        }
        let exit_price = bar.close;

        let Some(trade) = self.trade_log.last_mut() else {
            return;
        };
        let pnl = (exit_price - trade.entry_price) * trade.size;
        trade.closed_at  = Some(bar.timestamp);
        trade.exit_price = Some(exit_price);
        trade.pnl        = Some(pnl);
        trade.notes      = reason.to_string();

        self.balance += pnl;
        self.position = Position::default();

        debug!(
            "CLOSE {} @ {:.2}  pnl={:+.2}  balance={:.2}  ({})",
            trade.side, exit_price, pnl, self.balance, reason
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    struct Feed {
        step: i64,
    }

    impl Feed {
        fn new() -> Self {
            Self { step: 0 }
        }

        fn bar(&mut self, price: f64) -> PriceBar {
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            self.step += 1;
            PriceBar::flat(start + Duration::minutes(self.step), price)
        }
    }

    fn broker(tp: f64, sl: f64, reverse: bool) -> PaperBroker {
        PaperBroker::new(BrokerSettings {
            position_size:     1.0,
            take_profit_pct:   tp,
            stop_loss_pct:     sl,
            reverse_on_signal: reverse,
        })
    }

    fn open_count(b: &PaperBroker) -> usize {
        b.trade_log().iter().filter(|t| t.is_open()).count()
    }

    #[test]
    fn open_and_close_long_trade() {
        let mut feed = Feed::new();
        let mut b = broker(10.0, 10.0, false);

        b.on_signal(TradeSignal::Buy, &feed.bar(2000.0));
        assert!(b.position().is_open());
        assert_eq!(b.position().entry_price, Some(2000.0));

        let reason = b.on_signal(TradeSignal::Sell, &feed.bar(2015.0));
        assert_eq!(reason, Some(ExitReason::SignalReversal));
        assert!(!b.position().is_open());
        assert_eq!(b.trade_log().len(), 1);

        let trade = &b.trade_log()[0];
        assert_eq!(trade.pnl, Some(15.0));
        assert_eq!(trade.exit_price, Some(2015.0));
        assert_eq!(trade.notes, "Cambio de señal");
        assert_eq!(b.balance(), 15.0);
    }

    #[test]
    fn stop_loss_triggers_before_hold() {
        let mut feed = Feed::new();
        let mut b = broker(10.0, 0.5, false);

        b.on_signal(TradeSignal::Buy, &feed.bar(2000.0));
        assert!((b.position().stop_loss.unwrap() - 1990.0).abs() < 1e-9);

        let reason = b.on_signal(TradeSignal::Hold, &feed.bar(1990.0));
        assert_eq!(reason, Some(ExitReason::StopLoss));
        assert!(!b.position().is_open());
        assert_eq!(b.trade_log()[0].notes, "Stop Loss");
        assert!(b.trade_log()[0].pnl.unwrap() < 0.0);
    }

    #[test]
    fn take_profit_on_short() {
        let mut feed = Feed::new();
        let mut b = broker(1.0, 1.0, true);

        b.on_signal(TradeSignal::Sell, &feed.bar(2000.0));
        assert_eq!(b.position().size, -1.0);
        assert!((b.position().take_profit.unwrap() - 1980.0).abs() < 1e-9);
        assert!((b.position().stop_loss.unwrap() - 2020.0).abs() < 1e-9);

        let reason = b.on_signal(TradeSignal::Hold, &feed.bar(1975.0));
        assert_eq!(reason, Some(ExitReason::TakeProfit));
        assert_eq!(b.trade_log()[0].pnl, Some(25.0));
    }

    #[test]
    fn protective_close_ends_the_call() {
        // The stop fires; the BUY arriving on the same bar is not acted upon
        let mut feed = Feed::new();
        let mut b = broker(10.0, 0.5, true);

        b.on_signal(TradeSignal::Buy, &feed.bar(2000.0));
        b.on_signal(TradeSignal::Buy, &feed.bar(1980.0));
        assert!(!b.position().is_open());
        assert_eq!(b.trade_log().len(), 1);
    }

    #[test]
    fn reversal_reopens_on_same_bar() {
        let mut feed = Feed::new();
        let mut b = broker(10.0, 10.0, true);

        b.on_signal(TradeSignal::Buy, &feed.bar(2000.0));
        let bar = feed.bar(1995.0);
        b.on_signal(TradeSignal::Sell, &bar);

        assert_eq!(b.trade_log().len(), 2);
        let (closed, reopened) = (&b.trade_log()[0], &b.trade_log()[1]);
        assert_eq!(closed.exit_price, Some(1995.0));
        assert_eq!(closed.closed_at, Some(bar.timestamp));
        assert_eq!(reopened.entry_price, 1995.0);
        assert_eq!(reopened.opened_at, bar.timestamp);
        assert_eq!(reopened.side, TradeSignal::Sell);
        assert!(reopened.is_open());
        assert_eq!(b.position().side(), Some(TradeSignal::Sell));
    }

    #[test]
    fn same_direction_signal_is_ignored() {
        let mut feed = Feed::new();
        let mut b = broker(10.0, 10.0, true);

        b.on_signal(TradeSignal::Buy, &feed.bar(2000.0));
        let before = b.position().clone();
        assert_eq!(b.on_signal(TradeSignal::Buy, &feed.bar(2005.0)), None);
        assert_eq!(b.position(), &before);
        assert_eq!(b.trade_log().len(), 1);
    }

    #[test]
    fn hold_while_flat_does_nothing() {
        let mut feed = Feed::new();
        let mut b = broker(10.0, 10.0, true);
        assert_eq!(b.on_signal(TradeSignal::Hold, &feed.bar(2000.0)), None);
        assert!(b.trade_log().is_empty());
        assert_eq!(b.summary(), Summary { trades: 0, wins: 0, losses: 0, balance: 0.0 });
    }

    #[test]
    fn flatten_closes_open_position() {
        let mut feed = Feed::new();
        let mut b = broker(10.0, 10.0, true);

        b.on_signal(TradeSignal::Sell, &feed.bar(2000.0));
        b.flatten(&feed.bar(1990.0), ExitReason::EndOfData);
        assert!(!b.position().is_open());
        assert_eq!(b.trade_log()[0].pnl, Some(10.0));
        assert_eq!(b.trade_log()[0].notes, "End of data");

        // flat: no-op
        b.flatten(&feed.bar(1900.0), ExitReason::EndOfData);
        assert_eq!(b.balance(), 10.0);
    }

    #[test]
    fn summary_counts_and_is_idempotent() {
        let mut feed = Feed::new();
        let mut b = broker(10.0, 10.0, true);

        b.on_signal(TradeSignal::Buy, &feed.bar(2000.0));
        b.on_signal(TradeSignal::Sell, &feed.bar(2010.0)); // long +10, short opens
        b.on_signal(TradeSignal::Buy, &feed.bar(2030.0));  // short −20, long opens
        b.on_signal(TradeSignal::Sell, &feed.bar(2030.0)); // long 0, short opens

        let first = b.summary();
        let second = b.summary();
        assert_eq!(first, second);
        assert_eq!(first.trades, 4);
        assert_eq!(first.wins, 1);
        assert_eq!(first.losses, 1);
        assert_eq!(first.balance, -10.0);
        assert!(first.wins + first.losses <= first.trades);
    }

    #[test]
    fn one_open_trade_iff_position_open() {
        let mut feed = Feed::new();
        let mut b = broker(1.0, 1.0, true);
        let script = [
            (TradeSignal::Buy, 2000.0),
            (TradeSignal::Hold, 2005.0),
            (TradeSignal::Sell, 2010.0),
            (TradeSignal::Hold, 2040.0), // short stopped out
            (TradeSignal::Hold, 2040.0),
            (TradeSignal::Buy, 2040.0),
            (TradeSignal::Hold, 2070.0), // long takes profit
        ];
        for (signal, price) in script {
            b.on_signal(signal, &feed.bar(price));
            let open = open_count(&b);
            assert!(open <= 1);
            assert_eq!(open == 1, b.position().is_open());
            assert_eq!(b.open_trade().is_some(), b.position().is_open());
        }
        assert_eq!(b.trade_log().len(), 3);
        assert_eq!(b.trade_log()[1].notes, "Stop Loss");
        assert_eq!(b.trade_log()[2].notes, "Take Profit");
    }

    #[test]
    fn balance_is_rounded_in_summary() {
        let mut feed = Feed::new();
        let mut b = PaperBroker::new(BrokerSettings {
            position_size: 0.333,
            take_profit_pct: 10.0,
            stop_loss_pct: 10.0,
            reverse_on_signal: false,
        });
        b.on_signal(TradeSignal::Buy, &feed.bar(2000.0));
        b.on_signal(TradeSignal::Sell, &feed.bar(2010.01));
        assert_eq!(b.summary().balance, round_report(b.balance()));
        assert_eq!(b.summary().balance, 3.33);
    }
}
