//! risk.rs — Protective price levels (take-profit / stop-loss)
//!
//!   direction d = +1 (long) | −1 (short)
//!   TP = entry · (1 + tp_pct/100 · d)
//!   SL = entry · (1 − sl_pct/100 · d)
//!
//! For a short, d = −1 puts TP below entry and SL above it.
use crate::models::{ExitReason, Position};

/// `(take_profit, stop_loss)` for a position opened at `entry_price`.
pub fn protective_levels(
    entry_price:     f64,
    direction:       f64,
    take_profit_pct: f64,
    stop_loss_pct:   f64,
) -> (f64, f64) {
    let take_profit = entry_price * (1.0 + take_profit_pct / 100.0 * direction);
    let stop_loss   = entry_price * (1.0 - stop_loss_pct / 100.0 * direction);
    (take_profit, stop_loss)
}

/// Which protective level, if any, `price` breaches for `position`.
///
/// Take-profit is tested first, so a zero-width or inverted band resolves
/// to `TakeProfit`.
pub fn check_protective_levels(position: &Position, price: f64) -> Option<ExitReason> {
    if !position.is_open() {
        return None;
    }
    let long = position.size > 0.0;

    let hit_tp = position.take_profit.is_some_and(|tp| {
        if long { price >= tp } else { price <= tp }
    });
    if hit_tp {
        return Some(ExitReason::TakeProfit);
    }

    let hit_sl = position.stop_loss.is_some_and(|sl| {
        if long { price <= sl } else { price >= sl }
    });
    hit_sl.then_some(ExitReason::StopLoss)
}
