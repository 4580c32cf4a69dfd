//! indicators/rsi.rs — Relative Strength Index over a trailing window
//!
//! ─────────────────────────────────────────────────────────────────────────
//! DEFINITIONS
//! ─────────────────────────────────────────────────────────────────────────
//!
//!   Δ_t     = close_t − close_{t−1}
//!   G       = Σ max(Δ_t, 0)      over the last `period` differences
//!   L       = Σ max(−Δ_t, 0)     over the same differences
//!   avg_G   = G / period,  avg_L = L / period
//!   RS      = avg_G / avg_L
//!   RSI     = 100 − 100 / (1 + RS)
//!
//! Simple (not Wilder) averages: only the trailing window contributes,
//! older differences are dropped entirely.
//!
//! EDGE CASES
//!   len(closes) ≤ period → 50   (not enough history, neutral reading)
//!   avg_L == 0           → 100  (including the flat series, avg_G == 0)
//! ─────────────────────────────────────────────────────────────────────────

/// Neutral reading returned while the series is too short.
pub const NEUTRAL_RSI: f64 = 50.0;

/// RSI of `closes` (oldest → newest) over the last `period` differences.
///
/// Always in [0, 100] for finite input.  A zero `period` has no window and
/// reads neutral.
pub fn compute_rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() <= period {
        return NEUTRAL_RSI;
    }

    // `period` differences need `period + 1` closes
    let window = &closes[closes.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0f64, 0.0f64), |(g, l), delta| {
            if delta >= 0.0 {
                (g + delta, l)
            } else {
                (g, l - delta)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
