//! metrics.rs — Performance Metrics
//!
//! ─────────────────────────────────────────────────────────────────────────
//! DEFINITIONS (all PnL in price units × size, no fees)
//! ─────────────────────────────────────────────────────────────────────────
//!
//! WIN RATE & AVERAGE TRADE
//!   P_win   = count(pnl > 0) / N_closed
//!   AvgWin  = mean(pnl | pnl > 0)
//!   AvgLoss = mean(|pnl| | pnl < 0)
//!
//! PROFIT FACTOR
//!   PF = Σ pnl⁺ / Σ |pnl⁻|
//!   ∞ when there are winners but no losers, 0 with no winners.
//!
//! MAXIMUM DRAWDOWN
//!   Balance curve: B_t (realised, starts at 0)
//!   Running peak: peak_t = max_{s ≤ t}(B_s)
//!   MaxDD = max_t (peak_t − B_t)      (absolute, ≥ 0)
//!
//!   The balance starts at zero, so a fractional drawdown against the peak
//!   is undefined; the absolute fall is reported instead.
//! ─────────────────────────────────────────────────────────────────────────
use serde::Serialize;

use crate::models::Trade;

/// Complete backtest performance report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerfReport {
    /// Closed trades only
    pub n_trades:      usize,
    pub wins:          usize,
    pub losses:        usize,
    pub win_rate:      f64,
    pub avg_win:       f64,
    pub avg_loss:      f64,
    pub profit_factor: f64,
    pub net_pnl:       f64,
    pub max_drawdown:  f64,
}

impl std::fmt::Display for PerfReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "════════════════════════════════════════════")?;
        writeln!(f, "  XAUUSD ENGINE — BACKTEST PERFORMANCE REPORT")?;
        writeln!(f, "════════════════════════════════════════════")?;
        writeln!(f, "  Closed Trades  : {}", self.n_trades)?;
        writeln!(f, "  Wins / Losses  : {} / {}", self.wins, self.losses)?;
        writeln!(f, "  Win Rate       : {:.2}%", self.win_rate * 100.0)?;
        writeln!(f, "  Avg Win        : {:.2}", self.avg_win)?;
        writeln!(f, "  Avg Loss       : {:.2}", self.avg_loss)?;
        writeln!(f, "  Profit Factor  : {:.3}", self.profit_factor)?;
        writeln!(f, "  Net PnL        : {:+.2}", self.net_pnl)?;
        writeln!(f, "  Max Drawdown   : {:.2}", self.max_drawdown)?;
        writeln!(f, "════════════════════════════════════════════")
    }
}

/// Compute metrics from the ledger and the per-bar realised balance.
///
/// Open trades (no pnl yet) are skipped.
pub fn compute_metrics(trades: &[Trade], balance_curve: &[f64]) -> PerfReport {
    let pnls: Vec<f64> = trades.iter().filter_map(|t| t.pnl).collect();
    let n = pnls.len();
    let max_drawdown = max_drawdown(balance_curve);

    if n == 0 {
        return PerfReport {
            n_trades: 0, wins: 0, losses: 0, win_rate: 0.0, avg_win: 0.0,
            avg_loss: 0.0, profit_factor: 0.0, net_pnl: 0.0, max_drawdown,
        };
    }

    let winners: Vec<f64> = pnls.iter().copied().filter(|&p| p > 0.0).collect();
    let losers:  Vec<f64> = pnls.iter().filter(|&&p| p < 0.0).map(|p| p.abs()).collect();

    let gross_win:  f64 = winners.iter().sum();
    let gross_loss: f64 = losers.iter().sum();

    let profit_factor = if gross_loss < 1e-12 {
        if gross_win > 0.0 { f64::INFINITY } else { 0.0 }
    } else {
        gross_win / gross_loss
    };

    PerfReport {
        n_trades: n,
        wins: winners.len(),
        losses: losers.len(),
        win_rate: winners.len() as f64 / n as f64,
        avg_win: mean(&winners).unwrap_or(0.0),
        avg_loss: mean(&losers).unwrap_or(0.0),
        profit_factor,
        net_pnl: pnls.iter().sum(),
        max_drawdown,
    }
}

/// Largest peak-to-trough fall of the balance curve, as a positive number.
pub fn max_drawdown(balance_curve: &[f64]) -> f64 {
    let Some(&first) = balance_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0f64;

    for &b in balance_curve {
        if b > peak {
            peak = b;
        }
        max_dd = max_dd.max(peak - b);
    }
    max_dd
}

// ── Statistical helpers ───────────────────────────────────────────────────

fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}
