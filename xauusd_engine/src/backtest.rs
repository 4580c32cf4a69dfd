//! backtest.rs — Bar-replay backtesting
//!
//! Processes bars in chronological order.  Each bar is appended to a bounded
//! history window, the strategy evaluates the window, and the broker acts on
//! the (signal, bar) pair.  The realised balance after every bar forms the
//! curve used for drawdown.
//!
//! ARCHITECTURE
//! ┌─────────────────────────────────────────────────────┐
//! │  Bar Feed (&[PriceBar])                             │
//! │        │                                            │
//! │        ▼                                            │
//! │  history.push_back(bar)   (≤ history_window bars)   │
//! │        │                                            │
//! │   MovingAverageRsiStrategy::generate_signal         │
//! │        │                                            │
//! │   PaperBroker::on_signal(signal, bar)               │
//! │   ├─ protective levels (TP / SL)                    │
//! │   └─ open / ignore / close-and-reverse              │
//! │        │                                            │
//! │   balance_curve[t] = broker.balance()               │
//! └─────────────────────────────────────────────────────┘
use std::collections::VecDeque;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::broker::PaperBroker;
use crate::config::AppConfig;
use crate::error::Result;
use crate::metrics::{compute_metrics, PerfReport};
use crate::models::{ExitReason, PriceBar, Summary, Trade, TradeSignal};
use crate::strategy::MovingAverageRsiStrategy;

/// Backtest run parameters (separate from strategy config).
#[derive(Debug, Clone, Default)]
pub struct BacktestConfig {
    /// Log every signal and close at info level
    pub verbose:        bool,
    /// Close any open position on the last bar
    pub flatten_at_end: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalCounts {
    pub buy:  usize,
    pub sell: usize,
    pub hold: usize,
}

impl SignalCounts {
    fn record(&mut self, signal: TradeSignal) {
        match signal {
            TradeSignal::Buy  => self.buy += 1,
            TradeSignal::Sell => self.sell += 1,
            TradeSignal::Hold => self.hold += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub summary:       Summary,
    pub metrics:       PerfReport,
    pub signals:       SignalCounts,
    pub trades:        Vec<Trade>,
    pub balance_curve: Vec<f64>,
}

/// Run a complete backtest over a bar series.
///
/// Fails only if the strategy settings are invalid.
pub fn run_backtest(
    bars:   &[PriceBar],
    cfg:    &AppConfig,
    bt_cfg: &BacktestConfig,
) -> Result<BacktestReport> {
    let strategy = MovingAverageRsiStrategy::new(cfg.strategy.clone())?;
    let mut broker = PaperBroker::new(cfg.broker.clone());

    let window = cfg.history_window().max(strategy.min_history());
    let mut history: VecDeque<PriceBar> =
        VecDeque::with_capacity(window.min(bars.len()).saturating_add(1));
    let mut balance_curve = Vec::with_capacity(bars.len());
    let mut signals = SignalCounts::default();

    if bt_cfg.verbose {
        info!("Backtest {}: {} bars, history window {}", cfg.pair(), bars.len(), window);
    }

    // ── Main event loop ───────────────────────────────────────────────────
    for (i, bar) in bars.iter().enumerate() {
        history.push_back(bar.clone());
        if history.len() > window {
            history.pop_front();
        }

        let signal = strategy.generate_signal(history.make_contiguous());
        signals.record(signal);

        let closed = broker.on_signal(signal, bar);

        if signal != TradeSignal::Hold || closed.is_some() {
            log_step(bt_cfg.verbose, i, bar, signal, closed, broker.balance());
        }
        balance_curve.push(broker.balance());
    }

    // ── Optional force-close at last price ────────────────────────────────
    if bt_cfg.flatten_at_end {
        if let Some(last) = bars.last() {
            if broker.position().is_open() {
                broker.flatten(last, ExitReason::EndOfData);
                if let Some(b) = balance_curve.last_mut() {
                    *b = broker.balance();
                }
            }
        }
    }

    let metrics = compute_metrics(broker.trade_log(), &balance_curve);
    let summary = broker.summary();

    if bt_cfg.verbose {
        info!("Backtest {} done: {}", cfg.pair(), summary);
    }

    Ok(BacktestReport {
        summary,
        metrics,
        signals,
        trades: broker.trade_log().to_vec(),
        balance_curve,
    })
}

fn log_step(
    verbose: bool,
    i:       usize,
    bar:     &PriceBar,
    signal:  TradeSignal,
    closed:  Option<ExitReason>,
    balance: f64,
) {
    let closed = closed.map(|r| r.to_string()).unwrap_or_else(|| "-".into());
    if verbose {
        info!(
            "  [Bar {:>5}] {} {:<4} @ {:.2}  close={}  balance={:.2}",
            i, bar.timestamp.format("%Y-%m-%d"), signal, bar.close, closed, balance
        );
    } else {
        debug!(
            "  [Bar {:>5}] {} {:<4} @ {:.2}  close={}  balance={:.2}",
            i, bar.timestamp.format("%Y-%m-%d"), signal, bar.close, closed, balance
        );
    }
}

/// One point of a parameter sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub fast_period: usize,
    pub slow_period: usize,
    pub summary:     Summary,
    pub metrics:     PerfReport,
}

/// Backtest every `(fast, slow)` pair with `fast < slow` in parallel.
///
/// Each run owns its own strategy and broker.  Results are sorted by
/// balance, best first.
pub fn sweep(
    bars: &[PriceBar],
    cfg:  &AppConfig,
    fast: &[usize],
    slow: &[usize],
) -> Vec<SweepResult> {
    let grid: Vec<(usize, usize)> = fast
        .iter()
        .flat_map(|&f| slow.iter().map(move |&s| (f, s)))
        .filter(|&(f, s)| f < s)
        .collect();

    info!("Sweeping {} parameter sets over {} bars", grid.len(), bars.len());

    let bt_cfg = BacktestConfig::default();
    let mut results: Vec<SweepResult> = grid
        .par_iter()
        .filter_map(|&(f, s)| {
            let mut run_cfg = cfg.clone();
            run_cfg.strategy.fast_period = f;
            run_cfg.strategy.slow_period = s;
            match run_backtest(bars, &run_cfg, &bt_cfg) {
                Ok(report) => Some(SweepResult {
                    fast_period: f,
                    slow_period: s,
                    summary:     report.summary,
                    metrics:     report.metrics,
                }),
                Err(e) => {
                    warn!("Sweep ({f}, {s}) skipped: {e}");
                    None
                }
            }
        })
        .collect();

    results.sort_by(|a, b| b.summary.balance.total_cmp(&a.summary.balance));
    results
}

/// Print the first `top_n` ledger entries as a table.
pub fn print_trade_log(trades: &[Trade], top_n: usize) {
    println!(
        "\n{:<6} {:<5} {:<12} {:<12} {:<12} {:<10} {:<16}",
        "N", "SIDE", "OPENED", "ENTRY", "EXIT", "PNL", "REASON"
    );
    println!("{}", "─".repeat(78));

    for (i, t) in trades.iter().enumerate().take(top_n) {
        let exit = t.exit_price
            .map(|p| format!("{p:.2}"))
            .unwrap_or_else(|| "open".into());
        let pnl = t.pnl
            .map(|p| format!("{p:+.2}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<6} {:<5} {:<12} {:<12.2} {:<12} {:<10} {:<16}",
            i + 1,
            t.side,
            t.opened_at.format("%Y-%m-%d"),
            t.entry_price,
            exit,
            pnl,
            t.notes,
        );
    }
}
