//! main.rs — Backtesting Entry Point
//!
//! Runs the XAUUSD engine over a synthetic daily series:
//!   1. Load config from .env
//!   2. Generate seeded mock bars
//!   3. Replay them through strategy + paper broker (or sweep SMA periods)
//!   4. Print the summary, metrics and trade ledger
//!
//! Usage:
//!   cargo run --bin backtest -- run --points 500 --seed 7
//!   cargo run --bin backtest -- sweep --fast 3,5,8 --slow 13,20,30

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use xauusd_engine::backtest::{print_trade_log, run_backtest, sweep, BacktestConfig};
use xauusd_engine::config::AppConfig;
use xauusd_engine::data::{generate_mock_data, MockDataConfig};

#[derive(Parser)]
#[command(name = "backtest")]
#[command(about = "XAUUSD paper-trading backtest: SMA crossover + RSI filter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Number of synthetic daily bars
    #[arg(long, default_value_t = 200)]
    points: usize,

    /// RNG seed for the synthetic series
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// First open price
    #[arg(long, default_value_t = 2000.0)]
    start_price: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single backtest with the configured parameters
    Run {
        #[command(flatten)]
        data: DataArgs,

        /// Close any open position on the last bar
        #[arg(long)]
        flatten_at_end: bool,

        /// Print the full report as JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Log every signal and close
        #[arg(short, long)]
        verbose: bool,

        /// Ledger rows to print
        #[arg(long, default_value_t = 20)]
        top: usize,
    },

    /// Backtest a grid of fast/slow SMA periods in parallel
    Sweep {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long, value_delimiter = ',', default_values_t = [3usize, 5, 8])]
        fast: Vec<usize>,

        #[arg(long, value_delimiter = ',', default_values_t = [13usize, 20, 30])]
        slow: Vec<usize>,

        /// Results to print
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

impl DataArgs {
    fn mock_config(&self) -> MockDataConfig {
        MockDataConfig {
            points:      self.points,
            seed:        self.seed,
            start_price: self.start_price,
            ..MockDataConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // ── Config ───────────────────────────────────────────────────────────
    let cfg = AppConfig::from_env()?;
    info!(
        "Config: pair={} fast={} slow={} rsi={} ({:.0}/{:.0})",
        cfg.pair(),
        cfg.strategy.fast_period,
        cfg.strategy.slow_period,
        cfg.strategy.rsi_period,
        cfg.strategy.rsi_oversold,
        cfg.strategy.rsi_overbought,
    );
    info!(
        "Broker: size={} tp={:.2}% sl={:.2}% reverse={}",
        cfg.broker.position_size,
        cfg.broker.take_profit_pct,
        cfg.broker.stop_loss_pct,
        cfg.broker.reverse_on_signal,
    );

    match cli.command {
        Commands::Run { data, flatten_at_end, json, verbose, top } => {
            let bars = generate_mock_data(&data.mock_config());
            info!("Generated {} synthetic bars (seed {})", bars.len(), data.seed);

            let bt_cfg = BacktestConfig { verbose, flatten_at_end };
            let report = run_backtest(&bars, &cfg, &bt_cfg)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\nBacktest summary: {}", report.summary);
                println!(
                    "Signals: buy={} sell={} hold={}",
                    report.signals.buy, report.signals.sell, report.signals.hold
                );
                println!("\n{}", report.metrics);
                print_trade_log(&report.trades, top);
            }
        }

        Commands::Sweep { data, fast, slow, top } => {
            let bars = generate_mock_data(&data.mock_config());
            let results = sweep(&bars, &cfg, &fast, &slow);
            if results.is_empty() {
                anyhow::bail!("No valid (fast, slow) pairs: need at least one fast period below a slow period");
            }

            println!(
                "\n{:<6} {:<6} {:<8} {:<6} {:<8} {:<12} {:<10}",
                "FAST", "SLOW", "TRADES", "WINS", "LOSSES", "BALANCE", "MAX DD"
            );
            println!("{}", "─".repeat(62));
            for r in results.iter().take(top) {
                println!(
                    "{:<6} {:<6} {:<8} {:<6} {:<8} {:<+12.2} {:<10.2}",
                    r.fast_period,
                    r.slow_period,
                    r.summary.trades,
                    r.summary.wins,
                    r.summary.losses,
                    r.summary.balance,
                    r.metrics.max_drawdown,
                );
            }
        }
    }

    Ok(())
}
