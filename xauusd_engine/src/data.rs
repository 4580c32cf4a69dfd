//! data.rs — Synthetic daily bars for offline backtests
//!
//!   close_i = max(1, close_{i−1} + 5·sin(i/15) + U(−3, 3))
//!   high_i  = close_i + U(0, 2)
//!   low_i   = close_i − U(0, 2)
//!   open_i  = close_{i−1}
//!
//! A slow sine drift with uniform noise; the same seed always yields the
//! same series.
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::PriceBar;

#[derive(Debug, Clone)]
pub struct MockDataConfig {
    pub points:      usize,
    pub seed:        u64,
    pub start_price: f64,
    /// The series ends one day before this instant
    pub end:         DateTime<Utc>,
}

impl Default for MockDataConfig {
    fn default() -> Self {
        Self {
            points:      200,
            seed:        42,
            start_price: 2000.0,
            end:         start_of_day(Utc::now()),
        }
    }
}

/// Generate `cfg.points` daily bars, oldest first.
pub fn generate_mock_data(cfg: &MockDataConfig) -> Vec<PriceBar> {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut bars = Vec::with_capacity(cfg.points);
    let mut price = cfg.start_price;

    for i in 0..cfg.points {
        let timestamp = cfg.end - Duration::days((cfg.points - i) as i64);
        let drift = (i as f64 / 15.0).sin() * 5.0;
        let noise = rng.gen_range(-3.0..3.0);
        let close = (price + drift + noise).max(1.0);
        let high = close + rng.gen_range(0.0..2.0);
        let low = close - rng.gen_range(0.0..2.0);

        bars.push(PriceBar { timestamp, open: price, high, low, close });
        price = close;
    }
    bars
}

/// Midnight UTC of the day containing `t`.
pub fn start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cfg(seed: u64) -> MockDataConfig {
        MockDataConfig {
            points: 50,
            seed,
            start_price: 2000.0,
            end: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn deterministic_for_seed() {
        assert_eq!(generate_mock_data(&cfg(7)), generate_mock_data(&cfg(7)));
        assert_ne!(generate_mock_data(&cfg(7)), generate_mock_data(&cfg(8)));
    }

    #[test]
    fn bars_are_well_formed() {
        let bars = generate_mock_data(&cfg(42));
        assert_eq!(bars.len(), 50);
        assert_eq!(bars[0].open, 2000.0);
        for pair in bars.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
            assert_eq!(pair[1].open, pair[0].close);
        }
        for bar in &bars {
            assert!(bar.low <= bar.close && bar.close <= bar.high);
            assert!(bar.close >= 1.0);
        }
        let last = bars.last().unwrap();
        assert_eq!(last.timestamp, cfg(42).end - Duration::days(1));
    }

    #[test]
    fn midnight_truncation() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 17, 42, 9).unwrap();
        assert_eq!(start_of_day(t), Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
    }
}
