//! indicators/sma.rs — Simple moving average
//!
//!   SMA_n = (1/n) · Σ_{i=0}^{n−1} close_{t−i}
//!
//! Callers slice the window themselves; this is the plain arithmetic mean.
//! An empty slice yields NaN, which fails every comparison downstream.

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
