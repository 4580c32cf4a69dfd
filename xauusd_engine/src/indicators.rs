pub mod rsi;
pub mod sma;

pub use rsi::{compute_rsi, NEUTRAL_RSI};
pub use sma::mean;
