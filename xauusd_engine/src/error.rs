//! error.rs — Engine error type
//!
//! Only construction-time validation fails.  Insufficient history is never
//! an error: indicators and the strategy fall back to neutral values.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("fast_period ({fast}) must be less than slow_period ({slow})")]
    InvalidPeriods { fast: usize, slow: usize },

    #[error("Config key {key}: {message}")]
    InvalidEnv { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
