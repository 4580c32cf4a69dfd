pub mod backtest;
pub mod broker;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod models;
pub mod risk;
pub mod strategy;

pub use broker::PaperBroker;
pub use config::{AppConfig, BrokerSettings, StrategySettings};
pub use error::{Error, Result};
pub use models::*;
pub use strategy::MovingAverageRsiStrategy;
