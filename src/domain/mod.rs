//! Core domain types and logic.

pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod fusion;
pub mod metrics;
pub mod ohlcv;
pub mod pipeline;
pub mod portfolio;
pub mod position;
pub mod risk_limits;
pub mod rng;
pub mod signal;
pub mod sizing;
pub mod strategy;
