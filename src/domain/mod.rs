//! Core domain types and logic.

pub mod ohlcv;
pub mod signal;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod symbol_data;
pub mod indicator;
pub mod backtest;
pub mod metrics;
pub mod risk;
pub mod strategy;
pub mod universe;
pub mod config_validation;
pub mod error;
