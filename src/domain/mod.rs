//! Core domain types and logic.

pub mod candle;
pub mod market;
pub mod indicator;
pub mod probability;
pub mod edge;
pub mod trade;
pub mod backtest;
pub mod metrics;
pub mod strategy;
pub mod presets;
pub mod window;
pub mod compare;
pub mod config_validation;
pub mod error;
