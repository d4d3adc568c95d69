//! Core domain types and logic.

pub mod ohlcv;
pub mod session;
pub mod levels;
pub mod position;
pub mod strategy;
pub mod alerts;
pub mod config_validation;
pub mod error;
