//! Core domain types and logic.

pub mod backtest;
pub mod config_validation;
pub mod dataset;
pub mod error;
pub mod indicator;
pub mod ledger;
pub mod models;
pub mod price_point;
pub mod report;
pub mod slots;
pub mod strategy;
