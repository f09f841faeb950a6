//! Core domain types and logic.

pub mod value_column;
pub mod data_row;
pub mod resolution;
pub mod indicator;
pub mod order;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod plot;
pub mod strategy;
pub mod session;
pub mod metrics;
pub mod config_validation;
pub mod error;
