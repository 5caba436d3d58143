//! Per-round threshold evaluation

pub mod thresholds;

pub use thresholds::AlertState;
