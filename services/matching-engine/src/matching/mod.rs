//! Matching logic module
//!
//! Crossing rules and the fill executor that applies them in price-time
//! priority.

pub mod crossing;
pub mod executor;

pub use crossing::{crosses, stop_triggered};
pub use executor::MatchExecutor;
