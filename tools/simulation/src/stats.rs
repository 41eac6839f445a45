//! Run statistics and load results

use serde::{Deserialize, Serialize};

/// Counters for the current run, reset by every `start()`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    pub ticks_applied: u64,
    pub orders_submitted: u64,
    pub orders_cancelled: u64,
    pub fills: u64,
    pub stop_losses: u64,
    pub events_dropped: u64,
}

/// Outcome of the one-time data load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Symbols replaying raw ticks
    pub loaded: usize,
    /// Symbols replaying ticks forged from bars
    pub forged: usize,
    /// Universe rows that produced no usable sequence
    pub rejected: usize,
}

impl LoadReport {
    pub fn tradable(&self) -> usize {
        self.loaded + self.forged
    }
}
