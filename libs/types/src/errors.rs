//! Error types for the simulated broker
//!
//! One thiserror enum per concern, with `BrokerError` as the umbrella the
//! facade returns.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Symbol catalog lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Symbol not found: {ticker}")]
    SymbolNotFound { ticker: String },
}

/// Operation attempted in the wrong lifecycle status
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Cannot {operation} while {status}")]
    InvalidStatus { operation: &'static str, status: String },
}

/// Historical data problems
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("No tick data for {ticker}")]
    TickNotExist { ticker: String },

    #[error("No bar data for {ticker}")]
    BarsNotExist { ticker: String },

    #[error("Tick time goes backwards at index {index}")]
    TickOrder { index: usize },
}

/// Startup configuration failures, fatal to the process
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cannot read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Parse error: {reason}")]
    Parse { reason: String },

    #[error("Invalid row at line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("No universe table configured")]
    MissingUniverse,
}

/// Order admission rejections
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    #[error("symbol not found")]
    SymbolNotFound,
    #[error("symbol has no tick data")]
    NotTradable,
    #[error("simulation is not running")]
    NotRunning,
    #[error("quantity must be positive")]
    InvalidQuantity,
    #[error("price must be positive")]
    InvalidPrice,
    #[error("unknown account")]
    UnknownAccount,
}

/// Top-level broker error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrokerError {
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Order rejected: {0}")]
    Rejected(#[from] RejectReason),

    #[error("Unknown broker: {name}")]
    UnknownBroker { name: String },

    #[error("Broker already registered: {name}")]
    DuplicateBroker { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_error_display() {
        let err = StateError::InvalidStatus { operation: "subscribe", status: "Running".to_string() };
        assert_eq!(err.to_string(), "Cannot subscribe while Running");
    }

    #[test]
    fn test_broker_error_from_reject() {
        let err: BrokerError = RejectReason::NotTradable.into();
        assert!(matches!(err, BrokerError::Rejected(RejectReason::NotTradable)));
        assert_eq!(err.to_string(), "Order rejected: symbol has no tick data");
    }

    #[test]
    fn test_data_error_display() {
        let err = DataError::TickOrder { index: 2 };
        assert!(err.to_string().contains("index 2"));
    }
}
