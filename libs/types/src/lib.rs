//! Types library for the simulated broker
//!
//! Core type definitions shared by the matching engine, the market-data
//! layer and the simulation world. Everything here is plain data plus the
//! bookkeeping rules that must hold no matter which component mutates it.
//!
//! # Modules
//! - `ids`: Identifiers (SymbolKey, OrderId, AccountId)
//! - `numeric`: Fixed-point decimal types (Price, Quantity)
//! - `time`: Simulated time, bar periods and Julian day numbers
//! - `tick`: Ticks, FX ticks, bars and the tick value seen by matching
//! - `symbol`: Symbol metadata and normalization rules
//! - `quote`: Per-symbol quote snapshot
//! - `order`: Order lifecycle types
//! - `position`: Position tracking types
//! - `account`: Account ledger
//! - `errors`: Error taxonomy

pub mod ids;
pub mod numeric;
pub mod time;
pub mod tick;
pub mod symbol;
pub mod quote;
pub mod order;
pub mod position;
pub mod account;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";
