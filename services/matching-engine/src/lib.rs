//! Matching Engine Service
//!
//! Per-symbol order books and the execution rules of the simulated broker.
//! Resting limit orders are filled by incoming market samples in price-time
//! priority; there is no order-to-order matching.
//!
//! **Key Invariants:**
//! - Bids ranked by (price desc, id asc), asks by (price asc, id asc)
//! - Deterministic matching (same inputs → same outputs)
//! - A fill never exceeds the order's remaining quantity or the sample's volume

pub mod book;
pub mod matching;
pub mod engine;
pub mod events;

pub use book::{OrderBook, RestingOrder};
pub use engine::{MatchingEngine, StopEntry};
pub use events::{Fill, FillKind};
