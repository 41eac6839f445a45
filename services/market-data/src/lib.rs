//! Market Data Service
//!
//! Everything the simulation needs to know about instruments and their
//! history:
//! - Symbol catalog with per-symbol quote snapshots
//! - Historical store seam and the preloaded bar cache
//! - Replayable tick sequences with ordering validation
//! - Tick forging from bars
//! - Universe table reader
//!
//! # Architecture
//!
//! ```text
//!  universe.csv ──► Universe
//!                      │
//!  HistoricalStore ────┼──► BarCache ──► TickForger ──┐
//!        │             │                              │
//!        └── raw ticks ┴──────────────────────────────┴──► SimTicker
//! ```

pub mod catalog;
pub mod forge;
pub mod store;
pub mod ticker;
pub mod universe;

pub use catalog::{InMemoryCatalog, SharedQuotes, SymbolCatalog};
pub use forge::{select_bars, TickForger};
pub use store::{BarCache, BarSeries, BarSource, DateRange, HistoricalStore, MemoryStore};
pub use ticker::{Advance, SimTicker, TickSeries};
pub use universe::{Features, Universe, UniverseEntry};

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
