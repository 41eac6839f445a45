//! Simulated Broker
//!
//! Backtest market emulator behind the same broker surface a live
//! connection would offer. Historical ticks (or ticks forged from bars)
//! replay through per-symbol order books; strategy sessions submit limit
//! orders and receive fills, cancellations and quote updates.
//!
//! # Modules
//! - `world`: Shared simulation state, order admission and time advance
//! - `lifecycle`: Idle/Start/Running/Stopping transitions and quote subscriptions
//! - `loader`: One-time load and forging of the universe's tick sequences
//! - `broker`: `Broker` trait, session events and the simulated session
//! - `registry`: Name → factory map for opening sessions
//! - `config`: TOML configuration
//! - `status`: Atomic lifecycle status
//! - `stats`: Run counters and load results

pub mod broker;
pub mod config;
pub mod lifecycle;
pub mod loader;
pub mod registry;
pub mod stats;
pub mod status;
pub mod world;

pub use broker::{Broker, BrokerEvent, BrokerFactory, BrokerKind, QuoteSubscription, SimBroker, SimBrokerFactory};
pub use config::SimConfig;
pub use registry::{BrokerRegistry, SIM_BROKER};
pub use stats::{LoadReport, SimStats};
pub use status::VmStatus;
pub use world::SimWorld;

/// Crate version constant
pub const VERSION: &str = "1.0.0";
