//! Broker registry
//!
//! Name → factory map built once at startup and handed to whoever needs to
//! open sessions.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;
use types::errors::BrokerError;

use crate::broker::{Broker, BrokerEvent, BrokerFactory, SimBrokerFactory};
use crate::world::SimWorld;

/// Name the simulated factory registers under
pub const SIM_BROKER: &str = "simBroker";

#[derive(Default)]
pub struct BrokerRegistry {
    factories: BTreeMap<String, Arc<dyn BrokerFactory>>,
}

impl BrokerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the simulated factory for `world` under [`SIM_BROKER`]
    pub fn with_simulated(world: Arc<SimWorld>) -> Self {
        let mut registry = Self::new();
        registry.factories.insert(SIM_BROKER.to_string(), Arc::new(SimBrokerFactory::new(world)));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: Arc<dyn BrokerFactory>) -> Result<(), BrokerError> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(BrokerError::DuplicateBroker { name });
        }
        info!(broker = %name, kind = ?factory.kind(), "broker registered");
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Open a session on the named broker
    pub fn open(&self, name: &str, events: flume::Sender<BrokerEvent>) -> Result<Box<dyn Broker>, BrokerError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| BrokerError::UnknownBroker { name: name.to_string() })?;
        factory.open(events)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
