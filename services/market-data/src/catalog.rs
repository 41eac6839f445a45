//! Symbol catalog
//!
//! Maps tickers to their metadata and owns each symbol's quote snapshot.
//! The snapshot is shared (`Arc<RwLock<_>>`) so subscribers read the same
//! quotes the simulation writes.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use types::errors::LookupError;
use types::ids::SymbolKey;
use types::numeric::Price;
use types::quote::Quotes;
use types::symbol::{SymbolInfo, SymbolSpec};

/// Quote snapshot shared between the catalog and its readers
pub type SharedQuotes = Arc<RwLock<Quotes>>;

/// Read side of the catalog, as the simulation sees it
pub trait SymbolCatalog: Send + Sync {
    fn lookup(&self, ticker: &str) -> Result<SymbolInfo, LookupError>;

    /// Quote snapshot for a registered key
    fn quotes(&self, key: SymbolKey) -> Option<SharedQuotes>;
}

#[derive(Debug)]
struct Entry {
    info: SymbolInfo,
    quotes: SharedQuotes,
}

#[derive(Debug, Default)]
struct Inner {
    by_ticker: BTreeMap<String, SymbolKey>,
    entries: Vec<Entry>,
}

/// In-process catalog; keys are assigned densely in registration order
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<Inner>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a symbol; registering a known ticker returns the existing entry
    pub fn register(&self, spec: SymbolSpec) -> SymbolInfo {
        let mut inner = self.inner.write();
        if let Some(key) = inner.by_ticker.get(&spec.ticker) {
            return inner.entries[key.value() as usize].info.clone();
        }
        let key = SymbolKey::new(inner.entries.len() as u32);
        let info = SymbolInfo::from_spec(key, spec);
        inner.by_ticker.insert(info.ticker.clone(), key);
        inner.entries.push(Entry {
            info: info.clone(),
            quotes: Arc::new(RwLock::new(Quotes::default())),
        });
        debug!(ticker = %info.ticker, %key, is_fx = info.is_fx, "symbol registered");
        info
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry_quotes(&self, ticker: &str) -> Option<(SymbolInfo, SharedQuotes)> {
        let inner = self.inner.read();
        let key = inner.by_ticker.get(ticker)?;
        let entry = &inner.entries[key.value() as usize];
        Some((entry.info.clone(), Arc::clone(&entry.quotes)))
    }

    /// Apply a last-sale print with a raw cumulative feed volume
    ///
    /// Unknown tickers are ignored. Returns whether the update was applied.
    pub fn update_last_sales(&self, ticker: &str, last: Price, raw_volume: Decimal) -> bool {
        let Some((info, quotes)) = self.entry_quotes(ticker) else {
            return false;
        };
        let volume = info.volume_normal(raw_volume);
        let applied = quotes.write().apply_last_sale(last, volume);
        if !applied {
            warn!(ticker, volume, "last sale rejected: volume went backwards");
        }
        applied
    }

    /// Replace bid and ask unconditionally; unknown tickers are ignored
    pub fn update_bid_ask(&self, ticker: &str, bid: Price, ask: Price) {
        if let Some((_, quotes)) = self.entry_quotes(ticker) {
            quotes.write().apply_bid_ask(bid, ask);
        }
    }

    /// Replace the whole snapshot; unknown tickers are ignored
    pub fn update_quotes(&self, ticker: &str, snapshot: Quotes) {
        if let Some((_, quotes)) = self.entry_quotes(ticker) {
            *quotes.write() = snapshot;
        }
    }

    pub fn get_quotes(&self, ticker: &str) -> Option<Quotes> {
        self.entry_quotes(ticker).map(|(_, q)| q.read().clone())
    }
}

impl SymbolCatalog for InMemoryCatalog {
    fn lookup(&self, ticker: &str) -> Result<SymbolInfo, LookupError> {
        let inner = self.inner.read();
        inner
            .by_ticker
            .get(ticker)
            .map(|key| inner.entries[key.value() as usize].info.clone())
            .ok_or_else(|| LookupError::SymbolNotFound { ticker: ticker.to_string() })
    }

    fn quotes(&self, key: SymbolKey) -> Option<SharedQuotes> {
        self.inner
            .read()
            .entries
            .get(key.value() as usize)
            .map(|e| Arc::clone(&e.quotes))
    }
}
