//! Identifier types for simulation entities
//!
//! All identifiers are small integers. Symbols are keyed by a catalog-assigned
//! `SymbolKey` so the hot path never compares ticker strings; orders use a
//! dense, monotonically increasing `OrderId` that doubles as an index into the
//! order table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fast key for a symbol
///
/// Assigned once by the symbol catalog and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolKey(u32);

impl SymbolKey {
    pub const fn new(key: u32) -> Self {
        Self(key)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym#{}", self.0)
    }
}

/// Unique identifier for an order
///
/// Never reused for the lifetime of a simulation world. Lower ids were
/// submitted earlier, which is what time priority compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Position of the order in a dense order table
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle of a broker session and the account it owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(u32);

impl AccountId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_ordering() {
        assert!(OrderId::new(2) < OrderId::new(5));
        assert_eq!(OrderId::new(7).index(), 7);
    }

    #[test]
    fn test_symbol_key_serialization() {
        let key = SymbolKey::new(42);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "42");

        let deserialized: SymbolKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, deserialized);
    }

    #[test]
    fn test_display() {
        assert_eq!(SymbolKey::new(3).to_string(), "sym#3");
        assert_eq!(AccountId::new(1).to_string(), "acct#1");
        assert_eq!(OrderId::new(9).to_string(), "9");
    }
}
