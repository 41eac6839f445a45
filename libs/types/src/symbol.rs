//! Symbol metadata
//!
//! What the catalog knows about a ticker: its fast key, whether it trades as
//! FX (quotes, no volume) and how prices and volumes are normalized.

use crate::ids::SymbolKey;
use crate::numeric::Price;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Registration parameters for a symbol, before a key is assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub ticker: String,
    pub is_fx: bool,
    /// Minimum price increment
    pub tick_size: Decimal,
    /// Decimal digits removed from raw feed volumes
    pub volume_digits: u32,
    /// Spread added to the bid when FX ticks are synthesized
    pub default_spread: Price,
}

impl SymbolSpec {
    pub fn new(ticker: impl Into<String>, is_fx: bool) -> Self {
        Self {
            ticker: ticker.into(),
            is_fx,
            tick_size: Decimal::new(1, 2),
            volume_digits: 0,
            default_spread: Price::ZERO,
        }
    }

    pub fn with_tick_size(mut self, tick_size: Decimal) -> Self {
        self.tick_size = tick_size;
        self
    }

    pub fn with_volume_digits(mut self, digits: u32) -> Self {
        self.volume_digits = digits;
        self
    }

    pub fn with_spread(mut self, spread: Price) -> Self {
        self.default_spread = spread;
        self
    }
}

/// Catalog entry for a registered symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub ticker: String,
    pub key: SymbolKey,
    pub is_fx: bool,
    pub tick_size: Decimal,
    pub volume_digits: u32,
    pub default_spread: Price,
}

impl SymbolInfo {
    pub fn from_spec(key: SymbolKey, spec: SymbolSpec) -> Self {
        Self {
            ticker: spec.ticker,
            key,
            is_fx: spec.is_fx,
            tick_size: spec.tick_size,
            volume_digits: spec.volume_digits,
            default_spread: spec.default_spread,
        }
    }

    /// Fast key accessor
    pub fn fast_key(&self) -> SymbolKey {
        self.key
    }

    /// Round a raw price to the nearest tick
    pub fn price_normal(&self, raw: Decimal) -> Price {
        if self.tick_size <= Decimal::ZERO {
            return Price::new(raw);
        }
        let ticks = (raw / self.tick_size).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Price::new((ticks * self.tick_size).normalize())
    }

    /// Scale a raw feed volume down by the symbol's volume digits
    pub fn volume_normal(&self, raw: Decimal) -> u64 {
        let scaled = if self.volume_digits > 0 {
            raw / Decimal::from(10u64.pow(self.volume_digits))
        } else {
            raw
        };
        scaled.trunc().to_u64().unwrap_or(0)
    }
}
