//! Market samples: ticks, FX ticks and bars
//!
//! Ticks are immutable once loaded. `TickValue` is the uniform view the
//! matching engine consumes, whichever kind of sample produced it.

use crate::numeric::{Price, Quantity};
use crate::time::DateTimeMs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A trade sample for non-FX instruments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub time: DateTimeMs,
    pub last: Price,
    pub volume: u64,
}

/// A quote sample for FX instruments (no volume)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickFx {
    pub time: DateTimeMs,
    pub bid: Price,
    pub ask: Price,
}

/// An OHLCV summary over one bar period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub start: DateTimeMs,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: u64,
}

/// Value of the sample under a tick cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TickValue {
    /// Last sale with the volume traded on this print
    Trade { last: Price, volume: u64 },
    /// Two-sided quote
    Quote { bid: Price, ask: Price },
}

impl TickValue {
    /// Price a resting buy order would trade against
    pub fn buy_fill_price(&self) -> Price {
        match self {
            TickValue::Trade { last, .. } => *last,
            TickValue::Quote { ask, .. } => *ask,
        }
    }

    /// Price a resting sell order would trade against
    pub fn sell_fill_price(&self) -> Price {
        match self {
            TickValue::Trade { last, .. } => *last,
            TickValue::Quote { bid, .. } => *bid,
        }
    }

    /// Price used to value open positions: last sale, or the quote mid
    pub fn mark_price(&self) -> Price {
        match self {
            TickValue::Trade { last, .. } => *last,
            TickValue::Quote { bid, ask } => Price::new((bid.as_decimal() + ask.as_decimal()) / Decimal::TWO),
        }
    }

    /// Liquidity carried by the sample; None means the quote is not size-limited
    pub fn available(&self) -> Option<Quantity> {
        match self {
            TickValue::Trade { volume, .. } => Some(Quantity::from_u64(*volume)),
            TickValue::Quote { .. } => None,
        }
    }
}

impl From<&Tick> for TickValue {
    fn from(tick: &Tick) -> Self {
        TickValue::Trade { last: tick.last, volume: tick.volume }
    }
}

impl From<&TickFx> for TickValue {
    fn from(tick: &TickFx) -> Self {
        TickValue::Quote { bid: tick.bid, ask: tick.ask }
    }
}
