//! Event structures for the matching engine

use serde::{Deserialize, Serialize};
use types::ids::{AccountId, OrderId, SymbolKey};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::time::DateTimeMs;

/// What produced a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FillKind {
    /// Resting limit order crossed by a tick
    Limit,
    /// Explicit close at market
    Close,
    /// Protective stop on previously filled quantity
    StopLoss,
}

/// One execution
///
/// `side` is the side of this trade. For stop-loss fills that is the exit
/// side, opposite to the order that opened the position. `remaining` is the
/// order's open quantity after the fill (always zero for stop-loss fills).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub sequence: u64,
    pub order_id: OrderId,
    pub account: AccountId,
    pub symbol: SymbolKey,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub remaining: Quantity,
    pub kind: FillKind,
    pub timestamp: DateTimeMs,
}
