//! Crossing detection logic
//!
//! Decides whether an incoming market price reaches a resting limit or a
//! protective stop.

use types::numeric::Price;
use types::order::Side;

/// Whether a resting order on `side` at `limit` trades against `market`
///
/// Buys fill when the sell-side price is at or below the limit; sells when
/// the buy-side price is at or above it.
pub fn crosses(side: Side, limit: Price, market: Price) -> bool {
    match side {
        Side::Buy => market <= limit,
        Side::Sell => market >= limit,
    }
}

/// Whether a stop protecting a position triggers at `market`
///
/// `exit_side` is the side of the closing trade: a long is closed by selling
/// and stops out when the price falls to the stop; a short the reverse.
pub fn stop_triggered(exit_side: Side, stop: Price, market: Price) -> bool {
    match exit_side {
        Side::Sell => market <= stop,
        Side::Buy => market >= stop,
    }
}
