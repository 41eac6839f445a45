//! Matching engine core
//!
//! Holds one order book per symbol and the protective stops attached to
//! orders. Orders never match each other: every fill comes from an incoming
//! market sample crossing a resting limit, from an explicit close, or from a
//! stop triggering.

use std::collections::BTreeMap;
use tracing::debug;
use types::ids::{AccountId, OrderId, SymbolKey};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::tick::TickValue;
use types::time::DateTimeMs;

use crate::book::{OrderBook, RestingOrder};
use crate::events::{Fill, FillKind};
use crate::matching::{crossing, MatchExecutor};

/// A stop protecting the filled part of an order
#[derive(Debug, Clone, PartialEq)]
pub struct StopEntry {
    pub symbol: SymbolKey,
    pub account: AccountId,
    /// Side of the trade that exits the position
    pub exit_side: Side,
    pub trigger: Price,
    /// Filled quantity currently protected
    pub quantity: Quantity,
}

/// Main matching engine
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    books: BTreeMap<SymbolKey, OrderBook>,
    stops: BTreeMap<OrderId, StopEntry>,
    executor: MatchExecutor,
}

impl MatchingEngine {
    pub fn new(starting_sequence: u64) -> Self {
        Self {
            books: BTreeMap::new(),
            stops: BTreeMap::new(),
            executor: MatchExecutor::new(starting_sequence),
        }
    }

    /// Rest an order in its symbol's book, arming its stop if it has one
    pub fn add_order(&mut self, symbol: SymbolKey, order: RestingOrder) {
        if let Some(trigger) = order.stop_loss {
            self.stops.insert(
                order.id,
                StopEntry {
                    symbol,
                    account: order.account,
                    exit_side: order.side.opposite(),
                    trigger,
                    quantity: Quantity::zero(),
                },
            );
        }
        debug!(order_id = %order.id, %symbol, side = ?order.side, price = %order.price, "order resting");
        self.books.entry(symbol).or_default().insert(order);
    }

    /// Pull an order from its book
    ///
    /// A stop that already protects filled quantity stays armed.
    pub fn cancel_order(&mut self, symbol: SymbolKey, id: OrderId) -> Option<RestingOrder> {
        let removed = self.books.get_mut(&symbol)?.remove(id)?;
        if self.stops.get(&id).is_some_and(|s| s.quantity.is_zero()) {
            self.stops.remove(&id);
        }
        Some(removed)
    }

    /// Fill an order's remaining quantity at `price` and drop its stop
    pub fn close_order(&mut self, symbol: SymbolKey, id: OrderId, price: Price, timestamp: DateTimeMs) -> Option<Fill> {
        let resting = self.books.get_mut(&symbol)?.remove(id)?;
        self.stops.remove(&id);
        let fill = self.executor.fill_out(&resting, symbol, price, FillKind::Close, timestamp);
        debug!(order_id = %id, price = %price, quantity = %fill.quantity, "order closed at market");
        Some(fill)
    }

    /// Apply one market sample for `symbol`
    ///
    /// Resting bids are tried first, then asks, each in priority order and
    /// sharing the sample's volume. Stops on the symbol are checked last.
    pub fn on_tick(&mut self, symbol: SymbolKey, value: &TickValue, timestamp: DateTimeMs) -> Vec<Fill> {
        let mut fills = Vec::new();

        if let Some(book) = self.books.get_mut(&symbol) {
            let mut available = value.available();
            for side in [Side::Buy, Side::Sell] {
                fills.extend(self.executor.sweep(book, symbol, side, value, &mut available, timestamp));
            }
        }

        for fill in &fills {
            if let Some(stop) = self.stops.get_mut(&fill.order_id) {
                stop.quantity = stop.quantity + fill.quantity;
            }
        }

        let triggered: Vec<OrderId> = self
            .stops
            .iter()
            .filter(|(_, s)| s.symbol == symbol && !s.quantity.is_zero())
            .filter(|(_, s)| crossing::stop_triggered(s.exit_side, s.trigger, exit_price(value, s.exit_side)))
            .map(|(id, _)| *id)
            .collect();

        for id in triggered {
            let Some(stop) = self.stops.remove(&id) else {
                continue;
            };
            if let Some(book) = self.books.get_mut(&symbol) {
                book.remove(id);
            }
            let price = exit_price(value, stop.exit_side);
            debug!(order_id = %id, trigger = %stop.trigger, price = %price, "stop loss triggered");
            fills.push(self.executor.stop_fill(
                id,
                stop.account,
                symbol,
                stop.exit_side,
                stop.quantity,
                price,
                timestamp,
            ));
        }

        fills
    }

    pub fn book(&self, symbol: SymbolKey) -> Option<&OrderBook> {
        self.books.get(&symbol)
    }

    pub fn stop(&self, id: OrderId) -> Option<&StopEntry> {
        self.stops.get(&id)
    }

    pub fn sequence(&self) -> u64 {
        self.executor.sequence()
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

fn exit_price(value: &TickValue, exit_side: Side) -> Price {
    match exit_side {
        Side::Buy => value.buy_fill_price(),
        Side::Sell => value.sell_fill_price(),
    }
}
