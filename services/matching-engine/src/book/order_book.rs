//! Order book for a single symbol
//!
//! Owns both sides plus an id index so removal by id alone stays O(log n).
//! No internal locking; the owner serializes access.

use std::collections::HashMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Side;

use super::{AskBook, AskKey, BidBook, BidKey, RestingOrder};

#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    bids: BidBook,
    asks: AskBook,
    index: HashMap<OrderId, (Side, Price)>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, order: RestingOrder) {
        self.index.insert(order.id, (order.side, order.price));
        match order.side {
            Side::Buy => self.bids.insert(order),
            Side::Sell => self.asks.insert(order),
        }
    }

    /// Best resting order on `side`
    pub fn peek_best(&self, side: Side) -> Option<&RestingOrder> {
        match side {
            Side::Buy => self.bids.best(),
            Side::Sell => self.asks.best(),
        }
    }

    /// Remove an order by id; no-op when absent
    pub fn remove(&mut self, id: OrderId) -> Option<RestingOrder> {
        let (side, price) = self.index.remove(&id)?;
        match side {
            Side::Buy => self.bids.remove(&BidKey::new(price, id)),
            Side::Sell => self.asks.remove(&AskKey::new(price, id)),
        }
    }

    /// Shrink an order in place after a partial fill, keeping its priority
    pub fn update_remaining(&mut self, id: OrderId, remaining: Quantity) -> bool {
        let Some(&(side, price)) = self.index.get(&id) else {
            return false;
        };
        let slot = match side {
            Side::Buy => self.bids.get_mut(&BidKey::new(price, id)),
            Side::Sell => self.asks.get_mut(&AskKey::new(price, id)),
        };
        match slot {
            Some(order) => {
                order.remaining = remaining;
                true
            }
            None => false,
        }
    }

    /// Orders on `side` in matching priority
    pub fn iter(&self, side: Side) -> Box<dyn Iterator<Item = &RestingOrder> + '_> {
        match side {
            Side::Buy => Box::new(self.bids.iter()),
            Side::Sell => Box::new(self.asks.iter()),
        }
    }

    /// Aggregated (price, quantity) for the best `levels` prices on `side`
    pub fn depth(&self, side: Side, levels: usize) -> Vec<(Price, Quantity)> {
        match side {
            Side::Buy => self.bids.depth_snapshot(levels),
            Side::Sell => self.asks.depth_snapshot(levels),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
