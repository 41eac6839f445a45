//! Bid (buy-side) order book
//!
//! Buy orders sorted by price descending, then by order id ascending.
//! Uses BTreeMap for deterministic iteration order.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};

use super::RestingOrder;

/// Priority key for bids
///
/// Derived `Ord` compares fields in declaration order, so the highest price
/// sorts first and ties go to the lower (earlier) id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BidKey {
    price: Reverse<Price>,
    id: OrderId,
}

impl BidKey {
    pub fn new(price: Price, id: OrderId) -> Self {
        Self { price: Reverse(price), id }
    }

    pub fn price(&self) -> Price {
        self.price.0
    }

    pub fn id(&self) -> OrderId {
        self.id
    }
}

/// Bid (buy) side order book
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    orders: BTreeMap<BidKey, RestingOrder>,
}

impl BidBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, order: RestingOrder) {
        self.orders.insert(BidKey::new(order.price, order.id), order);
    }

    /// Remove an order, returning it if it was resting
    pub fn remove(&mut self, key: &BidKey) -> Option<RestingOrder> {
        self.orders.remove(key)
    }

    /// Highest bid, earliest id on ties
    pub fn best(&self) -> Option<&RestingOrder> {
        self.orders.values().next()
    }

    pub(crate) fn get_mut(&mut self, key: &BidKey) -> Option<&mut RestingOrder> {
        self.orders.get_mut(key)
    }

    /// Orders in matching priority
    pub fn iter(&self) -> impl Iterator<Item = &RestingOrder> {
        self.orders.values()
    }

    /// Aggregated (price, quantity) for the top `levels` prices
    pub fn depth_snapshot(&self, levels: usize) -> Vec<(Price, Quantity)> {
        let mut out: Vec<(Price, Quantity)> = Vec::new();
        for order in self.orders.values() {
            if let Some((price, qty)) = out.last_mut() {
                if *price == order.price {
                    *qty = *qty + order.remaining;
                    continue;
                }
            }
            if out.len() == levels {
                break;
            }
            out.push((order.price, order.remaining));
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::AccountId;
    use types::order::Side;

    fn bid(id: u64, price: u64, qty: u64) -> RestingOrder {
        RestingOrder {
            id: OrderId::new(id),
            account: AccountId::new(0),
            side: Side::Buy,
            price: Price::from_u64(price),
            remaining: Quantity::from_u64(qty),
            stop_loss: None,
        }
    }

    #[test]
    fn test_bid_book_best_bid() {
        let mut book = BidBook::new();
        book.insert(bid(1, 50_000, 1));
        book.insert(bid(2, 51_000, 2));
        book.insert(bid(3, 49_000, 1));

        let best = book.best().unwrap();
        assert_eq!(best.price, Price::from_u64(51_000));
        assert_eq!(best.id, OrderId::new(2));
    }

    #[test]
    fn test_bid_book_same_price_lower_id_first() {
        let mut book = BidBook::new();
        book.insert(bid(5, 100, 1));
        book.insert(bid(2, 100, 1));
        assert_eq!(book.best().unwrap().id, OrderId::new(2));
    }

    #[test]
    fn test_bid_book_remove() {
        let mut book = BidBook::new();
        book.insert(bid(1, 100, 1));
        assert!(book.remove(&BidKey::new(Price::from_u64(100), OrderId::new(1))).is_some());
        assert!(book.remove(&BidKey::new(Price::from_u64(100), OrderId::new(1))).is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn test_bid_book_depth_snapshot() {
        let mut book = BidBook::new();
        book.insert(bid(1, 50_000, 1));
        book.insert(bid(2, 51_000, 2));
        book.insert(bid(3, 51_000, 3));
        book.insert(bid(4, 52_000, 1));

        let depth = book.depth_snapshot(2);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0], (Price::from_u64(52_000), Quantity::from_u64(1)));
        assert_eq!(depth[1], (Price::from_u64(51_000), Quantity::from_u64(5)));
    }
}
