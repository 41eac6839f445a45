//! Ask (sell-side) order book
//!
//! Sell orders sorted by price ascending, then by order id ascending.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};

use super::RestingOrder;

/// Priority key for asks: lowest price first, lower id on ties
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AskKey {
    price: Price,
    id: OrderId,
}

impl AskKey {
    pub fn new(price: Price, id: OrderId) -> Self {
        Self { price, id }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn id(&self) -> OrderId {
        self.id
    }
}

/// Ask (sell) side order book
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    orders: BTreeMap<AskKey, RestingOrder>,
}

impl AskBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, order: RestingOrder) {
        self.orders.insert(AskKey::new(order.price, order.id), order);
    }

    pub fn remove(&mut self, key: &AskKey) -> Option<RestingOrder> {
        self.orders.remove(key)
    }

    /// Lowest ask, earliest id on ties
    pub fn best(&self) -> Option<&RestingOrder> {
        self.orders.values().next()
    }

    pub(crate) fn get_mut(&mut self, key: &AskKey) -> Option<&mut RestingOrder> {
        self.orders.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RestingOrder> {
        self.orders.values()
    }

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

    fn ask(id: u64, price: u64) -> RestingOrder {
        RestingOrder {
            id: OrderId::new(id),
            account: AccountId::new(0),
            side: Side::Sell,
            price: Price::from_u64(price),
            remaining: Quantity::from_u64(1),
            stop_loss: None,
        }
    }

    #[test]
    fn test_ask_book_best_ask() {
        let mut book = AskBook::new();
        book.insert(ask(1, 51));
        book.insert(ask(2, 49));
        book.insert(ask(3, 50));
        assert_eq!(book.best().unwrap().price, Price::from_u64(49));
    }

    #[test]
    fn test_ask_book_same_price_lower_id_first() {
        let mut book = AskBook::new();
        book.insert(ask(5, 50));
        book.insert(ask(2, 50));
        let ids: Vec<_> = book.iter().map(|o| o.id.value()).collect();
        assert_eq!(ids, vec![2, 5]);
    }
}
