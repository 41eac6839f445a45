//! Order book infrastructure module
//!
//! Per-symbol bid and ask books plus the `OrderBook` that owns both sides.

pub mod bid_book;
pub mod ask_book;
pub mod order_book;

pub use ask_book::{AskBook, AskKey};
pub use bid_book::{BidBook, BidKey};
pub use order_book::OrderBook;

use serde::{Deserialize, Serialize};
use types::ids::{AccountId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

/// What the book keeps for a resting order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestingOrder {
    pub id: OrderId,
    pub account: AccountId,
    pub side: Side,
    pub price: Price,
    pub remaining: Quantity,
    pub stop_loss: Option<Price>,
}

impl From<&Order> for RestingOrder {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            account: order.account,
            side: order.side,
            price: order.price,
            remaining: order.remaining,
            stop_loss: order.stop_loss,
        }
    }
}
