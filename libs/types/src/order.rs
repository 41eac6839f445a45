//! Order lifecycle types
//!
//! Orders move Created → Working → {PartiallyFilled}* → {Filled | Cancelled}.
//! Frozen margin travels with the order and is handed back fill by fill.

use crate::ids::{AccountId, OrderId, SymbolKey};
use crate::numeric::{Price, Quantity};
use crate::time::DateTimeMs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal places kept on a partial margin release
pub const MARGIN_DP: u32 = 12;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// +1 for buys, -1 for sells
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Allocated but not yet resting
    Created,
    /// Resting in the book, nothing filled
    Working,
    /// Resting in the book with some quantity filled
    PartiallyFilled,
    /// Completely filled (terminal)
    Filled,
    /// Cancelled or closed out (terminal)
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }

    /// True while the order may still receive fills
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Working | OrderStatus::PartiallyFilled)
    }
}

/// A limit order owned by one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account: AccountId,
    pub symbol: SymbolKey,
    pub ticker: String,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub filled: Quantity,
    pub remaining: Quantity,
    /// Protective stop on the filled quantity
    pub stop_loss: Option<Price>,
    /// Margin still reserved against the remaining quantity
    pub frozen_margin: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTimeMs,
    pub updated_at: DateTimeMs,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        account: AccountId,
        symbol: SymbolKey,
        ticker: impl Into<String>,
        side: Side,
        price: Price,
        quantity: Quantity,
        stop_loss: Option<Price>,
        timestamp: DateTimeMs,
    ) -> Self {
        Self {
            id,
            account,
            symbol,
            ticker: ticker.into(),
            side,
            price,
            quantity,
            filled: Quantity::zero(),
            remaining: quantity,
            stop_loss,
            frozen_margin: Decimal::ZERO,
            status: OrderStatus::Created,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Move a freshly created order into the book with its margin reserved
    ///
    /// # Panics
    /// Panics if the order is not in `Created`
    pub fn activate(&mut self, margin: Decimal) {
        assert_eq!(self.status, OrderStatus::Created, "Only created orders can be activated");
        self.frozen_margin = margin;
        self.status = OrderStatus::Working;
    }

    /// Quantity invariant: filled + remaining = total
    pub fn check_invariant(&self) -> bool {
        self.filled.as_decimal() + self.remaining.as_decimal() == self.quantity.as_decimal()
    }

    pub fn is_filled(&self) -> bool {
        self.filled == self.quantity
    }

    /// Margin to release for a fill of `qty`
    ///
    /// Proportional to the share of the remaining quantity, rounded to
    /// `MARGIN_DP` places so the subtraction from the frozen amount is exact.
    /// The final fill takes whatever is left.
    pub fn take_margin(&mut self, qty: Quantity) -> Decimal {
        if self.remaining.is_zero() {
            return Decimal::ZERO;
        }
        let released = if qty >= self.remaining {
            self.frozen_margin
        } else {
            (self.frozen_margin * qty.as_decimal() / self.remaining.as_decimal()).round_dp(MARGIN_DP)
        };
        self.frozen_margin -= released;
        released
    }

    /// Record a fill and adjust status
    ///
    /// # Panics
    /// Panics if the fill would exceed total quantity or the order is terminal
    pub fn add_fill(&mut self, qty: Quantity, timestamp: DateTimeMs) {
        assert!(!self.status.is_terminal(), "Cannot fill terminal order");
        let new_filled = self.filled + qty;
        assert!(new_filled <= self.quantity, "Fill would exceed order quantity");

        self.filled = new_filled;
        self.remaining = self.quantity.saturating_sub(new_filled);
        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = timestamp;

        assert!(self.check_invariant(), "Invariant violated after fill");
    }

    /// Cancel the order, returning the margin that was still frozen
    ///
    /// # Panics
    /// Panics if the order is already terminal
    pub fn cancel(&mut self, timestamp: DateTimeMs) -> Decimal {
        assert!(!self.status.is_terminal(), "Cannot cancel terminal order");
        self.status = OrderStatus::Cancelled;
        self.updated_at = timestamp;
        std::mem::take(&mut self.frozen_margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(qty: u64) -> Order {
        Order::new(
            OrderId::new(0),
            AccountId::new(0),
            SymbolKey::new(1),
            "ESZ8",
            Side::Buy,
            Price::from_u64(100),
            Quantity::from_u64(qty),
            None,
            DateTimeMs::new(1_000),
        )
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
        assert_eq!(Side::Sell.sign(), Decimal::NEGATIVE_ONE);
    }

    #[test]
    fn test_order_fill_sequence() {
        let mut o = order(10);
        o.activate(Decimal::from(100));
        assert_eq!(o.status, OrderStatus::Working);

        let released = o.take_margin(Quantity::from_u64(4));
        o.add_fill(Quantity::from_u64(4), DateTimeMs::new(2_000));
        assert_eq!(released, Decimal::from(40));
        assert_eq!(o.status, OrderStatus::PartiallyFilled);
        assert!(o.check_invariant());

        let released = o.take_margin(Quantity::from_u64(6));
        o.add_fill(Quantity::from_u64(6), DateTimeMs::new(3_000));
        assert_eq!(released, Decimal::from(60));
        assert_eq!(o.status, OrderStatus::Filled);
        assert!(o.frozen_margin.is_zero());
    }

    #[test]
    fn test_final_fill_takes_rounding_residue() {
        let mut o = order(3);
        o.activate(Decimal::from(10));
        let first = o.take_margin(Quantity::from_u64(1));
        o.add_fill(Quantity::from_u64(1), DateTimeMs::new(2));
        let second = o.take_margin(Quantity::from_u64(2));
        assert_eq!(first + second, Decimal::from(10));
    }

    #[test]
    fn test_partial_releases_leave_no_residue() {
        let mut o = order(26);
        o.activate(Decimal::from(29_695));
        let mut released = Decimal::ZERO;
        for (i, qty) in [7u64, 3, 11, 5].into_iter().enumerate() {
            let qty = Quantity::from_u64(qty);
            let part = o.take_margin(qty);
            assert!(part.scale() <= MARGIN_DP);
            released += part;
            o.add_fill(qty, DateTimeMs::new(i as i64));
        }
        assert_eq!(released, Decimal::from(29_695));
        assert!(o.frozen_margin.is_zero());
    }

    #[test]
    #[should_panic(expected = "Fill would exceed order quantity")]
    fn test_order_overfill_panics() {
        let mut o = order(1);
        o.activate(Decimal::ZERO);
        o.add_fill(Quantity::from_u64(2), DateTimeMs::new(2));
    }

    #[test]
    fn test_cancel_returns_margin() {
        let mut o = order(5);
        o.activate(Decimal::from(50));
        assert_eq!(o.cancel(DateTimeMs::new(5)), Decimal::from(50));
        assert!(o.status.is_terminal());
        assert!(!o.status.is_open());
    }

    #[test]
    #[should_panic(expected = "Cannot cancel terminal order")]
    fn test_cancel_terminal_panics() {
        let mut o = order(1);
        o.activate(Decimal::ZERO);
        o.add_fill(Quantity::from_u64(1), DateTimeMs::new(2));
        o.cancel(DateTimeMs::new(3));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn released_margin_sums_to_frozen(
                fills in prop::collection::vec(1u64..20, 1..8),
                margin in 0u64..1_000_000,
            ) {
                let total: u64 = fills.iter().sum();
                let mut o = order(total);
                o.activate(Decimal::from(margin));

                let mut released = Decimal::ZERO;
                for (i, qty) in fills.iter().enumerate() {
                    let qty = Quantity::from_u64(*qty);
                    released += o.take_margin(qty);
                    o.add_fill(qty, DateTimeMs::new(i as i64));
                }
                prop_assert_eq!(released, Decimal::from(margin));
                prop_assert_eq!(o.status, OrderStatus::Filled);
            }
        }
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&OrderStatus::PartiallyFilled).unwrap();
        assert_eq!(json, "\"PARTIALLY_FILLED\"");
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
    }
}
