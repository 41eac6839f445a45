//! Net position per symbol
//!
//! Signed quantity: positive is long, negative is short. Same-direction fills
//! average into the entry price; opposite fills realize P&L against it and any
//! excess opens a new position at the fill price.

use crate::ids::SymbolKey;
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: SymbolKey,
    pub ticker: String,
    pub quantity: Decimal,
    pub avg_price: Price,
    pub realized_pnl: Decimal,
    pub mark_price: Price,
}

impl Position {
    pub fn new(symbol: SymbolKey, ticker: impl Into<String>) -> Self {
        Self {
            symbol,
            ticker: ticker.into(),
            quantity: Decimal::ZERO,
            avg_price: Price::ZERO,
            realized_pnl: Decimal::ZERO,
            mark_price: Price::ZERO,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Apply a fill and return the P&L it realized
    pub fn apply_fill(&mut self, side: Side, qty: Quantity, price: Price) -> Decimal {
        let signed = side.sign() * qty.as_decimal();
        let prev = self.quantity;
        self.mark_price = price;

        if prev.is_zero() || prev.is_sign_positive() == signed.is_sign_positive() {
            let total = prev.abs() + signed.abs();
            if !total.is_zero() {
                let cost = self.avg_price.as_decimal() * prev.abs() + price.as_decimal() * signed.abs();
                self.avg_price = Price::new(cost / total);
            }
            self.quantity = prev + signed;
            return Decimal::ZERO;
        }

        let closed = signed.abs().min(prev.abs());
        let direction = if prev > Decimal::ZERO { Decimal::ONE } else { Decimal::NEGATIVE_ONE };
        let pnl = (price.as_decimal() - self.avg_price.as_decimal()) * closed * direction;
        self.realized_pnl += pnl;
        self.quantity = prev + signed;

        if self.quantity.is_zero() {
            self.avg_price = Price::ZERO;
        } else if self.quantity.is_sign_positive() != prev.is_sign_positive() {
            self.avg_price = price;
        }
        pnl
    }

    pub fn mark(&mut self, price: Price) {
        self.mark_price = price;
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        if self.is_flat() || self.mark_price.is_zero() {
            return Decimal::ZERO;
        }
        (self.mark_price.as_decimal() - self.avg_price.as_decimal()) * self.quantity
    }
}
