//! Account ledger
//!
//! One account per broker session. Balance moves only on realized P&L and
//! deposits; equity is balance plus the unrealized P&L of open positions;
//! margin is the sum reserved by working orders.
//!
//! Positions are kept in a small `Vec` and found by linear scan, which is
//! fine for the handful of symbols a single strategy trades.

use crate::ids::{AccountId, OrderId, SymbolKey};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use crate::position::Position;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountStats {
    /// Every fill counts as one trade
    pub trades: u64,
    pub win_trades: u64,
    pub loss_trades: u64,
    /// Gross realized profit
    pub profit: Decimal,
    /// Gross realized loss, as a positive amount
    pub loss: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub fund_start: Decimal,
    pub equity: Decimal,
    pub balance: Decimal,
    pub margin: Decimal,
    pub stats: AccountStats,
    pub orders: Vec<OrderId>,
    pub positions: Vec<Position>,
}

impl Account {
    pub fn new(id: AccountId, fund_start: Decimal) -> Self {
        Self {
            id,
            fund_start,
            equity: fund_start,
            balance: fund_start,
            margin: Decimal::ZERO,
            stats: AccountStats::default(),
            orders: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Balance not reserved by working orders
    pub fn cash(&self) -> Decimal {
        self.balance - self.margin
    }

    pub fn free_margin(&self) -> Decimal {
        self.equity - self.margin
    }

    pub fn deposit(&mut self, amount: Decimal) {
        self.balance += amount;
        self.equity += amount;
    }

    pub fn freeze_margin(&mut self, amount: Decimal) {
        self.margin += amount;
    }

    /// Release reserved margin, never below zero
    pub fn release_margin(&mut self, amount: Decimal) {
        self.margin = (self.margin - amount).max(Decimal::ZERO);
    }

    pub fn position(&self, symbol: SymbolKey) -> Option<&Position> {
        self.positions.iter().find(|p| p.symbol == symbol)
    }

    /// Book a fill against the position, returning the realized P&L
    pub fn apply_fill(
        &mut self,
        symbol: SymbolKey,
        ticker: &str,
        side: Side,
        qty: Quantity,
        price: Price,
    ) -> Decimal {
        let idx = match self.positions.iter().position(|p| p.symbol == symbol) {
            Some(idx) => idx,
            None => {
                self.positions.push(Position::new(symbol, ticker));
                self.positions.len() - 1
            }
        };
        let pnl = self.positions[idx].apply_fill(side, qty, price);
        if self.positions[idx].is_flat() {
            self.positions.swap_remove(idx);
        }

        self.balance += pnl;
        self.stats.trades += 1;
        if pnl > Decimal::ZERO {
            self.stats.win_trades += 1;
            self.stats.profit += pnl;
        } else if pnl < Decimal::ZERO {
            self.stats.loss_trades += 1;
            self.stats.loss -= pnl;
        }
        self.revalue();
        pnl
    }

    /// Mark open positions on `symbol` and recompute equity
    pub fn mark_to_market(&mut self, symbol: SymbolKey, price: Price) {
        let mut touched = false;
        for p in self.positions.iter_mut().filter(|p| p.symbol == symbol) {
            p.mark(price);
            touched = true;
        }
        if touched {
            self.revalue();
        }
    }

    fn revalue(&mut self) {
        let unrealized: Decimal = self.positions.iter().map(Position::unrealized_pnl).sum();
        self.equity = self.balance + unrealized;
    }
}
