//! Fill execution
//!
//! Walks one side of a book in priority order against an incoming market
//! sample and produces fills. Partial fills keep their slot in the book.

use types::ids::{AccountId, OrderId, SymbolKey};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::tick::TickValue;
use types::time::DateTimeMs;

use crate::book::{OrderBook, RestingOrder};
use crate::events::{Fill, FillKind};
use crate::matching::crossing;

/// Sequenced fill generator
#[derive(Debug, Clone)]
pub struct MatchExecutor {
    sequence_counter: u64,
}

impl MatchExecutor {
    pub fn new(starting_sequence: u64) -> Self {
        Self {
            sequence_counter: starting_sequence,
        }
    }

    /// Next sequence number (monotonically increasing)
    fn next_sequence(&mut self) -> u64 {
        let seq = self.sequence_counter;
        self.sequence_counter += 1;
        seq
    }

    pub fn sequence(&self) -> u64 {
        self.sequence_counter
    }

    /// Fill resting orders on `side` that `value` crosses
    ///
    /// `available` is the liquidity left on the sample; `None` means
    /// unlimited. It is decremented by every fill.
    pub fn sweep(
        &mut self,
        book: &mut OrderBook,
        symbol: SymbolKey,
        side: Side,
        value: &TickValue,
        available: &mut Option<Quantity>,
        timestamp: DateTimeMs,
    ) -> Vec<Fill> {
        let market = match side {
            Side::Buy => value.buy_fill_price(),
            Side::Sell => value.sell_fill_price(),
        };
        let mut fills = Vec::new();

        while let Some(best) = book.peek_best(side) {
            if !crossing::crosses(side, best.price, market) {
                break;
            }
            let qty = match available {
                Some(left) if left.is_zero() => break,
                Some(left) => best.remaining.min(*left),
                None => best.remaining,
            };
            let (id, account, remaining) = (best.id, best.account, best.remaining.saturating_sub(qty));

            if remaining.is_zero() {
                book.remove(id);
            } else {
                book.update_remaining(id, remaining);
            }
            if let Some(left) = available.as_mut() {
                *left = left.saturating_sub(qty);
            }

            fills.push(Fill {
                sequence: self.next_sequence(),
                order_id: id,
                account,
                symbol,
                side,
                price: market,
                quantity: qty,
                remaining,
                kind: FillKind::Limit,
                timestamp,
            });
        }
        fills
    }

    /// Fill the whole remaining quantity of `order` at `price`
    pub fn fill_out(
        &mut self,
        order: &RestingOrder,
        symbol: SymbolKey,
        price: Price,
        kind: FillKind,
        timestamp: DateTimeMs,
    ) -> Fill {
        Fill {
            sequence: self.next_sequence(),
            order_id: order.id,
            account: order.account,
            symbol,
            side: order.side,
            price,
            quantity: order.remaining,
            remaining: Quantity::zero(),
            kind,
            timestamp,
        }
    }

    /// Exit fill for a triggered stop
    #[allow(clippy::too_many_arguments)]
    pub fn stop_fill(
        &mut self,
        order_id: OrderId,
        account: AccountId,
        symbol: SymbolKey,
        exit_side: Side,
        quantity: Quantity,
        price: Price,
        timestamp: DateTimeMs,
    ) -> Fill {
        Fill {
            sequence: self.next_sequence(),
            order_id,
            account,
            symbol,
            side: exit_side,
            price,
            quantity,
            remaining: Quantity::zero(),
            kind: FillKind::StopLoss,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYM: SymbolKey = SymbolKey::new(1);

    fn resting(id: u64, side: Side, price: u64, qty: u64) -> RestingOrder {
        RestingOrder {
            id: OrderId::new(id),
            account: AccountId::new(0),
            side,
            price: Price::from_u64(price),
            remaining: Quantity::from_u64(qty),
            stop_loss: None,
        }
    }

    #[test]
    fn test_sweep_consumes_volume_in_priority() {
        let mut book = OrderBook::new();
        book.insert(resting(1, Side::Buy, 101, 5));
        book.insert(resting(2, Side::Buy, 102, 5));
        book.insert(resting(3, Side::Buy, 99, 5));

        let mut exec = MatchExecutor::new(10);
        let value = TickValue::Trade { last: Price::from_u64(100), volume: 7 };
        let mut available = value.available();
        let fills = exec.sweep(&mut book, SYM, Side::Buy, &value, &mut available, DateTimeMs::new(1));

        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].order_id, OrderId::new(2));
        assert_eq!(fills[0].quantity, Quantity::from_u64(5));
        assert_eq!(fills[0].sequence, 10);
        assert_eq!(fills[1].order_id, OrderId::new(1));
        assert_eq!(fills[1].quantity, Quantity::from_u64(2));
        assert_eq!(fills[1].remaining, Quantity::from_u64(3));
        assert_eq!(fills[1].price, Price::from_u64(100));
        assert!(available.unwrap().is_zero());

        // partially filled order keeps the top slot
        assert_eq!(book.peek_best(Side::Buy).unwrap().id, OrderId::new(1));
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_sweep_quote_fills_in_full() {
        let mut book = OrderBook::new();
        book.insert(resting(1, Side::Sell, 110, 1_000_000));

        let mut exec = MatchExecutor::new(0);
        let value = TickValue::Quote { bid: Price::from_u64(111), ask: Price::from_u64(112) };
        let mut available = value.available();
        let fills = exec.sweep(&mut book, SYM, Side::Sell, &value, &mut available, DateTimeMs::new(1));

        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].quantity, Quantity::from_u64(1_000_000));
        assert_eq!(fills[0].price, Price::from_u64(111));
        assert!(book.is_empty());
    }

    #[test]
    fn test_sweep_stops_at_first_uncrossed() {
        let mut book = OrderBook::new();
        book.insert(resting(1, Side::Buy, 99, 1));
        let mut exec = MatchExecutor::new(0);
        let value = TickValue::Quote { bid: Price::from_u64(99), ask: Price::from_u64(100) };
        let fills = exec.sweep(&mut book, SYM, Side::Buy, &value, &mut None, DateTimeMs::new(1));
        assert!(fills.is_empty());
        assert_eq!(exec.sequence(), 0);
    }
}
