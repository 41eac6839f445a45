//! Broker facade
//!
//! `Broker` is the capability surface a strategy trades through, identical
//! for live and simulated connections. `SimBroker` is one session on a
//! shared `SimWorld`; each session owns exactly one account.

use std::sync::Arc;

use matching_engine::Fill;
use market_data::SharedQuotes;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::{BrokerError, RejectReason};
use types::ids::{AccountId, OrderId, SymbolKey};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::position::Position;
use types::quote::Quotes;
use types::time::DateTimeMs;

use crate::world::SimWorld;

/// Outbound notifications for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum BrokerEvent {
    /// A subscribed symbol's quotes changed
    Quote { ticker: String, time: DateTimeMs },
    /// One of the session's orders (or its stop) traded
    OrderFilled { fill: Fill, realized_pnl: Decimal },
    /// One of the session's orders left the book unfilled
    OrderCancelled { order_id: OrderId, unfilled: Quantity, time: DateTimeMs },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrokerKind {
    Live,
    Simulated,
}

/// Handle to a symbol's live quote snapshot
#[derive(Debug, Clone)]
pub struct QuoteSubscription {
    pub ticker: String,
    pub key: SymbolKey,
    pub quotes: SharedQuotes,
}

impl QuoteSubscription {
    pub fn snapshot(&self) -> Quotes {
        self.quotes.read().clone()
    }
}

/// Trading capability surface
pub trait Broker: Send + Sync {
    fn kind(&self) -> BrokerKind;

    fn start(&self) -> Result<(), BrokerError>;

    fn stop(&self) -> Result<(), BrokerError>;

    fn subscribe_quotes(&self, tickers: &[&str]) -> Result<Vec<QuoteSubscription>, BrokerError>;

    fn submit_order(
        &self,
        ticker: &str,
        side: Side,
        quantity: Quantity,
        price: Price,
        stop_loss: Option<Price>,
    ) -> Result<OrderId, RejectReason>;

    fn cancel_order(&self, id: OrderId);

    fn close_order(&self, id: OrderId);

    fn order(&self, id: OrderId) -> Option<Order>;

    fn orders(&self) -> Vec<OrderId>;

    fn position(&self, ticker: &str) -> Option<Position>;

    fn positions(&self) -> Vec<Position>;

    fn equity(&self) -> Decimal;

    fn balance(&self) -> Decimal;

    fn cash(&self) -> Decimal;

    fn free_margin(&self) -> Decimal;

    fn time_current(&self) -> DateTimeMs;
}

/// Opens sessions
pub trait BrokerFactory: Send + Sync {
    fn kind(&self) -> BrokerKind;

    /// Allocate a session bound to `events`; never blocks
    fn open(&self, events: flume::Sender<BrokerEvent>) -> Result<Box<dyn Broker>, BrokerError>;
}

/// One simulated session
#[derive(Clone)]
pub struct SimBroker {
    world: Arc<SimWorld>,
    account: AccountId,
}

impl SimBroker {
    pub fn new(world: Arc<SimWorld>, account: AccountId) -> Self {
        Self { world, account }
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn world(&self) -> &Arc<SimWorld> {
        &self.world
    }
}

impl Broker for SimBroker {
    fn kind(&self) -> BrokerKind {
        BrokerKind::Simulated
    }

    fn start(&self) -> Result<(), BrokerError> {
        Ok(self.world.start()?)
    }

    fn stop(&self) -> Result<(), BrokerError> {
        Ok(self.world.stop()?)
    }

    fn subscribe_quotes(&self, tickers: &[&str]) -> Result<Vec<QuoteSubscription>, BrokerError> {
        Ok(self.world.subscribe_quotes(tickers)?)
    }

    fn submit_order(
        &self,
        ticker: &str,
        side: Side,
        quantity: Quantity,
        price: Price,
        stop_loss: Option<Price>,
    ) -> Result<OrderId, RejectReason> {
        self.world.submit_order(self.account, ticker, side, quantity, price, stop_loss)
    }

    fn cancel_order(&self, id: OrderId) {
        self.world.cancel_order(self.account, id);
    }

    fn close_order(&self, id: OrderId) {
        self.world.close_order(self.account, id);
    }

    fn order(&self, id: OrderId) -> Option<Order> {
        self.world.order(id).filter(|o| o.account == self.account)
    }

    fn orders(&self) -> Vec<OrderId> {
        self.world.account_orders(self.account)
    }

    fn position(&self, ticker: &str) -> Option<Position> {
        self.world.position(self.account, ticker)
    }

    fn positions(&self) -> Vec<Position> {
        self.world.positions(self.account)
    }

    fn equity(&self) -> Decimal {
        self.world.equity(self.account)
    }

    fn balance(&self) -> Decimal {
        self.world.balance(self.account)
    }

    fn cash(&self) -> Decimal {
        self.world.cash(self.account)
    }

    fn free_margin(&self) -> Decimal {
        self.world.free_margin(self.account)
    }

    fn time_current(&self) -> DateTimeMs {
        self.world.time_current()
    }
}

/// Factory for sessions on one shared world
#[derive(Clone)]
pub struct SimBrokerFactory {
    world: Arc<SimWorld>,
}

impl SimBrokerFactory {
    pub fn new(world: Arc<SimWorld>) -> Self {
        Self { world }
    }
}

impl BrokerFactory for SimBrokerFactory {
    fn kind(&self) -> BrokerKind {
        BrokerKind::Simulated
    }

    fn open(&self, events: flume::Sender<BrokerEvent>) -> Result<Box<dyn Broker>, BrokerError> {
        let account = self.world.open_account(events);
        Ok(Box::new(SimBroker::new(Arc::clone(&self.world), account)))
    }
}
