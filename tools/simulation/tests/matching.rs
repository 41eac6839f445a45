//! Order execution against replayed ticks
//!
//! Each test loads hand-written ticks, opens one session and drives the
//! clock explicitly, so every fill can be checked by price and quantity.

use std::str::FromStr;
use std::sync::Arc;

use market_data::{InMemoryCatalog, MemoryStore, Universe};
use matching_engine::{Fill, FillKind};
use rust_decimal::Decimal;
use simulation::{Broker, BrokerEvent, BrokerRegistry, SimConfig, SimWorld, SIM_BROKER};
use types::errors::RejectReason;
use types::ids::{AccountId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{OrderStatus, Side};
use types::symbol::SymbolSpec;
use types::tick::{Tick, TickFx};
use types::time::DateTimeMs;

struct Harness {
    world: Arc<SimWorld>,
    broker: Box<dyn Broker>,
    events: flume::Receiver<BrokerEvent>,
}

impl Harness {
    fn fills(&self) -> Vec<Fill> {
        self.events
            .drain()
            .filter_map(|e| match e {
                BrokerEvent::OrderFilled { fill, .. } => Some(fill),
                _ => None,
            })
            .collect()
    }

    fn advance(&self, t: i64) {
        self.world.advance_to(DateTimeMs::new(t)).unwrap();
    }
}

fn px(s: &str) -> Price {
    Price::from_str(s).unwrap()
}

fn qty(n: u64) -> Quantity {
    Quantity::from_u64(n)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn trade(t: i64, last: &str, volume: u64) -> Tick {
    Tick { time: DateTimeMs::new(t), last: px(last), volume }
}

fn quote(t: i64, bid: &str, ask: &str) -> TickFx {
    TickFx { time: DateTimeMs::new(t), bid: px(bid), ask: px(ask) }
}

/// Started world with `ESZ8` trade ticks, `EURUSD` quotes and an untradable `NODATA`
fn harness(es: Vec<Tick>, fx: Vec<TickFx>) -> Harness {
    let catalog = InMemoryCatalog::new();
    catalog.register(SymbolSpec::new("ESZ8", false));
    catalog.register(SymbolSpec::new("EURUSD", true).with_spread(px("0.0002")));
    catalog.register(SymbolSpec::new("NODATA", false));

    let store = MemoryStore::new();
    store.insert_ticks("ESZ8", es);
    store.insert_ticks_fx("EURUSD", fx);

    let universe = Universe::from_reader("ESZ8,t\nEURUSD,t\nNODATA,t\n".as_bytes()).unwrap();
    let world = Arc::new(SimWorld::new(SimConfig::default(), Arc::new(catalog), Arc::new(store), universe));
    let registry = BrokerRegistry::with_simulated(Arc::clone(&world));
    let (tx, events) = flume::bounded(256);
    let broker = registry.open(SIM_BROKER, tx).unwrap();
    broker.start().unwrap();
    Harness { world, broker, events }
}

#[test]
fn test_limit_buy_fills_against_volume() {
    let h = harness(vec![trade(1000, "101", 10), trade(2000, "100", 3), trade(3000, "99", 10)], vec![]);
    let id = h.broker.submit_order("ESZ8", Side::Buy, qty(5), px("100"), None).unwrap();
    assert_eq!(h.broker.cash(), dec("99950"));

    h.advance(1000);
    assert!(h.fills().is_empty());
    assert_eq!(h.broker.order(id).unwrap().status, OrderStatus::Working);

    h.advance(2000);
    let fills = h.fills();
    assert_eq!(fills.len(), 1);
    assert_eq!((fills[0].price, fills[0].quantity), (px("100"), qty(3)));
    let order = h.broker.order(id).unwrap();
    assert_eq!(order.status, OrderStatus::PartiallyFilled);
    assert_eq!(order.remaining, qty(2));
    assert_eq!(order.frozen_margin, dec("20"));

    h.advance(3000);
    let fills = h.fills();
    assert_eq!((fills[0].price, fills[0].quantity), (px("99"), qty(2)));
    assert_eq!(h.broker.order(id).unwrap().status, OrderStatus::Filled);

    let pos = h.broker.position("ESZ8").unwrap();
    assert_eq!(pos.quantity, dec("5"));
    assert_eq!(pos.avg_price, px("99.6"));
    assert_eq!(h.broker.balance(), dec("100000"));
    assert_eq!(h.broker.equity(), dec("99997"));
    assert_eq!(h.broker.free_margin(), dec("99997"));
    assert_eq!(h.broker.time_current(), DateTimeMs::new(3000));
}

#[test]
fn test_partial_fill_keeps_priority() {
    let h = harness(vec![trade(1000, "100", 8), trade(2000, "100", 1)], vec![]);
    let a = h.broker.submit_order("ESZ8", Side::Buy, qty(5), px("100"), None).unwrap();
    let b = h.broker.submit_order("ESZ8", Side::Buy, qty(5), px("100"), None).unwrap();
    let c = h.broker.submit_order("ESZ8", Side::Buy, qty(2), px("101"), None).unwrap();
    assert_eq!(h.world.depth("ESZ8", Side::Buy, 5), vec![(px("101"), qty(2)), (px("100"), qty(10))]);
    assert_eq!(h.world.depth("ESZ8", Side::Buy, 1), vec![(px("101"), qty(2))]);
    assert!(h.world.depth("ESZ8", Side::Sell, 5).is_empty());

    h.advance(1000);
    let order: Vec<(OrderId, Quantity)> = h.fills().iter().map(|f| (f.order_id, f.quantity)).collect();
    assert_eq!(order, vec![(c, qty(2)), (a, qty(5)), (b, qty(1))]);
    assert_eq!(h.world.depth("ESZ8", Side::Buy, 5), vec![(px("100"), qty(4))]);

    h.advance(2000);
    let fills = h.fills();
    assert_eq!(fills.len(), 1);
    assert_eq!(fills[0].order_id, b);
    assert_eq!(h.broker.order(b).unwrap().remaining, qty(3));
}

#[test]
fn test_sell_limit_needs_price_at_or_above() {
    let h = harness(vec![trade(1000, "99", 10), trade(2000, "102", 10)], vec![]);
    h.broker.submit_order("ESZ8", Side::Sell, qty(1), px("100"), None).unwrap();

    h.advance(1000);
    assert!(h.fills().is_empty());
    h.advance(2000);
    let fills = h.fills();
    assert_eq!(fills[0].price, px("102"));
    assert_eq!(h.broker.position("ESZ8").unwrap().quantity, dec("-1"));
}

#[test]
fn test_fx_quotes_fill_in_full_at_ask() {
    let h = harness(vec![], vec![quote(1000, "1.1000", "1.1002"), quote(2000, "1.0990", "1.0992")]);
    let id = h.broker.submit_order("EURUSD", Side::Buy, qty(100_000), px("1.0995"), None).unwrap();

    h.advance(1000);
    assert!(h.fills().is_empty());
    h.advance(2000);
    let fills = h.fills();
    assert_eq!(fills.len(), 1);
    assert_eq!((fills[0].price, fills[0].quantity), (px("1.0992"), qty(100_000)));
    assert_eq!(h.broker.order(id).unwrap().status, OrderStatus::Filled);
}

#[test]
fn test_cancel_releases_margin() {
    let h = harness(vec![trade(1000, "100", 2), trade(2000, "100", 10)], vec![]);
    let id = h.broker.submit_order("ESZ8", Side::Buy, qty(10), px("100"), None).unwrap();
    h.advance(1000);
    h.fills();

    h.broker.cancel_order(id);
    let order = h.broker.order(id).unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.frozen_margin, Decimal::ZERO);
    assert_eq!(h.broker.cash(), h.broker.balance());
    assert!(matches!(
        h.events.try_recv().unwrap(),
        BrokerEvent::OrderCancelled { unfilled, .. } if unfilled == qty(8)
    ));

    // Gone from the book: the next tick fills nothing
    h.advance(2000);
    assert!(h.fills().is_empty());

    // Terminal: second cancel is silent
    h.broker.cancel_order(id);
    assert!(h.events.try_recv().is_err());
}

#[test]
fn test_close_fills_at_market() {
    let h = harness(vec![trade(1000, "100", 10)], vec![]);
    let id = h.broker.submit_order("ESZ8", Side::Buy, qty(2), px("90"), Some(px("80"))).unwrap();

    // No print yet, nothing to close against
    h.broker.close_order(id);
    assert_eq!(h.broker.order(id).unwrap().status, OrderStatus::Working);

    h.advance(1000);
    h.broker.close_order(id);
    let fills = h.fills();
    assert_eq!(fills.len(), 1);
    assert_eq!(fills[0].kind, FillKind::Close);
    assert_eq!((fills[0].price, fills[0].quantity), (px("100"), qty(2)));

    let order = h.broker.order(id).unwrap();
    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(h.broker.cash(), h.broker.balance());
    assert_eq!(h.world.stats().fills, 1);
}

#[test]
fn test_stop_loss_closes_position() {
    let h = harness(
        vec![trade(1000, "100", 4), trade(2000, "97", 1), trade(3000, "95", 1)],
        vec![],
    );
    let id = h.broker.submit_order("ESZ8", Side::Buy, qty(4), px("100"), Some(px("95"))).unwrap();

    h.advance(2000);
    assert_eq!(h.fills().len(), 1);
    assert_eq!(h.broker.position("ESZ8").unwrap().quantity, dec("4"));

    h.advance(3000);
    let fills = h.fills();
    assert_eq!(fills.len(), 1);
    assert_eq!(fills[0].kind, FillKind::StopLoss);
    assert_eq!(fills[0].side, Side::Sell);
    assert_eq!((fills[0].price, fills[0].quantity), (px("95"), qty(4)));

    assert!(h.broker.position("ESZ8").is_none());
    assert_eq!(h.broker.balance(), dec("99980"));
    assert_eq!(h.broker.order(id).unwrap().stop_loss, None);
    let stats = h.world.account_stats(AccountId::new(0)).unwrap();
    assert_eq!((stats.trades, stats.loss_trades, stats.loss), (2, 1, dec("20")));
}

#[test]
fn test_stop_loss_cancels_unfilled_remainder() {
    let h = harness(vec![trade(1000, "100", 4), trade(2000, "94", 0)], vec![]);
    let id = h.broker.submit_order("ESZ8", Side::Buy, qty(10), px("100"), Some(px("95"))).unwrap();

    h.advance(2000);
    let events: Vec<BrokerEvent> = h.events.drain().collect();
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[1], BrokerEvent::OrderFilled { fill, realized_pnl }
        if fill.kind == FillKind::StopLoss && fill.quantity == qty(4) && *realized_pnl == dec("-24")));
    assert!(matches!(&events[2], BrokerEvent::OrderCancelled { unfilled, .. } if *unfilled == qty(6)));

    let order = h.broker.order(id).unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.filled, qty(4));
    assert_eq!(h.broker.cash(), h.broker.balance());
}

#[test]
fn test_rejections_allocate_no_id() {
    let h = harness(vec![trade(1000, "100", 1)], vec![]);
    let reject = |ticker: &str, q: u64, p: &str| h.broker.submit_order(ticker, Side::Buy, qty(q), px(p), None).unwrap_err();

    assert_eq!(reject("NOPE", 1, "100"), RejectReason::SymbolNotFound);
    assert_eq!(reject("NODATA", 1, "100"), RejectReason::NotTradable);
    assert_eq!(reject("ESZ8", 0, "100"), RejectReason::InvalidQuantity);
    assert_eq!(reject("ESZ8", 1, "0"), RejectReason::InvalidPrice);

    let id = h.broker.submit_order("ESZ8", Side::Buy, qty(1), px("100"), None).unwrap();
    assert_eq!(id, OrderId::new(0));
    assert_eq!(h.broker.orders(), vec![id]);
    // NODATA, plus EURUSD which has no quotes in this run
    assert_eq!(h.world.load_report().rejected, 2);
    assert_eq!(h.world.load_report().loaded, 1);
}

#[test]
fn test_orders_private_to_session() {
    let h = harness(vec![trade(1000, "100", 1)], vec![]);
    let id = h.broker.submit_order("ESZ8", Side::Buy, qty(1), px("99"), None).unwrap();

    let registry = BrokerRegistry::with_simulated(Arc::clone(&h.world));
    let (tx, _rx) = flume::bounded(8);
    let other = registry.open(SIM_BROKER, tx).unwrap();

    assert!(other.order(id).is_none());
    other.cancel_order(id);
    assert_eq!(h.broker.order(id).unwrap().status, OrderStatus::Working);
}

#[test]
fn test_stop_cancels_working_orders() {
    let h = harness(vec![trade(1000, "100", 1)], vec![]);
    let id = h.broker.submit_order("ESZ8", Side::Buy, qty(1), px("99"), None).unwrap();
    h.broker.stop().unwrap();

    assert_eq!(h.broker.order(id).unwrap().status, OrderStatus::Cancelled);
    assert_eq!(h.broker.cash(), h.broker.balance());
    assert_eq!(
        h.broker.submit_order("ESZ8", Side::Buy, qty(1), px("99"), None),
        Err(RejectReason::NotRunning)
    );
}
