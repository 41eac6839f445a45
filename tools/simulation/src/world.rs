//! Simulation world
//!
//! `SimWorld` owns everything simulated sessions share: replay cursors,
//! order books, the order table and the account table. A session is only an
//! account id plus an `Arc` to the world.
//!
//! Three locks guard the world and are always taken in the order
//! vm → orders → accounts. The lifecycle status lives in an atomic and is
//! read without any lock on the admission path.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use market_data::{Advance, BarCache, HistoricalStore, SimTicker, SymbolCatalog, Universe};
use matching_engine::{Fill, FillKind, MatchingEngine, RestingOrder};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use types::account::{Account, AccountStats};
use types::errors::{BrokerError, ConfigError, DataError, RejectReason, StateError};
use types::ids::{AccountId, OrderId, SymbolKey};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::position::Position;
use types::quote::Quotes;
use types::symbol::SymbolInfo;
use types::tick::TickValue;
use types::time::DateTimeMs;

use crate::broker::{BrokerEvent, QuoteSubscription};
use crate::config::SimConfig;
use crate::stats::{LoadReport, SimStats};
use crate::status::{AtomicStatus, VmStatus};

/// One account and the queue its session listens on
pub(crate) struct AccountSlot {
    pub account: Account,
    pub events: flume::Sender<BrokerEvent>,
}

/// Everything behind the vm lock
#[derive(Default)]
pub(crate) struct VmState {
    pub initialized: bool,
    pub load_passes: u32,
    /// Master sequences produced by the load pass
    pub tick_map: BTreeMap<SymbolKey, SimTicker>,
    /// Cursors for the current run, rebuilt by every start
    pub tick_run: BTreeMap<SymbolKey, SimTicker>,
    pub symbols: BTreeMap<SymbolKey, SymbolInfo>,
    pub subscriptions: BTreeMap<SymbolKey, QuoteSubscription>,
    pub engine: MatchingEngine,
    pub bars: BarCache,
    /// Last sample applied per symbol in this run
    pub market: BTreeMap<SymbolKey, TickValue>,
    /// Running trade volume per symbol in this run
    pub cum_volume: BTreeMap<SymbolKey, u64>,
    pub stats: SimStats,
    pub load_report: LoadReport,
}

/// Shared simulation state
pub struct SimWorld {
    pub(crate) config: SimConfig,
    pub(crate) catalog: Arc<dyn SymbolCatalog>,
    pub(crate) store: Arc<dyn HistoricalStore>,
    pub(crate) universe: Universe,
    pub(crate) status: AtomicStatus,
    clock: AtomicI64,
    pub(crate) vm: RwLock<VmState>,
    orders: RwLock<Vec<Order>>,
    accounts: RwLock<Vec<AccountSlot>>,
}

impl SimWorld {
    pub fn new(
        config: SimConfig,
        catalog: Arc<dyn SymbolCatalog>,
        store: Arc<dyn HistoricalStore>,
        universe: Universe,
    ) -> Self {
        Self {
            config,
            catalog,
            store,
            universe,
            status: AtomicStatus::default(),
            clock: AtomicI64::new(0),
            vm: RwLock::new(VmState::default()),
            orders: RwLock::new(Vec::new()),
            accounts: RwLock::new(Vec::new()),
        }
    }

    /// Build a world, reading the universe table named by `config`
    ///
    /// The table is required; a config without `universe_path` is an error.
    pub fn from_config(
        config: SimConfig,
        catalog: Arc<dyn SymbolCatalog>,
        store: Arc<dyn HistoricalStore>,
    ) -> Result<Self, ConfigError> {
        let path = config.universe_path.as_ref().ok_or(ConfigError::MissingUniverse)?;
        let universe = Universe::from_path(path)?;
        Ok(Self::new(config, catalog, store, universe))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn status(&self) -> VmStatus {
        self.status.load()
    }

    pub(crate) fn invalid_status(&self, operation: &'static str) -> StateError {
        StateError::InvalidStatus { operation, status: self.status.load().to_string() }
    }

    pub(crate) fn reset_clock(&self) {
        self.clock.store(0, Ordering::Release);
    }

    // ---- sessions ----

    /// Allocate an account bound to `events`
    pub fn open_account(&self, events: flume::Sender<BrokerEvent>) -> AccountId {
        let mut accounts = self.accounts.write();
        let id = AccountId::new(accounts.len() as u32);
        accounts.push(AccountSlot { account: Account::new(id, self.config.starting_fund), events });
        debug!(account = %id, fund = %self.config.starting_fund, "account opened");
        id
    }

    // ---- orders ----

    /// Admit a limit order
    ///
    /// No id is consumed when the order is rejected.
    pub fn submit_order(
        &self,
        account: AccountId,
        ticker: &str,
        side: Side,
        quantity: Quantity,
        price: Price,
        stop_loss: Option<Price>,
    ) -> Result<OrderId, RejectReason> {
        if self.status.load() != VmStatus::Running {
            return Err(RejectReason::NotRunning);
        }
        if quantity.is_zero() {
            return Err(RejectReason::InvalidQuantity);
        }
        if !price.is_positive() || stop_loss.is_some_and(|s| !s.is_positive()) {
            return Err(RejectReason::InvalidPrice);
        }
        let info = self.catalog.lookup(ticker).map_err(|_| RejectReason::SymbolNotFound)?;

        let mut guard = self.vm.write();
        let vm = &mut *guard;
        if self.status.load() != VmStatus::Running {
            return Err(RejectReason::NotRunning);
        }
        if !vm.tick_run.contains_key(&info.key) {
            return Err(RejectReason::NotTradable);
        }

        let mut orders = self.orders.write();
        let mut accounts = self.accounts.write();
        let slot = accounts.get_mut(account.index()).ok_or(RejectReason::UnknownAccount)?;

        let id = OrderId::new(orders.len() as u64);
        let mut order = Order::new(id, account, info.key, &info.ticker, side, price, quantity, stop_loss, self.time_current());
        let margin = price.as_decimal() * quantity.as_decimal() * self.config.margin_rate;
        order.activate(margin);
        slot.account.freeze_margin(margin);
        slot.account.orders.push(id);

        vm.engine.add_order(info.key, RestingOrder::from(&order));
        orders.push(order);
        vm.stats.orders_submitted += 1;

        debug!(order_id = %id, %account, ticker, ?side, %price, %quantity, %margin, "order accepted");
        Ok(id)
    }

    /// Pull an open order from the book; no-op for unknown, foreign or terminal ids
    pub fn cancel_order(&self, account: AccountId, id: OrderId) {
        let mut guard = self.vm.write();
        let vm = &mut *guard;
        let mut orders = self.orders.write();
        let Some(order) = orders.get_mut(id.index()) else {
            return;
        };
        if order.account != account || !order.status.is_open() {
            return;
        }

        vm.engine.cancel_order(order.symbol, id);
        let time = self.time_current();
        let unfilled = order.remaining;
        let released = order.cancel(time);
        vm.stats.orders_cancelled += 1;

        let mut accounts = self.accounts.write();
        if let Some(slot) = accounts.get_mut(account.index()) {
            slot.account.release_margin(released);
            notify(&mut vm.stats, &slot.events, BrokerEvent::OrderCancelled { order_id: id, unfilled, time });
        }
        debug!(order_id = %id, %unfilled, %released, "order cancelled");
    }

    /// Fill the open remainder of an order at the current market
    ///
    /// No-op for unknown, foreign or terminal ids, or before the symbol has
    /// printed in this run.
    pub fn close_order(&self, account: AccountId, id: OrderId) {
        let mut guard = self.vm.write();
        let vm = &mut *guard;
        let mut orders = self.orders.write();
        let Some(order) = orders.get(id.index()) else {
            return;
        };
        if order.account != account || !order.status.is_open() {
            return;
        }
        let (symbol, side) = (order.symbol, order.side);
        let Some(value) = vm.market.get(&symbol) else {
            debug!(order_id = %id, %symbol, "close skipped, no market price yet");
            return;
        };
        let price = match side {
            Side::Buy => value.buy_fill_price(),
            Side::Sell => value.sell_fill_price(),
        };

        let Some(fill) = vm.engine.close_order(symbol, id, price, self.time_current()) else {
            return;
        };
        let mut accounts = self.accounts.write();
        apply_fill(&mut vm.stats, &mut orders, &mut accounts, fill);
    }

    /// Cancel every open order, used when a run stops
    pub(crate) fn cancel_open_orders(&self, vm: &mut VmState) {
        let mut orders = self.orders.write();
        let mut accounts = self.accounts.write();
        let time = self.time_current();
        for order in orders.iter_mut().filter(|o| o.status.is_open()) {
            let unfilled = order.remaining;
            let released = order.cancel(time);
            vm.stats.orders_cancelled += 1;
            if let Some(slot) = accounts.get_mut(order.account.index()) {
                slot.account.release_margin(released);
                notify(&mut vm.stats, &slot.events, BrokerEvent::OrderCancelled { order_id: order.id, unfilled, time });
            }
        }
        vm.engine = MatchingEngine::new(vm.engine.sequence());
    }

    // ---- time ----

    /// Apply every pending sample stamped at or before `time`
    ///
    /// Samples from different symbols interleave by timestamp, ties broken by
    /// symbol key. Returns the number of samples applied.
    pub fn advance_to(&self, time: DateTimeMs) -> Result<usize, StateError> {
        let mut guard = self.vm.write();
        if self.status.load() != VmStatus::Running {
            return Err(self.invalid_status("advance"));
        }
        let vm = &mut *guard;
        let mut orders = self.orders.write();
        let mut accounts = self.accounts.write();

        let mut applied = 0;
        while let Some(key) = next_due(&vm.tick_run, Some(time)) {
            self.apply_next(vm, key, &mut orders, &mut accounts);
            applied += 1;
        }
        if time > self.time_current() {
            self.clock.store(time.as_millis(), Ordering::Release);
        }
        Ok(applied)
    }

    /// Apply the single earliest pending sample
    ///
    /// Returns its time, or `None` once every sequence is exhausted.
    pub fn step(&self) -> Result<Option<DateTimeMs>, StateError> {
        let mut guard = self.vm.write();
        if self.status.load() != VmStatus::Running {
            return Err(self.invalid_status("step"));
        }
        let vm = &mut *guard;
        let Some(key) = next_due(&vm.tick_run, None) else {
            return Ok(None);
        };
        let mut orders = self.orders.write();
        let mut accounts = self.accounts.write();
        Ok(Some(self.apply_next(vm, key, &mut orders, &mut accounts)))
    }

    fn apply_next(&self, vm: &mut VmState, key: SymbolKey, orders: &mut [Order], accounts: &mut [AccountSlot]) -> DateTimeMs {
        let Some(cursor) = vm.tick_run.get_mut(&key) else {
            return self.time_current();
        };
        let time = cursor.time();
        let value = cursor.tick_value();
        if cursor.advance() == Advance::End {
            debug!(symbol = %key, "tick sequence exhausted");
        }
        self.apply_tick(vm, key, time, value, orders, accounts);
        time
    }

    fn apply_tick(
        &self,
        vm: &mut VmState,
        key: SymbolKey,
        time: DateTimeMs,
        value: TickValue,
        orders: &mut [Order],
        accounts: &mut [AccountSlot],
    ) {
        if time > self.time_current() {
            self.clock.store(time.as_millis(), Ordering::Release);
        }
        vm.market.insert(key, value);

        if let Some(sub) = vm.subscriptions.get(&key) {
            let changed = match value {
                TickValue::Trade { last, volume } => {
                    let cum = vm.cum_volume.entry(key).or_insert(0);
                    *cum += volume;
                    sub.quotes.write().apply_last_sale(last, *cum)
                }
                TickValue::Quote { bid, ask } => {
                    sub.quotes.write().apply_bid_ask(bid, ask);
                    true
                }
            };
            if changed {
                for slot in accounts.iter() {
                    notify(&mut vm.stats, &slot.events, BrokerEvent::Quote { ticker: sub.ticker.clone(), time });
                }
            }
        }

        for fill in vm.engine.on_tick(key, &value, time) {
            apply_fill(&mut vm.stats, orders, accounts, fill);
        }

        let mark = value.mark_price();
        for slot in accounts.iter_mut() {
            slot.account.mark_to_market(key, mark);
        }
        vm.stats.ticks_applied += 1;
    }

    // ---- data ----

    /// Re-check the loaded sequence for `ticker`
    pub fn validate_ticks(&self, ticker: &str) -> Result<(), BrokerError> {
        let info = self.catalog.lookup(ticker)?;
        let vm = self.vm.read();
        let cursor = vm.tick_map.get(&info.key).ok_or(DataError::TickNotExist { ticker: info.ticker.clone() })?;
        Ok(cursor.validate()?)
    }

    /// Fresh cursor over the loaded sequence for `ticker`
    pub fn load_run_tick(&self, ticker: &str) -> Result<SimTicker, BrokerError> {
        let info = self.catalog.lookup(ticker)?;
        let vm = self.vm.read();
        let cursor = vm.tick_map.get(&info.key).ok_or(DataError::TickNotExist { ticker: info.ticker.clone() })?;
        Ok(cursor.rewound())
    }

    pub fn quotes(&self, ticker: &str) -> Option<Quotes> {
        let info = self.catalog.lookup(ticker).ok()?;
        let quotes = self.catalog.quotes(info.key)?;
        let snapshot = quotes.read().clone();
        Some(snapshot)
    }

    /// Resting book depth for `ticker`, best `levels` prices first
    pub fn depth(&self, ticker: &str, side: Side, levels: usize) -> Vec<(Price, Quantity)> {
        let Ok(info) = self.catalog.lookup(ticker) else {
            return Vec::new();
        };
        let vm = self.vm.read();
        vm.engine.book(info.key).map(|book| book.depth(side, levels)).unwrap_or_default()
    }

    // ---- accounts ----

    fn with_account<T>(&self, account: AccountId, f: impl FnOnce(&Account) -> T) -> Option<T> {
        self.accounts.read().get(account.index()).map(|slot| f(&slot.account))
    }

    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.orders.read().get(id.index()).cloned()
    }

    pub fn account_orders(&self, account: AccountId) -> Vec<OrderId> {
        self.with_account(account, |a| a.orders.clone()).unwrap_or_default()
    }

    pub fn position(&self, account: AccountId, ticker: &str) -> Option<Position> {
        let key = self.catalog.lookup(ticker).ok()?.key;
        self.with_account(account, |a| a.position(key).cloned()).flatten()
    }

    pub fn positions(&self, account: AccountId) -> Vec<Position> {
        self.with_account(account, |a| a.positions.clone()).unwrap_or_default()
    }

    pub fn equity(&self, account: AccountId) -> Decimal {
        self.with_account(account, |a| a.equity).unwrap_or_default()
    }

    pub fn balance(&self, account: AccountId) -> Decimal {
        self.with_account(account, |a| a.balance).unwrap_or_default()
    }

    pub fn cash(&self, account: AccountId) -> Decimal {
        self.with_account(account, Account::cash).unwrap_or_default()
    }

    pub fn free_margin(&self, account: AccountId) -> Decimal {
        self.with_account(account, Account::free_margin).unwrap_or_default()
    }

    pub fn account_stats(&self, account: AccountId) -> Option<AccountStats> {
        self.with_account(account, |a| a.stats.clone())
    }

    /// Add funds; false for an unknown account
    pub fn deposit(&self, account: AccountId, amount: Decimal) -> bool {
        let mut accounts = self.accounts.write();
        match accounts.get_mut(account.index()) {
            Some(slot) => {
                slot.account.deposit(amount);
                true
            }
            None => false,
        }
    }

    // ---- run info ----

    pub fn time_current(&self) -> DateTimeMs {
        DateTimeMs::new(self.clock.load(Ordering::Acquire))
    }

    pub fn stats(&self) -> SimStats {
        self.vm.read().stats.clone()
    }

    pub fn load_report(&self) -> LoadReport {
        self.vm.read().load_report.clone()
    }

    /// How many times the data load ran; at most once per world
    pub fn load_passes(&self) -> u32 {
        self.vm.read().load_passes
    }

    /// Tickers with a replayable sequence
    pub fn tradable(&self) -> Vec<String> {
        self.vm.read().symbols.values().map(|s| s.ticker.clone()).collect()
    }
}

/// Earliest pending symbol, optionally bounded by `limit`
fn next_due(run: &BTreeMap<SymbolKey, SimTicker>, limit: Option<DateTimeMs>) -> Option<SymbolKey> {
    run.iter()
        .filter(|(_, cursor)| !cursor.is_exhausted())
        .map(|(key, cursor)| (cursor.time(), *key))
        .filter(|(time, _)| limit.map_or(true, |l| *time <= l))
        .min()
        .map(|(_, key)| key)
}

/// Book one fill against its order and account, then tell the session
fn apply_fill(stats: &mut SimStats, orders: &mut [Order], accounts: &mut [AccountSlot], fill: Fill) {
    let Some(order) = orders.get_mut(fill.order_id.index()) else {
        warn!(order_id = %fill.order_id, "fill for unknown order dropped");
        return;
    };
    let Some(slot) = accounts.get_mut(fill.account.index()) else {
        warn!(account = %fill.account, "fill for unknown account dropped");
        return;
    };

    let kind = fill.kind;
    match kind {
        FillKind::Limit | FillKind::Close => {
            let released = order.take_margin(fill.quantity);
            order.add_fill(fill.quantity, fill.timestamp);
            slot.account.release_margin(released);
        }
        FillKind::StopLoss => {
            order.stop_loss = None;
            stats.stop_losses += 1;
        }
    }
    let realized_pnl = slot.account.apply_fill(fill.symbol, &order.ticker, fill.side, fill.quantity, fill.price);
    stats.fills += 1;
    debug!(
        order_id = %fill.order_id,
        kind = ?kind,
        side = ?fill.side,
        price = %fill.price,
        quantity = %fill.quantity,
        %realized_pnl,
        "fill booked"
    );

    let (order_id, time) = (fill.order_id, fill.timestamp);
    notify(stats, &slot.events, BrokerEvent::OrderFilled { fill, realized_pnl });

    // Stopped orders stop working
    if kind == FillKind::StopLoss && order.status.is_open() {
        let unfilled = order.remaining;
        let released = order.cancel(time);
        slot.account.release_margin(released);
        stats.orders_cancelled += 1;
        notify(stats, &slot.events, BrokerEvent::OrderCancelled { order_id, unfilled, time });
    }
}

/// Queue an event without blocking
fn notify(stats: &mut SimStats, events: &flume::Sender<BrokerEvent>, event: BrokerEvent) {
    match events.try_send(event) {
        Ok(()) => {}
        Err(flume::TrySendError::Full(_)) => {
            stats.events_dropped += 1;
            warn!("session event queue full, event dropped");
        }
        Err(flume::TrySendError::Disconnected(_)) => {}
    }
}
