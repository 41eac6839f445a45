//! Lifecycle transitions
//!
//! ```text
//!  Idle ──start──► Start ──► Running ──stop──► Stopping ──► Idle
//! ```
//!
//! Each transition checks the atomic status, takes the vm lock, then checks
//! again, so two racing calls resolve to a single transition.

use tracing::{info, warn};
use types::errors::StateError;
use types::quote::Quotes;

use crate::broker::QuoteSubscription;
use crate::stats::SimStats;
use crate::status::VmStatus;
use crate::world::SimWorld;

/// What a transition request should do given the current status
enum Gate {
    Proceed,
    AlreadyThere,
}

impl SimWorld {
    fn start_gate(&self) -> Result<Gate, StateError> {
        match self.status.load() {
            VmStatus::Idle => Ok(Gate::Proceed),
            VmStatus::Start | VmStatus::Running => Ok(Gate::AlreadyThere),
            VmStatus::Stopping => Err(self.invalid_status("start")),
        }
    }

    fn stop_gate(&self) -> Result<Gate, StateError> {
        match self.status.load() {
            VmStatus::Running => Ok(Gate::Proceed),
            VmStatus::Idle | VmStatus::Stopping => Ok(Gate::AlreadyThere),
            VmStatus::Start => Err(self.invalid_status("stop")),
        }
    }

    /// Wait out a start held by another caller
    ///
    /// The loading caller keeps the vm write lock until the world is
    /// Running, so a read lock returns once that start has finished.
    fn await_running(&self) -> Result<(), StateError> {
        let _vm = self.vm.read();
        match self.status.load() {
            VmStatus::Running => Ok(()),
            _ => Err(self.invalid_status("start")),
        }
    }

    /// Begin a run
    ///
    /// The first start of a world loads or forges every universe symbol;
    /// later starts only rewind the cursors. Starting a running world is a
    /// no-op, and a start racing another one returns once the world is
    /// Running.
    pub fn start(&self) -> Result<(), StateError> {
        if let Gate::AlreadyThere = self.start_gate()? {
            return self.await_running();
        }
        let mut guard = self.vm.write();
        if let Gate::AlreadyThere = self.start_gate()? {
            return Ok(());
        }
        let vm = &mut *guard;

        self.status.store(VmStatus::Start);
        vm.stats = SimStats::default();
        if !vm.initialized {
            vm.load_report = self.load_universe(vm);
            vm.initialized = true;
            vm.load_passes += 1;
        }

        vm.tick_run = vm.tick_map.iter().map(|(key, cursor)| (*key, cursor.rewound())).collect();
        vm.market.clear();
        vm.cum_volume.clear();
        for sub in vm.subscriptions.values() {
            *sub.quotes.write() = Quotes::default();
        }
        self.reset_clock();

        self.status.store(VmStatus::Running);
        info!(symbols = vm.tick_run.len(), subscriptions = vm.subscriptions.len(), "simulation running");
        Ok(())
    }

    /// End the run, cancelling every open order
    pub fn stop(&self) -> Result<(), StateError> {
        if let Gate::AlreadyThere = self.stop_gate()? {
            return Ok(());
        }
        let mut guard = self.vm.write();
        if let Gate::AlreadyThere = self.stop_gate()? {
            return Ok(());
        }
        let vm = &mut *guard;

        self.status.store(VmStatus::Stopping);
        self.cancel_open_orders(vm);
        vm.tick_run.clear();

        self.status.store(VmStatus::Idle);
        info!(
            ticks = vm.stats.ticks_applied,
            fills = vm.stats.fills,
            dropped = vm.stats.events_dropped,
            "simulation stopped"
        );
        Ok(())
    }

    /// Register quote updates for `tickers`
    ///
    /// Only allowed while idle. Unknown tickers are skipped; a symbol keeps
    /// its first subscription.
    pub fn subscribe_quotes(&self, tickers: &[&str]) -> Result<Vec<QuoteSubscription>, StateError> {
        if self.status.load() != VmStatus::Idle {
            return Err(self.invalid_status("subscribe"));
        }
        let mut vm = self.vm.write();
        if self.status.load() != VmStatus::Idle {
            return Err(self.invalid_status("subscribe"));
        }

        let mut subscribed = Vec::with_capacity(tickers.len());
        for &ticker in tickers {
            let info = match self.catalog.lookup(ticker) {
                Ok(info) => info,
                Err(e) => {
                    warn!(ticker, error = %e, "subscription skipped");
                    continue;
                }
            };
            let Some(quotes) = self.catalog.quotes(info.key) else {
                warn!(ticker, "subscription skipped, no quote snapshot");
                continue;
            };
            let sub = vm
                .subscriptions
                .entry(info.key)
                .or_insert_with(|| QuoteSubscription { ticker: info.ticker.clone(), key: info.key, quotes });
            subscribed.push(sub.clone());
        }
        Ok(subscribed)
    }
}
