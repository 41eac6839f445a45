//! One-time data preparation
//!
//! Runs inside the first `start()` under the vm lock. For every universe
//! row the requested bars are cached, then the symbol gets a tick sequence:
//! raw ticks when the row asks for them and the store has them, otherwise
//! ticks forged from the cached bars. Symbols that end up with neither are
//! counted as rejected and stay untradable.

use market_data::{select_bars, BarSource, DateRange, SimTicker, TickForger, TickSeries, UniverseEntry};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use types::errors::{BrokerError, DataError};
use types::ids::SymbolKey;
use types::symbol::SymbolInfo;
use types::time::Period;

use crate::stats::LoadReport;
use crate::status::VmStatus;
use crate::world::{SimWorld, VmState};

/// Where a symbol's sequence came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickSource {
    Raw,
    Forged,
}

impl SimWorld {
    pub(crate) fn load_universe(&self, vm: &mut VmState) -> LoadReport {
        let mut report = LoadReport::default();
        if self.universe.is_empty() {
            warn!("universe is empty, no symbol will be tradable");
        }
        for entry in self.universe.iter() {
            match self.load_entry(vm, entry) {
                Ok(TickSource::Raw) => report.loaded += 1,
                Ok(TickSource::Forged) => report.forged += 1,
                Err(e) => {
                    warn!(ticker = %entry.ticker, error = %e, "symbol not tradable");
                    report.rejected += 1;
                }
            }
        }
        info!(
            loaded = report.loaded,
            forged = report.forged,
            rejected = report.rejected,
            bar_series = vm.bars.len(),
            "universe loaded"
        );
        report
    }

    fn load_entry(&self, vm: &mut VmState, entry: &UniverseEntry) -> Result<TickSource, BrokerError> {
        let info = self.catalog.lookup(&entry.ticker)?;
        let range = entry.range();

        if entry.features.minute {
            let period = if info.is_fx { Period::Min1 } else { Period::Min5 };
            self.cache_bars(vm, &info, period, range);
        }
        if entry.features.daily {
            self.cache_bars(vm, &info, Period::Daily, range);
        }

        let raw = if entry.features.tick { self.load_raw(&info, range) } else { None };
        let (cursor, source) = match raw {
            Some(cursor) => (cursor, TickSource::Raw),
            None => (self.forge_cached(vm, &info)?, TickSource::Forged),
        };
        if cursor.is_empty() {
            return Err(DataError::TickNotExist { ticker: info.ticker.clone() }.into());
        }
        cursor.validate()?;

        debug!(ticker = %info.ticker, ticks = cursor.len(), ?source, "tick sequence ready");
        vm.tick_map.insert(info.key, cursor);
        vm.symbols.insert(info.key, info);
        Ok(source)
    }

    fn cache_bars(&self, vm: &mut VmState, info: &SymbolInfo, period: Period, range: DateRange) {
        match self.store.load_bars(&info.ticker, period, range) {
            Ok(series) => {
                debug!(ticker = %info.ticker, ?period, bars = series.len(), "bars cached");
                vm.bars.insert(info.key, series);
            }
            Err(e) => debug!(ticker = %info.ticker, ?period, error = %e, "bars unavailable"),
        }
    }

    fn load_raw(&self, info: &SymbolInfo, range: DateRange) -> Option<SimTicker> {
        let series = if info.is_fx {
            self.store.load_ticks_fx(&info.ticker, range).map(TickSeries::Fx)
        } else {
            self.store.load_ticks(&info.ticker, range).map(TickSeries::Trade)
        };
        match series {
            Ok(series) if !series.is_empty() => Some(SimTicker::new(series)),
            Ok(_) => None,
            Err(e) => {
                debug!(ticker = %info.ticker, error = %e, "raw ticks unavailable, forging");
                None
            }
        }
    }

    fn forge_cached(&self, vm: &VmState, info: &SymbolInfo) -> Result<SimTicker, DataError> {
        let bars = select_bars(&vm.bars, info.key, info.is_fx)
            .ok_or_else(|| DataError::BarsNotExist { ticker: info.ticker.clone() })?;
        let rng = ChaCha8Rng::seed_from_u64(self.forge_seed(info.key));
        Ok(SimTicker::new(TickForger::new(rng).forge(info, bars)))
    }

    /// Seed for one symbol's forger; symbols get distinct streams
    fn forge_seed(&self, key: SymbolKey) -> u64 {
        self.config.forge_seed ^ u64::from(key.value())
    }

    /// Re-forge `ticker` from its cached bars, replacing its sequence
    ///
    /// Only while idle; the next run replays the new sequence. Returns the
    /// number of ticks forged.
    pub fn forge_ticks(&self, ticker: &str) -> Result<usize, BrokerError> {
        let info = self.catalog.lookup(ticker)?;
        let mut guard = self.vm.write();
        if self.status.load() != VmStatus::Idle {
            return Err(self.invalid_status("forge").into());
        }
        let vm = &mut *guard;

        let cursor = self.forge_cached(vm, &info)?;
        cursor.validate()?;
        let ticks = cursor.len();
        vm.tick_map.insert(info.key, cursor);
        vm.symbols.insert(info.key, info);
        Ok(ticks)
    }
}
