//! Historical data store and bar cache
//!
//! `HistoricalStore` is the seam to whatever holds raw history. The loader
//! pulls bars from it into a `BarCache`, from which ticks get forged.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use types::errors::DataError;
use types::ids::SymbolKey;
use types::tick::{Bar, Tick, TickFx};
use types::time::{DateTimeMs, JulianDay, Period};

/// Inclusive time window; open ends are unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTimeMs>,
    pub end: Option<DateTimeMs>,
}

impl DateRange {
    pub fn all() -> Self {
        Self::default()
    }

    /// Whole days, from the start of `start` to the end of `end`
    pub fn days(start: Option<JulianDay>, end: Option<JulianDay>) -> Self {
        Self {
            start: start.map(|d| d.start_of_day()),
            end: end.map(|d| d.end_of_day()),
        }
    }

    pub fn contains(&self, t: DateTimeMs) -> bool {
        self.start.map_or(true, |s| t >= s) && self.end.map_or(true, |e| t <= e)
    }
}

/// Indexed access to a bar series
pub trait BarSource {
    fn len(&self) -> usize;

    /// # Panics
    /// Panics if `index >= len()`
    fn bar(&self, index: usize) -> Bar;

    fn duration_ms(&self) -> i64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bars of one period for one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub period: Period,
    pub bars: Arc<[Bar]>,
}

impl BarSeries {
    pub fn new(period: Period, bars: Vec<Bar>) -> Self {
        Self { period, bars: bars.into() }
    }
}

impl BarSource for BarSeries {
    fn len(&self) -> usize {
        self.bars.len()
    }

    fn bar(&self, index: usize) -> Bar {
        self.bars[index]
    }

    fn duration_ms(&self) -> i64 {
        self.period.duration_ms()
    }
}

/// Source of historical ticks and bars
pub trait HistoricalStore: Send + Sync {
    fn load_ticks(&self, ticker: &str, range: DateRange) -> Result<Arc<[Tick]>, DataError>;

    fn load_ticks_fx(&self, ticker: &str, range: DateRange) -> Result<Arc<[TickFx]>, DataError>;

    fn load_bars(&self, ticker: &str, period: Period, range: DateRange) -> Result<BarSeries, DataError>;
}

#[derive(Debug, Default)]
struct Tables {
    ticks: BTreeMap<String, Vec<Tick>>,
    ticks_fx: BTreeMap<String, Vec<TickFx>>,
    bars: BTreeMap<(String, Period), Vec<Bar>>,
}

/// Store backed by in-process tables
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_ticks(&self, ticker: impl Into<String>, ticks: Vec<Tick>) {
        self.tables.write().ticks.insert(ticker.into(), ticks);
    }

    pub fn insert_ticks_fx(&self, ticker: impl Into<String>, ticks: Vec<TickFx>) {
        self.tables.write().ticks_fx.insert(ticker.into(), ticks);
    }

    pub fn insert_bars(&self, ticker: impl Into<String>, period: Period, bars: Vec<Bar>) {
        self.tables.write().bars.insert((ticker.into(), period), bars);
    }
}

impl HistoricalStore for MemoryStore {
    fn load_ticks(&self, ticker: &str, range: DateRange) -> Result<Arc<[Tick]>, DataError> {
        let tables = self.tables.read();
        let ticks = tables
            .ticks
            .get(ticker)
            .ok_or_else(|| DataError::TickNotExist { ticker: ticker.to_string() })?;
        Ok(ticks.iter().filter(|t| range.contains(t.time)).copied().collect())
    }

    fn load_ticks_fx(&self, ticker: &str, range: DateRange) -> Result<Arc<[TickFx]>, DataError> {
        let tables = self.tables.read();
        let ticks = tables
            .ticks_fx
            .get(ticker)
            .ok_or_else(|| DataError::TickNotExist { ticker: ticker.to_string() })?;
        Ok(ticks.iter().filter(|t| range.contains(t.time)).copied().collect())
    }

    fn load_bars(&self, ticker: &str, period: Period, range: DateRange) -> Result<BarSeries, DataError> {
        let tables = self.tables.read();
        let bars = tables
            .bars
            .get(&(ticker.to_string(), period))
            .ok_or_else(|| DataError::BarsNotExist { ticker: ticker.to_string() })?;
        Ok(BarSeries::new(
            period,
            bars.iter().filter(|b| range.contains(b.start)).copied().collect(),
        ))
    }
}

/// Preloaded bars, keyed by symbol and period
#[derive(Debug, Clone, Default)]
pub struct BarCache {
    series: BTreeMap<(SymbolKey, Period), BarSeries>,
}

impl BarCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: SymbolKey, series: BarSeries) {
        self.series.insert((key, series.period), series);
    }

    pub fn get(&self, key: SymbolKey, period: Period) -> Option<&BarSeries> {
        self.series.get(&(key, period))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::numeric::Price;
    use types::time::MS_PER_DAY;

    fn bar(start: i64) -> Bar {
        Bar {
            start: DateTimeMs::new(start),
            open: Price::from_u64(1),
            high: Price::from_u64(2),
            low: Price::from_u64(1),
            close: Price::from_u64(2),
            volume: 8,
        }
    }

    #[test]
    fn test_date_range_days() {
        let range = DateRange::days(Some(JulianDay::new(2_440_589)), Some(JulianDay::new(2_440_589)));
        assert!(!range.contains(DateTimeMs::new(MS_PER_DAY - 1)));
        assert!(range.contains(DateTimeMs::new(MS_PER_DAY)));
        assert!(range.contains(DateTimeMs::new(2 * MS_PER_DAY - 1)));
        assert!(!range.contains(DateTimeMs::new(2 * MS_PER_DAY)));
        assert!(DateRange::all().contains(DateTimeMs::new(i64::MIN)));
    }

    #[test]
    fn test_load_bars_filters_range() {
        let store = MemoryStore::new();
        store.insert_bars("ES", Period::Daily, vec![bar(0), bar(MS_PER_DAY), bar(2 * MS_PER_DAY)]);

        let range = DateRange { start: Some(DateTimeMs::new(MS_PER_DAY)), end: None };
        let series = store.load_bars("ES", Period::Daily, range).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.duration_ms(), MS_PER_DAY);
        assert!(store.load_bars("ES", Period::Min5, DateRange::all()).is_err());
    }

    #[test]
    fn test_missing_ticks() {
        let store = MemoryStore::new();
        assert_eq!(
            store.load_ticks("ES", DateRange::all()).unwrap_err(),
            DataError::TickNotExist { ticker: "ES".to_string() }
        );
        assert!(store.load_ticks_fx("EURUSD", DateRange::all()).is_err());
    }

    #[test]
    fn test_bar_cache_keyed_by_period() {
        let mut cache = BarCache::new();
        cache.insert(SymbolKey::new(0), BarSeries::new(Period::Min5, vec![bar(0)]));
        assert!(cache.get(SymbolKey::new(0), Period::Min5).is_some());
        assert!(cache.get(SymbolKey::new(0), Period::Daily).is_none());
    }
}
