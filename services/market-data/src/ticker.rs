//! Replayable tick sequences
//!
//! A `SimTicker` is a cursor over a tick series. The series itself is shared
//! so the loaded master copy and every run copy point at the same ticks; only
//! the cursor is per-run.

use std::sync::Arc;

use types::errors::DataError;
use types::tick::{Tick, TickFx, TickValue};
use types::time::DateTimeMs;

/// Tick storage for one symbol
#[derive(Debug, Clone, PartialEq)]
pub enum TickSeries {
    Trade(Arc<[Tick]>),
    Fx(Arc<[TickFx]>),
}

impl TickSeries {
    pub fn len(&self) -> usize {
        match self {
            TickSeries::Trade(t) => t.len(),
            TickSeries::Fx(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn time_at(&self, index: usize) -> Option<DateTimeMs> {
        match self {
            TickSeries::Trade(t) => t.get(index).map(|x| x.time),
            TickSeries::Fx(t) => t.get(index).map(|x| x.time),
        }
    }

    pub fn value_at(&self, index: usize) -> Option<TickValue> {
        match self {
            TickSeries::Trade(t) => t.get(index).map(TickValue::from),
            TickSeries::Fx(t) => t.get(index).map(TickValue::from),
        }
    }
}

/// Result of stepping a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The cursor now points at another tick
    Ready,
    /// The sequence is exhausted
    End,
}

/// Cursor over a tick series
///
/// The cursor starts on the first tick. Not safe for concurrent advancement.
#[derive(Debug, Clone, PartialEq)]
pub struct SimTicker {
    series: TickSeries,
    cursor: usize,
}

impl SimTicker {
    pub fn new(series: TickSeries) -> Self {
        Self { series, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.series.len()
    }

    pub fn is_fx(&self) -> bool {
        matches!(self.series, TickSeries::Fx(_))
    }

    /// Time of the tick under the cursor
    ///
    /// # Panics
    /// Panics if the cursor is past the end
    pub fn time(&self) -> DateTimeMs {
        self.time_at(self.cursor)
    }

    /// # Panics
    /// Panics if `index` is out of range
    pub fn time_at(&self, index: usize) -> DateTimeMs {
        match self.series.time_at(index) {
            Some(t) => t,
            None => panic!("tick index {index} out of bounds (len {})", self.len()),
        }
    }

    /// # Panics
    /// Panics if the cursor is past the end
    pub fn tick_value(&self) -> TickValue {
        match self.series.value_at(self.cursor) {
            Some(v) => v,
            None => panic!("tick cursor {} out of bounds (len {})", self.cursor, self.len()),
        }
    }

    /// Step to the next tick
    ///
    /// # Panics
    /// Panics if called again after `Advance::End`
    pub fn advance(&mut self) -> Advance {
        assert!(!self.is_exhausted(), "advance past end of tick sequence");
        self.cursor += 1;
        if self.is_exhausted() {
            Advance::End
        } else {
            Advance::Ready
        }
    }

    /// Fresh cursor over the same ticks
    pub fn rewound(&self) -> Self {
        Self::new(self.series.clone())
    }

    /// Check that timestamps never decrease
    pub fn validate(&self) -> Result<(), DataError> {
        let mut prev = DateTimeMs::new(i64::MIN);
        for index in 0..self.len() {
            let t = self.time_at(index);
            if t < prev {
                return Err(DataError::TickOrder { index });
            }
            prev = t;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::numeric::Price;

    fn ticker(times: &[i64]) -> SimTicker {
        let ticks: Vec<Tick> = times
            .iter()
            .map(|t| Tick { time: DateTimeMs::new(*t), last: Price::from_u64(10), volume: 1 })
            .collect();
        SimTicker::new(TickSeries::Trade(ticks.into()))
    }

    #[test]
    fn test_validate_order() {
        assert_eq!(ticker(&[100, 200, 150]).validate(), Err(DataError::TickOrder { index: 2 }));
        assert!(ticker(&[100, 150, 200]).validate().is_ok());
        assert!(ticker(&[100, 100]).validate().is_ok());
    }

    #[test]
    fn test_advance_signals_end() {
        let mut t = ticker(&[1, 2]);
        assert_eq!(t.time(), DateTimeMs::new(1));
        assert_eq!(t.advance(), Advance::Ready);
        assert_eq!(t.time(), DateTimeMs::new(2));
        assert_eq!(t.advance(), Advance::End);
        assert!(t.is_exhausted());
    }

    #[test]
    #[should_panic(expected = "advance past end")]
    fn test_advance_after_end_panics() {
        let mut t = ticker(&[1]);
        t.advance();
        t.advance();
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_time_at_out_of_range_panics() {
        ticker(&[1]).time_at(5);
    }

    #[test]
    fn test_rewound_shares_ticks() {
        let mut t = ticker(&[1, 2, 3]);
        t.advance();
        let fresh = t.rewound();
        assert_eq!(fresh.position(), 0);
        assert_eq!(t.position(), 1);
        match (&t.series, &fresh.series) {
            (TickSeries::Trade(a), TickSeries::Trade(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_fx_tick_value() {
        let fx = vec![TickFx { time: DateTimeMs::new(5), bid: Price::from_u64(1), ask: Price::from_u64(2) }];
        let t = SimTicker::new(TickSeries::Fx(fx.into()));
        assert!(t.is_fx());
        assert_eq!(t.tick_value(), TickValue::Quote { bid: Price::from_u64(1), ask: Price::from_u64(2) });
    }
}
