//! Simulated time
//!
//! Simulation time is kept as milliseconds since the Unix epoch. Bar periods
//! and date bounds from the universe table (Julian day numbers) convert into
//! that single unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds per day
pub const MS_PER_DAY: i64 = 86_400_000;

/// Julian day number of 1970-01-01
const UNIX_EPOCH_JULIAN_DAY: i64 = 2_440_588;

/// A point in simulated time, in milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateTimeMs(i64);

impl DateTimeMs {
    pub const ZERO: DateTimeMs = DateTimeMs(0);

    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Shift by a signed number of milliseconds
    pub fn offset(self, millis: i64) -> Self {
        Self(self.0 + millis)
    }

    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl fmt::Display for DateTimeMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_utc() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Julian day number, as used by the universe table date bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JulianDay(u32);

impl JulianDay {
    pub const fn new(day: u32) -> Self {
        Self(day)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Midnight UTC at the start of this day
    pub fn start_of_day(&self) -> DateTimeMs {
        DateTimeMs((self.0 as i64 - UNIX_EPOCH_JULIAN_DAY) * MS_PER_DAY)
    }

    /// Last millisecond of this day
    pub fn end_of_day(&self) -> DateTimeMs {
        self.start_of_day().offset(MS_PER_DAY - 1)
    }
}

/// Bar aggregation period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Period {
    /// 1 minute
    Min1,
    /// 5 minutes
    Min5,
    /// 1 day
    Daily,
}

impl Period {
    /// Duration of this period in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        match self {
            Period::Min1 => 60_000,
            Period::Min5 => 5 * 60_000,
            Period::Daily => MS_PER_DAY,
        }
    }

    pub fn is_intraday(&self) -> bool {
        !matches!(self, Period::Daily)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_julian_day_epoch() {
        let day = JulianDay::new(2_440_588);
        assert_eq!(day.start_of_day(), DateTimeMs::ZERO);
        assert_eq!(day.end_of_day().as_millis(), MS_PER_DAY - 1);
    }

    #[test]
    fn test_period_durations() {
        assert_eq!(Period::Min5.duration_ms(), 300_000);
        assert!(Period::Min1.is_intraday());
        assert!(!Period::Daily.is_intraday());
    }

    #[test]
    fn test_display() {
        let t = DateTimeMs::new(1_500);
        assert_eq!(t.to_string(), "1970-01-01 00:00:01.500");
    }
}
