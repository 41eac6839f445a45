//! Per-symbol quote snapshot

use crate::numeric::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest market state for one symbol
///
/// `volume` is cumulative for the session and never decreases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quotes {
    pub today_open: Price,
    pub today_high: Price,
    pub today_low: Price,
    pub pclose: Price,
    pub last: Price,
    pub volume: u64,
    pub turnover: Decimal,
    pub bid: Price,
    pub ask: Price,
    pub bid_vol: u64,
    pub ask_vol: u64,
}

impl Quotes {
    /// Apply a last-sale print carrying cumulative `volume`
    ///
    /// Returns false, leaving the snapshot untouched, if the volume regresses.
    pub fn apply_last_sale(&mut self, last: Price, volume: u64) -> bool {
        if volume < self.volume {
            return false;
        }
        if self.today_open.is_zero() {
            self.today_open = last;
        }
        let traded = volume - self.volume;
        self.turnover += last.as_decimal() * Decimal::from(traded);
        self.last = last;
        self.volume = volume;
        if self.today_low.is_zero() || last < self.today_low {
            self.today_low = last;
        }
        if last > self.today_high {
            self.today_high = last;
        }
        true
    }

    pub fn apply_bid_ask(&mut self, bid: Price, ask: Price) {
        self.bid = bid;
        self.ask = ask;
    }
}
