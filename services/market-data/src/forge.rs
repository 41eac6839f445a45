//! Tick forging
//!
//! Turns bars into a replayable tick sequence: four ticks per bar (open,
//! the two extremes at random offsets inside the bar, close on the bar's
//! last millisecond). Whichever extreme drew the smaller offset comes first.
//!
//! Trade ticks split the bar volume 3/8 open, 1/8 per extreme, and the rest
//! on the close so the four always sum to the bar volume. FX ticks carry no
//! volume and quote `ask = bid + default_spread`.

use rand::Rng;
use types::ids::SymbolKey;
use types::numeric::Price;
use types::symbol::SymbolInfo;
use types::tick::{Bar, Tick, TickFx};
use types::time::{DateTimeMs, Period};

use crate::store::{BarCache, BarSeries, BarSource};
use crate::ticker::TickSeries;

/// Forging engine with an injected random source
pub struct TickForger<R: Rng> {
    rng: R,
}

impl<R: Rng> TickForger<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Forge a tick series for `info` from `bars`
    pub fn forge<B: BarSource + ?Sized>(&mut self, info: &SymbolInfo, bars: &B) -> TickSeries {
        let duration = bars.duration_ms();
        if info.is_fx {
            let mut ticks = Vec::with_capacity(bars.len() * 4);
            for i in 0..bars.len() {
                let bar = bars.bar(i);
                for (time, px) in self.shape(&bar, duration) {
                    ticks.push(TickFx { time, bid: px, ask: px + info.default_spread });
                }
            }
            TickSeries::Fx(ticks.into())
        } else {
            let mut ticks = Vec::with_capacity(bars.len() * 4);
            for i in 0..bars.len() {
                let bar = bars.bar(i);
                let volumes = split_volume(bar.volume);
                for ((time, last), volume) in self.shape(&bar, duration).into_iter().zip(volumes) {
                    ticks.push(Tick { time, last, volume });
                }
            }
            TickSeries::Trade(ticks.into())
        }
    }

    /// Times and prices of the four ticks for one bar
    fn shape(&mut self, bar: &Bar, duration: i64) -> [(DateTimeMs, Price); 4] {
        let hto = self.offset(duration);
        let lto = self.offset(duration);
        let high = (bar.start.offset(hto), bar.high);
        let low = (bar.start.offset(lto), bar.low);
        let (first, second) = if hto > lto { (low, high) } else { (high, low) };
        [
            (bar.start, bar.open),
            first,
            second,
            (bar.start.offset(duration - 1), bar.close),
        ]
    }

    fn offset(&mut self, duration: i64) -> i64 {
        if duration > 0 {
            self.rng.gen_range(0..duration)
        } else {
            0
        }
    }
}

/// Open, first extreme, second extreme, close
fn split_volume(volume: u64) -> [u64; 4] {
    let open = volume * 3 / 8;
    let extreme = volume / 8;
    [open, extreme, extreme, volume - open - 2 * extreme]
}

/// Bars to forge from: minute bars first (1-minute for FX, 5-minute
/// otherwise), then daily
pub fn select_bars(cache: &BarCache, key: SymbolKey, is_fx: bool) -> Option<&BarSeries> {
    let intraday = if is_fx { Period::Min1 } else { Period::Min5 };
    [intraday, Period::Daily]
        .into_iter()
        .filter_map(|period| cache.get(key, period))
        .find(|series| !series.is_empty())
}
