//! Demo run of the simulated broker
//!
//! Usage: `simbroker [config.toml]`
//!
//! Registers two demo symbols with synthetic bars, opens one session, places
//! a bracketed buy on each and replays the whole day, printing every session
//! event as a JSON line.

use std::sync::Arc;

use anyhow::Context;
use market_data::{Features, InMemoryCatalog, MemoryStore, Universe, UniverseEntry};
use rust_decimal::Decimal;
use simulation::{BrokerRegistry, SimConfig, SimWorld, SIM_BROKER};
use tracing_subscriber::EnvFilter;
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::symbol::SymbolSpec;
use types::tick::Bar;
use types::time::{DateTimeMs, Period};

const FUTURE: &str = "ESZ8";
const FX: &str = "EURUSD";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::from_path(&path).with_context(|| format!("loading config {path}"))?,
        None => SimConfig::default(),
    };

    let catalog = Arc::new(InMemoryCatalog::new());
    catalog.register(SymbolSpec::new(FUTURE, false).with_tick_size(Decimal::new(25, 2)));
    catalog.register(
        SymbolSpec::new(FX, true)
            .with_tick_size(Decimal::new(1, 5))
            .with_spread(Price::new(Decimal::new(2, 4))),
    );

    let store = Arc::new(MemoryStore::new());
    store.insert_bars(FUTURE, Period::Min5, demo_bars(Decimal::from(2700), Decimal::new(25, 2), Period::Min5));
    store.insert_bars(FX, Period::Min1, demo_bars(Decimal::new(11500, 4), Decimal::new(1, 4), Period::Min1));

    let world = if config.universe_path.is_some() {
        SimWorld::from_config(config, catalog, store).context("loading universe")?
    } else {
        let universe = Universe::new(vec![demo_entry(FUTURE), demo_entry(FX)]);
        SimWorld::new(config, catalog, store, universe)
    };
    let world = Arc::new(world);

    let registry = BrokerRegistry::with_simulated(Arc::clone(&world));
    let (tx, rx) = flume::bounded(world.config().event_capacity);
    let broker = registry.open(SIM_BROKER, tx)?;

    broker.subscribe_quotes(&[FUTURE, FX])?;
    broker.start()?;
    tracing::info!(tradable = ?world.tradable(), "session ready");

    let es = broker
        .submit_order(FUTURE, Side::Buy, Quantity::from_u64(2), Price::from_u64(2700), Some(Price::from_u64(2698)))
        .map_err(|r| anyhow::anyhow!("order rejected: {r}"))?;
    let fx = broker
        .submit_order(
            FX,
            Side::Sell,
            Quantity::from_u64(10_000),
            Price::new(Decimal::new(11502, 4)),
            None,
        )
        .map_err(|r| anyhow::anyhow!("order rejected: {r}"))?;

    let mut applied = 0;
    while let Some(time) = world.step()? {
        applied += 1;
        if time >= DateTimeMs::new(Period::Min5.duration_ms() * 12) {
            broker.close_order(es);
            broker.close_order(fx);
        }
        for event in rx.drain() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }
    broker.stop()?;
    for event in rx.drain() {
        println!("{}", serde_json::to_string(&event)?);
    }

    tracing::info!(
        ticks = applied,
        equity = %broker.equity(),
        balance = %broker.balance(),
        free_margin = %broker.free_margin(),
        stats = ?world.stats(),
        "run complete"
    );
    Ok(())
}

fn demo_entry(ticker: &str) -> UniverseEntry {
    UniverseEntry {
        ticker: ticker.to_string(),
        features: Features { tick: false, minute: true, daily: false },
        start: None,
        end: None,
    }
}

/// A gently oscillating day of bars around `base`
fn demo_bars(base: Decimal, step: Decimal, period: Period) -> Vec<Bar> {
    let count = types::time::MS_PER_DAY / period.duration_ms() / 4;
    (0..count)
        .map(|i| {
            let swing = Decimal::from((i % 9) - 4) * step;
            let open = base + swing;
            let close = open + step;
            Bar {
                start: DateTimeMs::new(i * period.duration_ms()),
                open: Price::new(open),
                high: Price::new(close + step),
                low: Price::new(open - step),
                close: Price::new(close),
                volume: 400 + (i as u64 % 5) * 80,
            }
        })
        .collect()
}
