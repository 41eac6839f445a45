//! Universe table
//!
//! Comma-separated, no header, one symbol per row:
//!
//! ```text
//! ticker, features[, start_day[, end_day]]
//! ```
//!
//! `features` holds any of `t` (raw ticks), `m` (minute bars) and `d` (daily
//! bars). Days are Julian day numbers. Rows with fewer than two columns or an
//! empty ticker are skipped; anything else malformed is a `ConfigError`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use types::errors::ConfigError;
use types::time::JulianDay;

use crate::store::DateRange;

/// Which history to preload for a symbol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    pub tick: bool,
    pub minute: bool,
    pub daily: bool,
}

impl Features {
    fn parse(s: &str) -> Result<Self, char> {
        let mut features = Features::default();
        for c in s.chars() {
            match c.to_ascii_lowercase() {
                't' => features.tick = true,
                'm' => features.minute = true,
                'd' => features.daily = true,
                other => return Err(other),
            }
        }
        Ok(features)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseEntry {
    pub ticker: String,
    pub features: Features,
    pub start: Option<JulianDay>,
    pub end: Option<JulianDay>,
}

impl UniverseEntry {
    pub fn range(&self) -> DateRange {
        DateRange::days(self.start, self.end)
    }
}

/// Symbols the simulation preloads, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Universe {
    entries: Vec<UniverseEntry>,
}

impl Universe {
    pub fn new(entries: Vec<UniverseEntry>) -> Self {
        Self { entries }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let universe = Self::from_reader(file)?;
        info!(path = %path.display(), symbols = universe.len(), "universe loaded");
        Ok(universe)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut entries = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| ConfigError::Parse { reason: e.to_string() })?;
            if let Some(entry) = parse_row(&record)? {
                entries.push(entry);
            }
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &UniverseEntry> {
        self.entries.iter()
    }

    pub fn get(&self, ticker: &str) -> Option<&UniverseEntry> {
        self.entries.iter().find(|e| e.ticker == ticker)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_row(record: &StringRecord) -> Result<Option<UniverseEntry>, ConfigError> {
    let line = record.position().map_or(0, |p| p.line());
    let ticker = record.get(0).unwrap_or_default();
    if record.len() < 2 || ticker.is_empty() {
        debug!(line, "universe row skipped");
        return Ok(None);
    }

    let features = Features::parse(record.get(1).unwrap_or_default()).map_err(|c| ConfigError::InvalidRow {
        line,
        reason: format!("unknown feature '{c}'"),
    })?;
    let start = parse_day(record.get(2), line)?;
    let end = parse_day(record.get(3), line)?;
    if let (Some(s), Some(e)) = (start, end) {
        if e < s {
            return Err(ConfigError::InvalidRow {
                line,
                reason: format!("end day {} before start day {}", e.value(), s.value()),
            });
        }
    }

    Ok(Some(UniverseEntry { ticker: ticker.to_string(), features, start, end }))
}

fn parse_day(field: Option<&str>, line: u64) -> Result<Option<JulianDay>, ConfigError> {
    match field {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<u32>().map(|d| Some(JulianDay::new(d))).map_err(|_| ConfigError::InvalidRow {
            line,
            reason: format!("bad day number '{s}'"),
        }),
    }
}
