//! CSV file data adapter.
//!
//! `<SYMBOL>.csv` holds `timestamp,open,high,low,close,volume`;
//! `<SYMBOL>_signals.csv` holds `timestamp,layer,direction,strength,confidence`.

use crate::domain::error::SentinelError;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::{Direction, Layer, Signal};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn bars_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn signals_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}_signals.csv", symbol))
    }

    fn read_records(path: &PathBuf) -> Result<Vec<StringRecord>, SentinelError> {
        let content = fs::read_to_string(path).map_err(|e| SentinelError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        rdr.records()
            .map(|r| {
                r.map_err(|e| SentinelError::Data {
                    reason: format!("CSV parse error in {}: {}", path.display(), e),
                })
            })
            .collect()
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, the `T`-separated form, minutes-only, or a
/// bare date (midnight).
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, SentinelError> {
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| SentinelError::Data {
            reason: format!("invalid timestamp: {}", value),
        })
}

fn column<'r>(record: &'r StringRecord, index: usize, name: &str) -> Result<&'r str, SentinelError> {
    record.get(index).ok_or_else(|| SentinelError::Data {
        reason: format!("missing {} column", name),
    })
}

fn parse_column<T: FromStr>(record: &StringRecord, index: usize, name: &str) -> Result<T, SentinelError>
where
    T::Err: std::fmt::Display,
{
    column(record, index, name)?
        .parse()
        .map_err(|e: T::Err| SentinelError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, SentinelError> {
        let path = self.bars_path(symbol);
        let mut bars = Vec::new();

        for record in Self::read_records(&path)? {
            let bar = Bar {
                timestamp: parse_timestamp(column(&record, 0, "timestamp")?)?,
                open: parse_column(&record, 1, "open")?,
                high: parse_column(&record, 2, "high")?,
                low: parse_column(&record, 3, "low")?,
                close: parse_column(&record, 4, "close")?,
                volume: parse_column(&record, 5, "volume")?,
            };
            if bar.range() < 0.0 {
                warn!(symbol, timestamp = %bar.timestamp, "skipping bar with high below low");
                continue;
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.timestamp);
        debug!(symbol, count = bars.len(), "loaded bars");
        Ok(bars)
    }

    fn fetch_layer_signals(&self, symbol: &str) -> Result<Vec<Signal>, SentinelError> {
        let path = self.signals_path(symbol);
        let mut signals = Vec::new();

        for record in Self::read_records(&path)? {
            let layer = Layer::from_str(column(&record, 1, "layer")?)
                .map_err(|reason| SentinelError::Data { reason })?;
            let direction = Direction::from_str(column(&record, 2, "direction")?)
                .map_err(|reason| SentinelError::Data { reason })?;
            let strength: f64 = parse_column(&record, 3, "strength")?;
            let confidence: f64 = parse_column(&record, 4, "confidence")?;
            for (name, value) in [("strength", strength), ("confidence", confidence)] {
                if !(0.0..=1.0).contains(&value) {
                    return Err(SentinelError::Data {
                        reason: format!("{} must be between 0 and 1, got {}", name, value),
                    });
                }
            }
            signals.push(Signal {
                layer,
                direction,
                strength,
                confidence,
                timestamp: parse_timestamp(column(&record, 0, "timestamp")?)?,
            });
        }

        signals.sort_by_key(|s| s.timestamp);
        debug!(symbol, count = signals.len(), "loaded layer signals");
        Ok(signals)
    }
}
