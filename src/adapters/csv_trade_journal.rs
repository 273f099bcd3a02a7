//! CSV trade journal: appends to `trades.csv` and `events.csv` in a directory.

use crate::domain::error::SentinelError;
use crate::domain::position::Trade;
use crate::ports::trade_journal_port::TradeJournalPort;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    symbol: &'a str,
    #[serde(rename = "type")]
    side: &'static str,
    volume: f64,
    entry_time: String,
    entry_price: f64,
    exit_time: String,
    exit_price: f64,
    sl: f64,
    tp: f64,
    profit: f64,
    profit_pct: f64,
    reason: &'static str,
}

#[derive(Debug, Serialize)]
struct EventRow<'a> {
    timestamp: String,
    event_type: &'a str,
    description: &'a str,
}

pub struct CsvTradeJournal {
    dir: PathBuf,
}

impl CsvTradeJournal {
    /// Creates `dir` if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, SentinelError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn trades_path(&self) -> PathBuf {
        self.dir.join("trades.csv")
    }

    pub fn events_path(&self) -> PathBuf {
        self.dir.join("events.csv")
    }

    /// Appends one row; the header is written only when the file is new or empty.
    fn append<R: Serialize>(path: &Path, row: &R) -> Result<(), SentinelError> {
        let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(row).map_err(std::io::Error::from)?;
        writer.flush()?;
        Ok(())
    }
}

impl TradeJournalPort for CsvTradeJournal {
    fn record_trade(&self, symbol: &str, trade: &Trade) -> Result<(), SentinelError> {
        Self::append(
            &self.trades_path(),
            &TradeRow {
                symbol,
                side: trade.side.as_str(),
                volume: trade.size,
                entry_time: trade.entry_time.format(TIME_FORMAT).to_string(),
                entry_price: trade.entry_price,
                exit_time: trade.exit_time.format(TIME_FORMAT).to_string(),
                exit_price: trade.exit_price,
                sl: trade.stop_loss,
                tp: trade.take_profit,
                profit: trade.profit,
                profit_pct: trade.profit_percentage,
                reason: trade.reason.as_str(),
            },
        )
    }

    fn record_event(
        &self,
        timestamp: NaiveDateTime,
        event_type: &str,
        description: &str,
    ) -> Result<(), SentinelError> {
        Self::append(
            &self.events_path(),
            &EventRow {
                timestamp: timestamp.format(TIME_FORMAT).to_string(),
                event_type,
                description,
            },
        )
    }
}
