#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use sentinel::domain::error::SentinelError;
pub use sentinel::domain::ohlcv::Bar;
use sentinel::domain::position::Trade;
use sentinel::domain::signal::{Direction, Layer, Signal};
use sentinel::ports::data_port::DataPort;
use sentinel::ports::trade_journal_port::TradeJournalPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub bars: HashMap<String, Vec<Bar>>,
    pub signals: HashMap<String, Vec<Signal>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            signals: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_signals(mut self, symbol: &str, signals: Vec<Signal>) -> Self {
        self.signals.insert(symbol.to_string(), signals);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn check(&self, symbol: &str) -> Result<(), SentinelError> {
        match self.errors.get(symbol) {
            Some(reason) => Err(SentinelError::Data {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, SentinelError> {
        self.check(symbol)?;
        Ok(self.bars.get(symbol).cloned().unwrap_or_default())
    }

    fn fetch_layer_signals(&self, symbol: &str) -> Result<Vec<Signal>, SentinelError> {
        self.check(symbol)?;
        Ok(self.signals.get(symbol).cloned().unwrap_or_default())
    }
}

/// Journal that keeps everything in memory.
#[derive(Default)]
pub struct MemoryJournal {
    pub trades: RefCell<Vec<(String, Trade)>>,
    pub events: RefCell<Vec<(NaiveDateTime, String, String)>>,
}

impl TradeJournalPort for MemoryJournal {
    fn record_trade(&self, symbol: &str, trade: &Trade) -> Result<(), SentinelError> {
        self.trades
            .borrow_mut()
            .push((symbol.to_string(), trade.clone()));
        Ok(())
    }

    fn record_event(
        &self,
        timestamp: NaiveDateTime,
        event_type: &str,
        description: &str,
    ) -> Result<(), SentinelError> {
        self.events.borrow_mut().push((
            timestamp,
            event_type.to_string(),
            description.to_string(),
        ));
        Ok(())
    }
}

pub fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::hours(i as i64)
}

/// `count` hourly bars whose close moves by `step` per bar, with a +-0.5 range.
pub fn trending_bars(count: usize, start_price: f64, step: f64) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let close = start_price + step * i as f64;
            Bar {
                timestamp: ts(i),
                open: close - step,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

pub fn flat_bars(count: usize, price: f64) -> Vec<Bar> {
    trending_bars(count, price, 0.0)
}

pub fn signal(i: usize, layer: Layer, direction: Direction, strength: f64, confidence: f64) -> Signal {
    Signal {
        layer,
        direction,
        strength,
        confidence,
        timestamp: ts(i),
    }
}

/// Primary and sequential layers agreeing on `direction` at bar `i`.
pub fn agreeing_pair(i: usize, direction: Direction) -> Vec<Signal> {
    vec![
        signal(i, Layer::Primary, direction, 0.8, 0.8),
        signal(i, Layer::Sequential, direction, 0.6, 0.7),
    ]
}

pub fn bars_csv(bars: &[Bar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}

pub fn signals_csv(signals: &[Signal]) -> String {
    let mut out = String::from("timestamp,layer,direction,strength,confidence\n");
    for s in signals {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            s.timestamp.format("%Y-%m-%d %H:%M:%S"),
            s.layer,
            s.direction,
            s.strength,
            s.confidence
        ));
    }
    out
}
