//! Fused-signal strategy: replays recorded layer signals as backtest entries.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::trace;

use crate::domain::backtest::EntrySignal;
use crate::domain::fusion::fuse;
use crate::domain::ohlcv::Bar;
use crate::domain::position::Side;
use crate::domain::risk_limits::AutoTradingConfig;
use crate::domain::signal::{LayerSignals, Signal};

/// Layer signals keyed by the bar timestamp they were emitted for.
#[derive(Debug, Clone)]
pub struct FusedSignalStrategy {
    signals: BTreeMap<NaiveDateTime, LayerSignals>,
    auto: AutoTradingConfig,
    seed: u64,
}

impl FusedSignalStrategy {
    /// Groups `signals` by timestamp. A later signal for the same layer and
    /// timestamp replaces an earlier one.
    pub fn new(signals: Vec<Signal>, auto: AutoTradingConfig, seed: u64) -> Self {
        let mut table: BTreeMap<NaiveDateTime, LayerSignals> = BTreeMap::new();
        for signal in signals {
            table.entry(signal.timestamp).or_default().insert(signal);
        }
        FusedSignalStrategy {
            signals: table,
            auto,
            seed,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.signals.len()
    }

    /// Entry for bar `index` of `bars`, or `None` to hold.
    ///
    /// Fusion for bar `i` uses seed `seed + i`, so a run is reproducible from
    /// the strategy seed alone.
    pub fn signal(&self, bars: &[Bar], index: usize) -> Option<EntrySignal> {
        let bar = bars.get(index)?;
        let layers = self.signals.get(&bar.timestamp)?;
        let fused = fuse(layers, self.seed.wrapping_add(index as u64)).ok()?;

        let side = Side::from_direction(fused.direction)
            .filter(|_| fused.confidence >= self.auto.min_confidence);
        let Some(side) = side else {
            trace!(index, direction = %fused.direction, confidence = fused.confidence, "hold");
            return None;
        };

        let (stop_loss, take_profit) = match side {
            Side::Buy => (
                bar.close - self.auto.default_sl_points,
                bar.close + self.auto.default_tp_points,
            ),
            Side::Sell => (
                bar.close + self.auto.default_sl_points,
                bar.close - self.auto.default_tp_points,
            ),
        };

        Some(EntrySignal {
            direction: fused.direction,
            stop_loss,
            take_profit,
        })
    }
}
