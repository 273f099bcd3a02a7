//! Data access port trait.

use crate::domain::error::SentinelError;
use crate::domain::ohlcv::Bar;
use crate::domain::signal::Signal;

pub trait DataPort {
    /// Bars for `symbol`, oldest first.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, SentinelError>;

    /// Recorded layer signals for `symbol`, oldest first.
    fn fetch_layer_signals(&self, symbol: &str) -> Result<Vec<Signal>, SentinelError>;
}
