//! Trade journal port trait.

use chrono::NaiveDateTime;

use crate::domain::error::SentinelError;
use crate::domain::position::Trade;

/// Append-only record of closed trades and notable events.
pub trait TradeJournalPort {
    fn record_trade(&self, symbol: &str, trade: &Trade) -> Result<(), SentinelError>;

    fn record_event(
        &self,
        timestamp: NaiveDateTime,
        event_type: &str,
        description: &str,
    ) -> Result<(), SentinelError>;
}
