//! Simulated fills: slippage, commission, sizing by stop distance, and
//! stop-loss/take-profit exits.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use super::ohlcv::Bar;
use super::portfolio::Portfolio;
use super::position::{ExitReason, Side, SimulatedPosition, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// Flat fee charged on every open and every close.
    pub commission: f64,
    /// Price units added against the trader on entry.
    pub slippage: f64,
    /// Fraction of current capital risked per trade.
    pub risk_per_trade: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission: 0.0,
            slippage: 0.0,
            risk_per_trade: 0.02,
        }
    }
}

/// Buys fill higher, sells fill lower.
pub fn apply_entry_slippage(side: Side, market_price: f64, slippage: f64) -> f64 {
    match side {
        Side::Buy => market_price + slippage,
        Side::Sell => market_price - slippage,
    }
}

/// `risk_amount / |entry - stop|`, or `None` when the result is not a usable size.
pub fn size_by_stop(risk_amount: f64, entry_price: f64, stop_loss: f64) -> Option<f64> {
    let distance = (entry_price - stop_loss).abs();
    if distance == 0.0 || !distance.is_finite() {
        return None;
    }
    let size = risk_amount / distance;
    if size.is_finite() && size > 0.0 {
        Some(size)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        id: u64,
        size: f64,
        entry_price: f64,
    },
    /// Stop distance or risk produced no usable size.
    ZeroSize,
}

/// Opens a position sized so that hitting `stop_loss` loses
/// `capital * risk_per_trade`. Charges one commission.
pub fn open_position(
    portfolio: &mut Portfolio,
    side: Side,
    market_price: f64,
    stop_loss: f64,
    take_profit: f64,
    time: NaiveDateTime,
    config: &ExecutionConfig,
) -> EntryResult {
    let entry_price = apply_entry_slippage(side, market_price, config.slippage);
    let risk_amount = portfolio.capital * config.risk_per_trade;

    let Some(size) = size_by_stop(risk_amount, entry_price, stop_loss) else {
        warn!(%side, entry_price, stop_loss, risk_amount, "skipping entry with no usable size");
        return EntryResult::ZeroSize;
    };

    portfolio.capital -= config.commission;
    let id = portfolio.next_position_id();
    portfolio.add_position(SimulatedPosition {
        id,
        side,
        entry_price,
        entry_time: time,
        size,
        stop_loss,
        take_profit,
        entry_commission: config.commission,
    });

    debug!(id, %side, entry_price, size, stop_loss, take_profit, %time, "opened position");

    EntryResult::Entered {
        id,
        size,
        entry_price,
    }
}

/// Closes position `id` at `exit_price`, charging one commission and booking
/// the gross P&L into capital.
pub fn close_position(
    portfolio: &mut Portfolio,
    id: u64,
    exit_price: f64,
    time: NaiveDateTime,
    reason: ExitReason,
    config: &ExecutionConfig,
) -> Option<Trade> {
    let position = portfolio.remove_position(id)?;
    let gross = position.unrealized_pnl(exit_price);
    portfolio.capital += gross - config.commission;

    let trade = position.close(exit_price, time, reason, config.commission);
    debug!(
        id,
        %reason,
        exit_price,
        profit = trade.profit,
        %time,
        "closed position"
    );
    portfolio.record_trade(trade.clone());
    Some(trade)
}

/// Closes every open position whose stop or target `bar` reaches.
///
/// Two-pass: collect triggered ids first, then close each. Returns the number
/// of positions closed.
pub fn check_exits(portfolio: &mut Portfolio, bar: &Bar, config: &ExecutionConfig) -> usize {
    let triggered: Vec<(u64, ExitReason, f64)> = portfolio
        .positions
        .iter()
        .filter_map(|p| {
            p.exit_trigger(bar)
                .map(|(reason, price)| (p.id, reason, price))
        })
        .collect();

    let count = triggered.len();
    for (id, reason, price) in triggered {
        close_position(portfolio, id, price, bar.timestamp, reason, config);
    }
    count
}

/// Force-closes every open position at `price` with `EndOfBacktest`.
pub fn close_all(
    portfolio: &mut Portfolio,
    price: f64,
    time: NaiveDateTime,
    config: &ExecutionConfig,
) -> usize {
    let ids: Vec<u64> = portfolio.positions.iter().map(|p| p.id).collect();
    let count = ids.len();
    for id in ids {
        close_position(portfolio, id, price, time, ExitReason::EndOfBacktest, config);
    }
    count
}
