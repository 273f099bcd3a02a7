//! Simulated positions and the trades they close into.

use chrono::NaiveDateTime;
use std::fmt;

use super::ohlcv::Bar;
use super::signal::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// `None` for Neutral, which never opens a position.
    pub fn from_direction(direction: Direction) -> Option<Side> {
        match direction {
            Direction::Buy => Some(Side::Buy),
            Direction::Sell => Some(Side::Sell),
            Direction::Neutral => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    EndOfBacktest,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::TakeProfit => "TAKE_PROFIT",
            ExitReason::EndOfBacktest => "END_OF_BACKTEST",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPosition {
    pub id: u64,
    pub side: Side,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub entry_commission: f64,
}

impl SimulatedPosition {
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.side {
            Side::Buy => (price - self.entry_price) * self.size,
            Side::Sell => (self.entry_price - price) * self.size,
        }
    }

    pub fn stop_loss_hit(&self, bar: &Bar) -> bool {
        match self.side {
            Side::Buy => bar.low <= self.stop_loss,
            Side::Sell => bar.high >= self.stop_loss,
        }
    }

    pub fn take_profit_hit(&self, bar: &Bar) -> bool {
        match self.side {
            Side::Buy => bar.high >= self.take_profit,
            Side::Sell => bar.low <= self.take_profit,
        }
    }

    /// Exit triggered by `bar`, with the level it fills at. The stop is checked
    /// first, so a bar that spans both levels closes as a loss.
    pub fn exit_trigger(&self, bar: &Bar) -> Option<(ExitReason, f64)> {
        if self.stop_loss_hit(bar) {
            Some((ExitReason::StopLoss, self.stop_loss))
        } else if self.take_profit_hit(bar) {
            Some((ExitReason::TakeProfit, self.take_profit))
        } else {
            None
        }
    }

    /// Consumes the position: a closed position cannot be reopened.
    pub fn close(
        self,
        exit_price: f64,
        exit_time: NaiveDateTime,
        reason: ExitReason,
        exit_commission: f64,
    ) -> Trade {
        let profit = self.unrealized_pnl(exit_price) - self.entry_commission - exit_commission;
        let notional = self.entry_price * self.size;
        let profit_percentage = if notional > 0.0 {
            profit / notional * 100.0
        } else {
            0.0
        };
        Trade {
            id: self.id,
            side: self.side,
            entry_price: self.entry_price,
            entry_time: self.entry_time,
            exit_price,
            exit_time,
            size: self.size,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            profit,
            profit_percentage,
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub id: u64,
    pub side: Side,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_time: NaiveDateTime,
    pub size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Net of entry and exit commission.
    pub profit: f64,
    /// `profit` as a percentage of entry notional.
    pub profit_percentage: f64,
    pub reason: ExitReason,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.profit < 0.0
    }
}
