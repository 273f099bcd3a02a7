//! Run-scoped position book and equity tracking.

use chrono::NaiveDateTime;

use super::position::{SimulatedPosition, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

/// Owned by a single backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    /// Realized capital: initial capital plus closed-trade profit, minus open commissions.
    pub capital: f64,
    pub initial_capital: f64,
    pub positions: Vec<SimulatedPosition>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    next_id: u64,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            capital: initial_capital,
            initial_capital,
            positions: Vec::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            next_id: 1,
        }
    }

    pub fn next_position_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_position(&mut self, position: SimulatedPosition) {
        self.positions.push(position);
    }

    pub fn remove_position(&mut self, id: u64) -> Option<SimulatedPosition> {
        let idx = self.positions.iter().position(|p| p.id == id)?;
        Some(self.positions.remove(idx))
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn record_equity(&mut self, timestamp: NaiveDateTime, equity: f64) {
        self.equity_curve.push(EquityPoint { timestamp, equity });
    }

    /// Realized capital plus unrealized P&L of open positions marked at `price`.
    pub fn mark_to_market(&self, price: f64) -> f64 {
        let unrealized: f64 = self
            .positions
            .iter()
            .map(|p| p.unrealized_pnl(price))
            .sum();
        self.capital + unrealized
    }
}
