//! Performance metrics over closed trades and the equity curve.

use super::portfolio::{EquityPoint, Portfolio};
use super::position::Trade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// winners / total, as a 0..1 fraction.
    pub win_rate: f64,
    pub gross_profit: f64,
    /// Positive magnitude of losing trades.
    pub gross_loss: f64,
    pub net_profit: f64,
    pub profit_factor: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub sharpe_ratio: f64,
    /// Currency.
    pub max_drawdown: f64,
    /// Percent of the peak in force at the trough, 0..100.
    pub max_drawdown_percentage: f64,
    pub total_return_pct: f64,
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio) -> Self {
        let trades = &portfolio.trades;
        let initial_capital = portfolio.initial_capital;

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in trades {
            let profit = trade.profit;
            if trade.is_winner() {
                winning_trades += 1;
                gross_profit += profit;
                largest_win = largest_win.max(profit);
            } else if trade.is_loser() {
                losing_trades += 1;
                gross_loss += profit.abs();
                largest_loss = largest_loss.max(profit.abs());
            }
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64
        } else {
            0.0
        };

        let average_win = if winning_trades > 0 {
            gross_profit / winning_trades as f64
        } else {
            0.0
        };
        let average_loss = if losing_trades > 0 {
            gross_loss / losing_trades as f64
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_percentage) =
            compute_drawdown(&portfolio.equity_curve, initial_capital);

        let total_return_pct = if initial_capital > 0.0 {
            (portfolio.capital - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        Metrics {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            gross_profit,
            gross_loss,
            net_profit: gross_profit - gross_loss,
            profit_factor: profit_factor(gross_profit, gross_loss),
            average_win,
            average_loss,
            largest_win,
            largest_loss,
            sharpe_ratio: sharpe_ratio(trades),
            max_drawdown,
            max_drawdown_percentage,
            total_return_pct,
        }
    }
}

/// gross_profit / gross_loss; `INFINITY` with no losses but some profit, `0`
/// when both are zero.
pub fn profit_factor(gross_profit: f64, gross_loss: f64) -> f64 {
    if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// mean / population stddev of per-trade return percentages, annualized by
/// sqrt(252). A zero stddev is replaced by 1.
pub fn sharpe_ratio(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let n = trades.len() as f64;
    let mean = trades.iter().map(|t| t.profit_percentage).sum::<f64>() / n;
    let variance = trades
        .iter()
        .map(|t| (t.profit_percentage - mean).powi(2))
        .sum::<f64>()
        / n;
    let stddev = variance.sqrt();
    let stddev = if stddev == 0.0 { 1.0 } else { stddev };
    mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Largest peak-to-trough drop as (currency, percent of peak). The running
/// peak starts at `initial_capital`.
pub fn compute_drawdown(equity_curve: &[EquityPoint], initial_capital: f64) -> (f64, f64) {
    let mut peak = initial_capital;
    let mut max_dd = 0.0_f64;
    let mut max_dd_pct = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
            continue;
        }
        let dd = peak - point.equity;
        if dd > max_dd {
            max_dd = dd;
            max_dd_pct = if peak > 0.0 { dd / peak * 100.0 } else { 0.0 };
        }
    }

    (max_dd, max_dd_pct)
}
