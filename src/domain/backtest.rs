//! Bar-by-bar backtest simulator.
//!
//! Each position follows `Opened -> (StopLoss | TakeProfit | EndOfBacktest) -> Closed`.
//! A run owns its portfolio; nothing is shared between runs.

use tracing::{debug, info};

use super::execution::{self, EntryResult, ExecutionConfig};
use super::metrics::Metrics;
use super::ohlcv::Bar;
use super::portfolio::{EquityPoint, Portfolio};
use super::position::{Side, Trade};
use super::signal::Direction;

/// Bars reserved as context for the signal function before the first step.
pub const WARMUP_BARS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Fraction of capital risked per trade, e.g. 0.02.
    pub risk_per_trade: f64,
    /// Flat fee per open and per close.
    pub commission: f64,
    /// Price units, adverse on entry.
    pub slippage: f64,
    pub max_positions: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            risk_per_trade: 0.02,
            commission: 0.0,
            slippage: 0.0,
            max_positions: 1,
        }
    }
}

impl BacktestConfig {
    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission: self.commission,
            slippage: self.slippage,
            risk_per_trade: self.risk_per_trade,
        }
    }
}

/// What a signal function asks the simulator to do on the current bar.
/// `Direction::Neutral` means hold.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySignal {
    pub direction: Direction,
    pub stop_loss: f64,
    pub take_profit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub metrics: Metrics,
}

/// Replays `bars` from index [`WARMUP_BARS`]. Per bar: close positions whose
/// stop or target the bar reaches, ask `signal_fn` for an entry when below
/// `max_positions`, then record mark-to-market equity. Positions still open
/// after the last bar close at its close price.
///
/// `signal_fn` receives the bars up to and including the current one, plus
/// the current index.
pub fn run<F>(bars: &[Bar], config: &BacktestConfig, mut signal_fn: F) -> BacktestResult
where
    F: FnMut(&[Bar], usize) -> Option<EntrySignal>,
{
    let exec = config.execution();
    let mut portfolio = Portfolio::new(config.initial_capital);

    for i in WARMUP_BARS..bars.len() {
        let bar = &bars[i];

        execution::check_exits(&mut portfolio, bar, &exec);

        if portfolio.position_count() < config.max_positions {
            if let Some(signal) = signal_fn(&bars[..=i], i) {
                if let Some(side) = Side::from_direction(signal.direction) {
                    if let EntryResult::Entered { id, .. } = execution::open_position(
                        &mut portfolio,
                        side,
                        bar.close,
                        signal.stop_loss,
                        signal.take_profit,
                        bar.timestamp,
                        &exec,
                    ) {
                        debug!(id, index = i, "signal entered");
                    }
                }
            }
        }

        let equity = portfolio.mark_to_market(bar.close);
        portfolio.record_equity(bar.timestamp, equity);
    }

    if let Some(last) = bars.last() {
        if execution::close_all(&mut portfolio, last.close, last.timestamp, &exec) > 0 {
            let capital = portfolio.capital;
            if let Some(point) = portfolio.equity_curve.last_mut() {
                point.equity = capital;
            }
        }
    }

    let metrics = Metrics::compute(&portfolio);
    info!(
        bars = bars.len(),
        trades = metrics.total_trades,
        net_profit = metrics.net_profit,
        final_capital = portfolio.capital,
        "backtest complete"
    );

    BacktestResult {
        final_capital: portfolio.capital,
        initial_capital: portfolio.initial_capital,
        trades: portfolio.trades,
        equity_curve: portfolio.equity_curve,
        metrics,
    }
}
