//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_trade_journal::CsvTradeJournal;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult, WARMUP_BARS};
use crate::domain::config_validation::{
    read_risk_update, validate_all, validate_auto_trading_config, validate_backtest_config,
    validate_risk_config, validate_symbol_tables,
};
use crate::domain::error::SentinelError;
use crate::domain::pipeline::{self, DecisionContext, TradeDecision};
use crate::domain::risk_limits::{AutoTradingConfig, RiskLimits, TradingState};
use crate::domain::sizing::{MaxLotTable, PipValueTable};
use crate::domain::strategy::FusedSignalStrategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::trade_journal_port::TradeJournalPort;

#[derive(Parser, Debug)]
#[command(name = "sentinel", about = "Layered signal fusion, risk gating and backtesting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay recorded layer signals against bars
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding <SYMBOL>.csv and <SYMBOL>_signals.csv
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(short, long)]
        symbol: String,
        /// Append trades.csv and events.csv here
        #[arg(short, long)]
        journal: Option<PathBuf>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Fuse the latest layer signals and print the resulting decision
    Decide {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(short, long)]
        symbol: String,
        /// Entry reference price
        #[arg(long)]
        price: f64,
        #[arg(long)]
        equity: f64,
        #[arg(long, default_value_t = 0.0)]
        daily_loss: f64,
        #[arg(long, default_value_t = 0)]
        daily_trades: u32,
        #[arg(long, default_value_t = 0.0)]
        drawdown_pct: f64,
        #[arg(long, default_value_t = 0)]
        open_positions: u32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            symbol,
            journal,
            seed,
        } => run_backtest(&config, data_dir, &symbol, journal.as_ref(), seed),
        Command::Decide {
            config,
            data_dir,
            symbol,
            price,
            equity,
            daily_loss,
            daily_trades,
            drawdown_pct,
            open_positions,
            seed,
        } => {
            let state = TradingState {
                daily_loss_to_date: daily_loss,
                daily_trade_count: daily_trades,
                current_drawdown_pct: drawdown_pct,
                open_position_count: open_positions,
            };
            run_decide(&config, data_dir, &symbol, price, equity, state, seed)
        }
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SentinelError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: SentinelError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

fn run_backtest(
    config_path: &PathBuf,
    data_dir: PathBuf,
    symbol: &str,
    journal_dir: Option<&PathBuf>,
    seed: u64,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter).and_then(|_| validate_auto_trading_config(&adapter)) {
        return fail(e);
    }
    let bt_config = build_backtest_config(&adapter);
    let auto = build_auto_trading_config(&adapter);

    let journal = match journal_dir.map(CsvTradeJournal::new).transpose() {
        Ok(j) => j,
        Err(e) => return fail(e),
    };

    let data_port = CsvAdapter::new(data_dir);
    let result = match run_backtest_pipeline(
        &data_port,
        journal.as_ref().map(|j| j as &dyn TradeJournalPort),
        symbol,
        &bt_config,
        &auto,
        seed,
    ) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    print_summary(symbol, &result);
    if let Some(j) = &journal {
        eprintln!("\nJournal written to: {}", j.trades_path().display());
    }
    ExitCode::SUCCESS
}

/// Loads data through `data_port`, runs the fused-signal strategy, and
/// journals every closed trade plus start/end events.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    journal: Option<&dyn TradeJournalPort>,
    symbol: &str,
    bt_config: &BacktestConfig,
    auto: &AutoTradingConfig,
    seed: u64,
) -> Result<BacktestResult, SentinelError> {
    let bars = data_port.fetch_bars(symbol)?;
    if bars.len() <= WARMUP_BARS {
        return Err(SentinelError::InsufficientData {
            symbol: symbol.to_string(),
            bars: bars.len(),
            minimum: WARMUP_BARS,
        });
    }
    let signals = data_port.fetch_layer_signals(symbol)?;

    eprintln!(
        "Running backtest: {} bars, {} layer signals for {}",
        bars.len(),
        signals.len(),
        symbol
    );

    let strategy = FusedSignalStrategy::new(signals, auto.clone(), seed);
    eprintln!("  {} bar timestamp(s) carry layer signals", strategy.bar_count());
    let result = backtest_engine::run(&bars, bt_config, |history, i| strategy.signal(history, i));

    if let Some(journal) = journal {
        let (first, last) = (&bars[WARMUP_BARS], &bars[bars.len() - 1]);
        journal.record_event(
            first.timestamp,
            "BACKTEST_START",
            &format!("{} seed={} capital={:.2}", symbol, seed, bt_config.initial_capital),
        )?;
        for trade in &result.trades {
            journal.record_trade(symbol, trade)?;
        }
        journal.record_event(
            last.timestamp,
            "BACKTEST_END",
            &format!(
                "{} trades={} final_capital={:.2}",
                symbol, result.metrics.total_trades, result.final_capital
            ),
        )?;
    }

    Ok(result)
}

fn print_summary(symbol: &str, result: &BacktestResult) {
    let m = &result.metrics;
    eprintln!("\n=== {} Results ===", symbol);
    eprintln!("Initial Capital:  {:.2}", result.initial_capital);
    eprintln!("Final Capital:    {:.2}", result.final_capital);
    eprintln!("Total Return:     {:.2}%", m.total_return_pct);
    eprintln!("Net Profit:       {:.2}", m.net_profit);
    eprintln!("Total Trades:     {}", m.total_trades);
    eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", m.profit_factor);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!(
        "Max Drawdown:     {:.2} ({:.1}%)",
        m.max_drawdown, m.max_drawdown_percentage
    );
    eprintln!("Largest Win:      {:.2}", m.largest_win);
    eprintln!("Largest Loss:     {:.2}", m.largest_loss);
}

fn run_decide(
    config_path: &PathBuf,
    data_dir: PathBuf,
    symbol: &str,
    price: f64,
    equity: f64,
    state: TradingState,
    seed: u64,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_risk_config(&adapter)
        .and_then(|_| validate_auto_trading_config(&adapter))
        .and_then(|_| validate_symbol_tables(&adapter))
    {
        return fail(e);
    }

    let built = build_risk_limits(&adapter).and_then(|limits| {
        Ok((limits, build_pip_values(&adapter)?, build_max_lots(&adapter)?))
    });
    let (limits, pip_values, max_lots) = match built {
        Ok(b) => b,
        Err(e) => return fail(e),
    };
    let auto = build_auto_trading_config(&adapter);

    let signals = match CsvAdapter::new(data_dir).fetch_layer_signals(symbol) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let Some(layers) = pipeline::latest_layer_signals(&signals) else {
        return fail(SentinelError::Data {
            reason: format!("no layer signals recorded for {}", symbol),
        });
    };

    let symbol = symbol.to_uppercase();
    let ctx = DecisionContext {
        symbol: &symbol,
        entry_price: price,
        equity,
        state,
        limits: &limits,
        auto: &auto,
        pip_values: &pip_values,
        max_lots: &max_lots,
    };

    let decision = match pipeline::decide(&layers, seed, &ctx) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };

    eprintln!("{}", decision.fused().rationale);
    match decision {
        TradeDecision::Hold { fused, reason } => {
            println!("HOLD {} ({}, confidence {:.4})", symbol, reason, fused.confidence);
        }
        TradeDecision::Enter(intent) => {
            println!(
                "ENTER {} {} {:.2} lots @ {} sl={} tp={} risk={:.2} tag={}",
                intent.side,
                intent.symbol,
                intent.sizing.volume,
                intent.entry_price,
                intent.stop_loss,
                intent.take_profit,
                intent.sizing.risk_amount,
                intent.client_tag,
            );
        }
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&adapter) {
        return fail(e);
    }

    let pip_values = match build_pip_values(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    eprintln!("  backtest:     {:?}", build_backtest_config(&adapter));
    eprintln!("  auto_trading: {:?}", build_auto_trading_config(&adapter));
    eprintln!("  pip values:   {} symbol(s)", pip_values.len());
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

/// `[backtest]` with defaults for absent keys. Validate first.
pub fn build_backtest_config(adapter: &dyn ConfigPort) -> BacktestConfig {
    let defaults = BacktestConfig::default();
    BacktestConfig {
        initial_capital: adapter.get_double("backtest", "initial_capital", defaults.initial_capital),
        risk_per_trade: adapter.get_double("backtest", "risk_per_trade", defaults.risk_per_trade),
        commission: adapter.get_double("backtest", "commission", defaults.commission),
        slippage: adapter.get_double("backtest", "slippage", defaults.slippage),
        max_positions: adapter
            .get_int("backtest", "max_positions", defaults.max_positions as i64)
            .max(1) as usize,
    }
}

pub fn build_risk_limits(adapter: &dyn ConfigPort) -> Result<RiskLimits, SentinelError> {
    RiskLimits::new(read_risk_update(adapter)?)
}

/// `[auto_trading]` with defaults for absent keys. Validate first.
pub fn build_auto_trading_config(adapter: &dyn ConfigPort) -> AutoTradingConfig {
    let defaults = AutoTradingConfig::default();
    AutoTradingConfig {
        max_daily_trades: adapter
            .get_int("auto_trading", "max_daily_trades", defaults.max_daily_trades as i64)
            .clamp(0, u32::MAX as i64) as u32,
        default_sl_points: adapter.get_double("auto_trading", "default_sl_points", defaults.default_sl_points),
        default_tp_points: adapter.get_double("auto_trading", "default_tp_points", defaults.default_tp_points),
        min_confidence: adapter.get_double("auto_trading", "min_confidence", defaults.min_confidence),
        risk_per_trade_pct: adapter.get_double("auto_trading", "risk_per_trade_pct", defaults.risk_per_trade_pct),
    }
}

pub fn build_pip_values(adapter: &dyn ConfigPort) -> Result<PipValueTable, SentinelError> {
    let mut table = PipValueTable::new();
    for (symbol, value) in adapter.get_section("pip_values") {
        table.insert(&symbol, parse_table_value("pip_values", &symbol, &value)?);
    }
    if table.is_empty() {
        return Err(SentinelError::ConfigMissing {
            section: "pip_values".to_string(),
            key: "<symbol>".to_string(),
        });
    }
    Ok(table)
}

pub fn build_max_lots(adapter: &dyn ConfigPort) -> Result<MaxLotTable, SentinelError> {
    let mut table = MaxLotTable::new();
    for (symbol, value) in adapter.get_section("max_lots") {
        table.insert(&symbol, parse_table_value("max_lots", &symbol, &value)?);
    }
    Ok(table)
}

fn parse_table_value(section: &str, symbol: &str, value: &str) -> Result<f64, SentinelError> {
    value
        .trim()
        .parse()
        .map_err(|_| SentinelError::ConfigInvalid {
            section: section.to_string(),
            key: symbol.to_string(),
            reason: "must be a number".to_string(),
        })
}
