//! CLI integration tests.
//!
//! Tests cover:
//! - Config files on disk through `FileConfigAdapter` and the builders
//! - `validate`, `backtest` and `decide` commands end to end, with CSV data
//!   and journal files in temporary directories
//! - Exit codes for config, data and gate failures

mod common;

use clap::Parser;
use common::*;
use sentinel::adapters::file_config_adapter::FileConfigAdapter;
use sentinel::cli::{self, Cli};
use sentinel::domain::config_validation::validate_all;
use sentinel::domain::error::SentinelError;
use sentinel::domain::signal::Direction;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[backtest]
initial_capital = 10000
risk_per_trade = 0.02
commission = 0.0
slippage = 0.0
max_positions = 1

[risk]
max_daily_loss = 500
max_drawdown_pct = 10
max_risk_per_trade_pct = 2
max_concurrent_positions = 3
capital_protection_enabled = true

[auto_trading]
max_daily_trades = 10
default_sl_points = 2
default_tp_points = 4
min_confidence = 0.5
risk_per_trade_pct = 1.0

[pip_values]
XAUUSD = 1.0

[max_lots]
XAUUSD = 50
"#;

fn exit_code_of(args: &[&str]) -> ExitCode {
    cli::run(Cli::try_parse_from(args).unwrap())
}

fn assert_exit(code: ExitCode, expected: u8) {
    assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::from(expected)));
}

fn write_market_data(dir: &Path) {
    fs::write(dir.join("XAUUSD.csv"), bars_csv(&trending_bars(200, 100.0, 1.0))).unwrap();
    fs::write(
        dir.join("XAUUSD_signals.csv"),
        signals_csv(&agreeing_pair(110, Direction::Buy)),
    )
    .unwrap();
}

mod config_loading {
    use super::*;

    #[test]
    fn valid_file_passes_validation() {
        let file = write_temp_ini(VALID_INI);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert!(validate_all(&adapter).is_ok());
    }

    #[test]
    fn builders_read_file_values() {
        let file = write_temp_ini(VALID_INI);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();

        let bt = cli::build_backtest_config(&adapter);
        assert_eq!(bt.initial_capital, 10_000.0);
        assert_eq!(bt.max_positions, 1);

        let auto = cli::build_auto_trading_config(&adapter);
        assert_eq!(auto.default_sl_points, 2.0);
        assert_eq!(auto.min_confidence, 0.5);

        let limits = cli::build_risk_limits(&adapter).unwrap();
        assert_eq!(limits.max_daily_loss(), 500.0);

        assert_eq!(cli::build_pip_values(&adapter).unwrap().get("XAUUSD"), Some(1.0));
        assert_eq!(cli::build_max_lots(&adapter).unwrap().max_lot("XAUUSD"), 50.0);
    }

    #[test]
    fn disabled_capital_protection_refused() {
        let ini = VALID_INI.replace(
            "capital_protection_enabled = true",
            "capital_protection_enabled = false",
        );
        let file = write_temp_ini(&ini);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert!(matches!(
            cli::build_risk_limits(&adapter),
            Err(SentinelError::CapitalProtectionRequired)
        ));
    }

    #[test]
    fn load_config_missing_file_is_config_error() {
        let result = cli::load_config(&"/nonexistent/path/config.ini".into());
        assert_exit(result.err().unwrap(), 2);
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn valid_config_succeeds() {
        let file = write_temp_ini(VALID_INI);
        let path = file.path().to_str().unwrap();
        assert_exit(exit_code_of(&["sentinel", "validate", "-c", path]), 0);
    }

    #[test]
    fn out_of_range_value_exits_with_config_code() {
        let ini = VALID_INI.replace("max_drawdown_pct = 10", "max_drawdown_pct = 75");
        let file = write_temp_ini(&ini);
        let path = file.path().to_str().unwrap();
        assert_exit(exit_code_of(&["sentinel", "validate", "-c", path]), 2);
    }

    #[test]
    fn missing_pip_values_exits_with_config_code() {
        let ini = VALID_INI.replace("XAUUSD = 1.0", "");
        let file = write_temp_ini(&ini);
        let path = file.path().to_str().unwrap();
        assert_exit(exit_code_of(&["sentinel", "validate", "-c", path]), 2);
    }

    #[test]
    fn nan_capital_exits_with_config_code() {
        let ini = VALID_INI.replace("initial_capital = 10000", "initial_capital = NaN");
        let file = write_temp_ini(&ini);
        let path = file.path().to_str().unwrap();
        assert_exit(exit_code_of(&["sentinel", "validate", "-c", path]), 2);
    }
}

mod backtest_command {
    use super::*;

    #[test]
    fn backtest_writes_journal() {
        let data = TempDir::new().unwrap();
        write_market_data(data.path());
        let journal = TempDir::new().unwrap();
        let file = write_temp_ini(VALID_INI);

        let code = exit_code_of(&[
            "sentinel",
            "backtest",
            "-c",
            file.path().to_str().unwrap(),
            "-d",
            data.path().to_str().unwrap(),
            "-s",
            "XAUUSD",
            "-j",
            journal.path().to_str().unwrap(),
        ]);
        assert_exit(code, 0);

        let trades = fs::read_to_string(journal.path().join("trades.csv")).unwrap();
        let lines: Vec<&str> = trades.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("XAUUSD,BUY,"));
        assert!(lines[1].ends_with(",TAKE_PROFIT"));

        let events = fs::read_to_string(journal.path().join("events.csv")).unwrap();
        assert!(events.contains("BACKTEST_START"));
        assert!(events.contains("BACKTEST_END"));
    }

    #[test]
    fn missing_data_exits_with_data_code() {
        let data = TempDir::new().unwrap();
        let file = write_temp_ini(VALID_INI);
        let code = exit_code_of(&[
            "sentinel",
            "backtest",
            "-c",
            file.path().to_str().unwrap(),
            "-d",
            data.path().to_str().unwrap(),
            "-s",
            "XAUUSD",
        ]);
        assert_exit(code, 3);
    }

    #[test]
    fn short_history_exits_with_insufficient_data_code() {
        let data = TempDir::new().unwrap();
        fs::write(data.path().join("XAUUSD.csv"), bars_csv(&flat_bars(50, 100.0))).unwrap();
        let file = write_temp_ini(VALID_INI);
        let code = exit_code_of(&[
            "sentinel",
            "backtest",
            "-c",
            file.path().to_str().unwrap(),
            "-d",
            data.path().to_str().unwrap(),
            "-s",
            "XAUUSD",
        ]);
        assert_exit(code, 5);
    }
}

mod decide_command {
    use super::*;

    fn decide_args<'a>(config: &'a str, data: &'a str, extra: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec![
            "sentinel", "decide", "-c", config, "-d", data, "-s", "XAUUSD", "--price", "2350",
            "--equity", "10000",
        ];
        args.extend_from_slice(extra);
        args
    }

    #[test]
    fn agreeing_layers_produce_order() {
        let data = TempDir::new().unwrap();
        write_market_data(data.path());
        let file = write_temp_ini(VALID_INI);
        let args = decide_args(
            file.path().to_str().unwrap(),
            data.path().to_str().unwrap(),
            &[],
        );
        assert_exit(exit_code_of(&args), 0);
    }

    #[test]
    fn gate_denial_exits_with_sizing_code() {
        let data = TempDir::new().unwrap();
        write_market_data(data.path());
        let file = write_temp_ini(VALID_INI);
        let args = decide_args(
            file.path().to_str().unwrap(),
            data.path().to_str().unwrap(),
            &["--open-positions", "3"],
        );
        assert_exit(exit_code_of(&args), 6);
    }

    #[test]
    fn missing_signals_exits_with_data_code() {
        let data = TempDir::new().unwrap();
        let file = write_temp_ini(VALID_INI);
        let args = decide_args(
            file.path().to_str().unwrap(),
            data.path().to_str().unwrap(),
            &[],
        );
        assert_exit(exit_code_of(&args), 3);
    }
}
