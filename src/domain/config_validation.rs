//! Configuration validation.
//!
//! Checks every section before any domain value is built from it, reporting
//! the first problem as `ConfigMissing` or `ConfigInvalid` with section and key.

use crate::domain::error::SentinelError;
use crate::domain::risk_limits::RiskLimitsUpdate;
use crate::ports::config_port::ConfigPort;

pub fn validate_all(config: &dyn ConfigPort) -> Result<(), SentinelError> {
    validate_backtest_config(config)?;
    validate_risk_config(config)?;
    validate_auto_trading_config(config)?;
    validate_symbol_tables(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SentinelError> {
    let capital = config.get_double("backtest", "initial_capital", 10_000.0);
    if !(capital.is_finite() && capital > 0.0) {
        return Err(invalid("backtest", "initial_capital", "must be positive"));
    }
    let risk = config.get_double("backtest", "risk_per_trade", 0.02);
    if !(risk > 0.0 && risk <= 1.0) {
        return Err(invalid(
            "backtest",
            "risk_per_trade",
            "must be a fraction in (0, 1]",
        ));
    }
    for key in ["commission", "slippage"] {
        let value = config.get_double("backtest", key, 0.0);
        if !(value.is_finite() && value >= 0.0) {
            return Err(invalid("backtest", key, "must be non-negative"));
        }
    }
    if config.get_int("backtest", "max_positions", 1) < 1 {
        return Err(invalid("backtest", "max_positions", "must be at least 1"));
    }
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), SentinelError> {
    read_risk_update(config)?.validate()
}

/// Reads `[risk]` into an update. Every limit is required;
/// `capital_protection_enabled` defaults to true.
pub fn read_risk_update(config: &dyn ConfigPort) -> Result<RiskLimitsUpdate, SentinelError> {
    let max_concurrent = required_double(config, "risk", "max_concurrent_positions")?;
    if max_concurrent.fract() != 0.0 || max_concurrent < 0.0 {
        return Err(invalid(
            "risk",
            "max_concurrent_positions",
            "must be a whole number",
        ));
    }
    Ok(RiskLimitsUpdate {
        max_daily_loss: required_double(config, "risk", "max_daily_loss")?,
        max_drawdown_pct: required_double(config, "risk", "max_drawdown_pct")?,
        max_risk_per_trade_pct: required_double(config, "risk", "max_risk_per_trade_pct")?,
        max_concurrent_positions: max_concurrent.min(u32::MAX as f64) as u32,
        capital_protection_enabled: config.get_bool("risk", "capital_protection_enabled", true),
    })
}

pub fn validate_auto_trading_config(config: &dyn ConfigPort) -> Result<(), SentinelError> {
    if config.get_int("auto_trading", "max_daily_trades", 10) < 1 {
        return Err(invalid("auto_trading", "max_daily_trades", "must be at least 1"));
    }
    for (key, default) in [("default_sl_points", 10.0), ("default_tp_points", 20.0)] {
        let points = config.get_double("auto_trading", key, default);
        if !(points.is_finite() && points > 0.0) {
            return Err(invalid("auto_trading", key, "must be positive"));
        }
    }
    let min_confidence = config.get_double("auto_trading", "min_confidence", 0.0);
    if !(0.0..=1.0).contains(&min_confidence) {
        return Err(invalid(
            "auto_trading",
            "min_confidence",
            "must be between 0 and 1",
        ));
    }
    let pct = config.get_double("auto_trading", "risk_per_trade_pct", 1.0);
    if !(0.1..=5.0).contains(&pct) {
        return Err(invalid(
            "auto_trading",
            "risk_per_trade_pct",
            "must be between 0.1 and 5.0",
        ));
    }
    Ok(())
}

/// `[pip_values]` must name at least one symbol; every pip value and lot cap
/// must be a positive number.
pub fn validate_symbol_tables(config: &dyn ConfigPort) -> Result<(), SentinelError> {
    let pip_values = config.get_section("pip_values");
    if pip_values.is_empty() {
        return Err(SentinelError::ConfigMissing {
            section: "pip_values".to_string(),
            key: "<symbol>".to_string(),
        });
    }
    for (symbol, value) in &pip_values {
        positive_number("pip_values", symbol, value)?;
    }
    for (symbol, value) in config.get_section("max_lots") {
        let lots = positive_number("max_lots", &symbol, &value)?;
        if lots < 0.01 {
            return Err(invalid("max_lots", &symbol, "must be at least 0.01"));
        }
    }
    Ok(())
}

fn required_double(config: &dyn ConfigPort, section: &str, key: &str) -> Result<f64, SentinelError> {
    let raw = config
        .get_string(section, key)
        .ok_or_else(|| SentinelError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| invalid(section, key, "must be a number"))
}

fn positive_number(section: &str, key: &str, value: &str) -> Result<f64, SentinelError> {
    match value.trim().parse::<f64>() {
        Ok(v) if v > 0.0 && v.is_finite() => Ok(v),
        _ => Err(invalid(section, key, "must be a positive number")),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> SentinelError {
    SentinelError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
