//! Position sizing: equity, risk percentage, and stop distance to a lot size.

use std::collections::HashMap;
use tracing::debug;

use super::error::SizingError;
use super::risk_limits::RiskLimits;

pub const MIN_LOT: f64 = 0.01;
pub const DEFAULT_METAL_MAX_LOT: f64 = 50.0;
pub const DEFAULT_MAJOR_MAX_LOT: f64 = 100.0;
pub const MIN_EQUITY: f64 = 100.0;

const METAL_PREFIXES: [&str; 4] = ["XAU", "XAG", "XPT", "XPD"];

/// Monetary value of one pip per standard lot, keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipValueTable {
    values: HashMap<String, f64>,
}

impl PipValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: &str, pip_value: f64) -> Self {
        self.insert(symbol, pip_value);
        self
    }

    pub fn insert(&mut self, symbol: &str, pip_value: f64) {
        self.values.insert(symbol.to_uppercase(), pip_value);
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.values.get(&symbol.to_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Per-symbol lot caps. Symbols without an entry fall back to 50 lots for
/// metals and 100 lots for everything else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaxLotTable {
    caps: HashMap<String, f64>,
}

impl MaxLotTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: &str, max_lot: f64) -> Self {
        self.insert(symbol, max_lot);
        self
    }

    pub fn insert(&mut self, symbol: &str, max_lot: f64) {
        self.caps.insert(symbol.to_uppercase(), max_lot);
    }

    pub fn max_lot(&self, symbol: &str) -> f64 {
        let symbol = symbol.to_uppercase();
        match self.caps.get(&symbol) {
            Some(cap) => *cap,
            None if is_metal(&symbol) => DEFAULT_METAL_MAX_LOT,
            None => DEFAULT_MAJOR_MAX_LOT,
        }
    }
}

pub fn is_metal(symbol: &str) -> bool {
    let symbol = symbol.to_uppercase();
    METAL_PREFIXES.iter().any(|p| symbol.starts_with(p))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizingRequest {
    pub equity: f64,
    /// Percent of equity, 0.1..5.0
    pub risk_per_trade_pct: f64,
    pub stop_distance_pips: f64,
    pub symbol: String,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizingResult {
    /// Lots, two decimals.
    pub volume: f64,
    /// Risk implied by `volume`, not by the request.
    pub risk_amount: f64,
    pub symbol: String,
    pub seed: u64,
}

/// Round half-up to two decimals (standard lot precision). Inputs are non-negative.
pub fn round_lots(volume: f64) -> f64 {
    (volume * 100.0).round() / 100.0
}

pub fn size(
    request: &SizingRequest,
    limits: &RiskLimits,
    pip_values: &PipValueTable,
    max_lots: &MaxLotTable,
) -> Result<SizingResult, SizingError> {
    if request.risk_per_trade_pct > limits.max_risk_per_trade_pct() {
        return Err(SizingError::RiskLimitExceeded {
            requested: request.risk_per_trade_pct,
            max: limits.max_risk_per_trade_pct(),
        });
    }
    let pip_value = pip_values
        .get(&request.symbol)
        .ok_or_else(|| SizingError::UnsupportedSymbol {
            symbol: request.symbol.clone(),
        })?;
    if !(pip_value.is_finite() && pip_value > 0.0) {
        return Err(SizingError::InvalidSymbolTable {
            symbol: request.symbol.clone(),
            field: "pip value",
            value: pip_value,
        });
    }
    let max_lot = max_lots.max_lot(&request.symbol);
    if !(max_lot.is_finite() && max_lot >= MIN_LOT) {
        return Err(SizingError::InvalidSymbolTable {
            symbol: request.symbol.clone(),
            field: "max lot",
            value: max_lot,
        });
    }
    if request.stop_distance_pips.is_nan() || request.stop_distance_pips <= 0.0 {
        return Err(SizingError::InvalidStopDistance {
            pips: request.stop_distance_pips,
        });
    }
    if request.equity.is_nan() || request.equity < MIN_EQUITY {
        return Err(SizingError::InvalidEquity {
            equity: request.equity,
        });
    }
    if !(0.1..=5.0).contains(&request.risk_per_trade_pct) {
        return Err(SizingError::InvalidRiskPercent {
            pct: request.risk_per_trade_pct,
        });
    }

    let requested_risk = request.equity * request.risk_per_trade_pct / 100.0;
    let raw_volume = requested_risk / (request.stop_distance_pips * pip_value);
    let volume = round_lots(raw_volume).clamp(MIN_LOT, max_lot);
    let risk_amount = volume * request.stop_distance_pips * pip_value;

    debug!(
        symbol = %request.symbol,
        raw_volume,
        volume,
        requested_risk,
        risk_amount,
        "sized position"
    );

    Ok(SizingResult {
        volume,
        risk_amount,
        symbol: request.symbol.clone(),
        seed: request.seed,
    })
}
