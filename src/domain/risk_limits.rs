//! Operator risk envelope and the pre-trade gate.
//!
//! `RiskLimits` records are immutable. Changes go through
//! [`RiskLimitsHistory::update`], which validates the new values and appends a
//! new version instead of mutating the current one.

use tracing::info;

use super::error::{DenyReason, SentinelError};

/// A validated limits version. Fields are read-only outside this module:
///
/// ```compile_fail
/// use sentinel::domain::risk_limits::{RiskLimits, RiskLimitsUpdate};
///
/// let mut limits = RiskLimits::new(RiskLimitsUpdate {
///     max_daily_loss: 500.0,
///     max_drawdown_pct: 10.0,
///     max_risk_per_trade_pct: 2.0,
///     max_concurrent_positions: 3,
///     capital_protection_enabled: true,
/// })
/// .unwrap();
/// limits.capital_protection_enabled = false;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimits {
    version: u32,
    /// Currency, > 0.
    max_daily_loss: f64,
    /// 1..50
    max_drawdown_pct: f64,
    /// 0.1..5.0
    max_risk_per_trade_pct: f64,
    /// 1..20
    max_concurrent_positions: u32,
    capital_protection_enabled: bool,
}

/// Proposed values for a new limits version.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimitsUpdate {
    pub max_daily_loss: f64,
    pub max_drawdown_pct: f64,
    pub max_risk_per_trade_pct: f64,
    pub max_concurrent_positions: u32,
    pub capital_protection_enabled: bool,
}

impl RiskLimitsUpdate {
    pub fn validate(&self) -> Result<(), SentinelError> {
        if !self.capital_protection_enabled {
            return Err(SentinelError::CapitalProtectionRequired);
        }
        if self.max_daily_loss.is_nan() || self.max_daily_loss <= 0.0 {
            return Err(invalid("max_daily_loss", "must be positive"));
        }
        if !(1.0..=50.0).contains(&self.max_drawdown_pct) {
            return Err(invalid("max_drawdown_pct", "must be between 1 and 50"));
        }
        if !(0.1..=5.0).contains(&self.max_risk_per_trade_pct) {
            return Err(invalid(
                "max_risk_per_trade_pct",
                "must be between 0.1 and 5.0",
            ));
        }
        if !(1..=20).contains(&self.max_concurrent_positions) {
            return Err(invalid(
                "max_concurrent_positions",
                "must be between 1 and 20",
            ));
        }
        Ok(())
    }
}

impl From<&RiskLimits> for RiskLimitsUpdate {
    fn from(limits: &RiskLimits) -> Self {
        RiskLimitsUpdate {
            max_daily_loss: limits.max_daily_loss,
            max_drawdown_pct: limits.max_drawdown_pct,
            max_risk_per_trade_pct: limits.max_risk_per_trade_pct,
            max_concurrent_positions: limits.max_concurrent_positions,
            capital_protection_enabled: limits.capital_protection_enabled,
        }
    }
}

fn invalid(key: &str, reason: &str) -> SentinelError {
    SentinelError::ConfigInvalid {
        section: "risk".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

impl RiskLimits {
    /// Builds version 1 from validated values.
    pub fn new(values: RiskLimitsUpdate) -> Result<Self, SentinelError> {
        values.validate()?;
        Ok(Self::from_update(1, values))
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn max_daily_loss(&self) -> f64 {
        self.max_daily_loss
    }

    pub fn max_drawdown_pct(&self) -> f64 {
        self.max_drawdown_pct
    }

    pub fn max_risk_per_trade_pct(&self) -> f64 {
        self.max_risk_per_trade_pct
    }

    pub fn max_concurrent_positions(&self) -> u32 {
        self.max_concurrent_positions
    }

    /// Always true for a constructed record.
    pub fn capital_protection_enabled(&self) -> bool {
        self.capital_protection_enabled
    }

    fn from_update(version: u32, values: RiskLimitsUpdate) -> Self {
        RiskLimits {
            version,
            max_daily_loss: values.max_daily_loss,
            max_drawdown_pct: values.max_drawdown_pct,
            max_risk_per_trade_pct: values.max_risk_per_trade_pct,
            max_concurrent_positions: values.max_concurrent_positions,
            capital_protection_enabled: values.capital_protection_enabled,
        }
    }
}

/// Every limits version ever accepted, oldest first. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimitsHistory {
    versions: Vec<RiskLimits>,
}

impl RiskLimitsHistory {
    pub fn new(initial: RiskLimits) -> Self {
        Self {
            versions: vec![initial],
        }
    }

    pub fn current(&self) -> &RiskLimits {
        // `versions` starts with one record and only grows.
        &self.versions[self.versions.len() - 1]
    }

    pub fn versions(&self) -> &[RiskLimits] {
        &self.versions
    }

    /// Validates `values` and appends them as a new version. A rejected update
    /// leaves the history untouched.
    pub fn update(&mut self, values: RiskLimitsUpdate) -> Result<&RiskLimits, SentinelError> {
        values.validate()?;
        let version = self.current().version + 1;
        self.versions.push(RiskLimits::from_update(version, values));
        info!(version, "risk limits updated");
        Ok(self.current())
    }
}

/// Limits sourced from the auto-trading configuration rather than `RiskLimits`.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoTradingConfig {
    pub max_daily_trades: u32,
    /// Price distance from entry to the stop, in points.
    pub default_sl_points: f64,
    /// Price distance from entry to the target, in points.
    pub default_tp_points: f64,
    /// Fused confidence below this is treated as Hold. 0..1
    pub min_confidence: f64,
    /// Risk per trade requested from sizing, percent of equity.
    pub risk_per_trade_pct: f64,
}

impl Default for AutoTradingConfig {
    fn default() -> Self {
        AutoTradingConfig {
            max_daily_trades: 10,
            default_sl_points: 10.0,
            default_tp_points: 20.0,
            min_confidence: 0.0,
            risk_per_trade_pct: 1.0,
        }
    }
}

/// Account state observed at decision time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradingState {
    pub daily_loss_to_date: f64,
    pub daily_trade_count: u32,
    pub current_drawdown_pct: f64,
    pub open_position_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Allowed,
    Denied(DenyReason),
}

impl GateDecision {
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            GateDecision::Allowed => Ok(()),
            GateDecision::Denied(reason) => Err(reason),
        }
    }
}

/// Checks run in a fixed order and only the first failure is reported:
/// daily loss, daily trade count, drawdown, concurrent positions.
pub fn is_trade_allowed(
    limits: &RiskLimits,
    auto: &AutoTradingConfig,
    state: &TradingState,
) -> GateDecision {
    let decision = evaluate(limits, auto, state);
    if let GateDecision::Denied(reason) = &decision {
        info!(%reason, "trade denied by risk gate");
    }
    decision
}

fn evaluate(limits: &RiskLimits, auto: &AutoTradingConfig, state: &TradingState) -> GateDecision {
    let loss = state.daily_loss_to_date.abs();
    if loss >= limits.max_daily_loss {
        return GateDecision::Denied(DenyReason::DailyLossExceeded {
            loss,
            limit: limits.max_daily_loss,
        });
    }
    if state.daily_trade_count >= auto.max_daily_trades {
        return GateDecision::Denied(DenyReason::DailyTradeCapReached {
            count: state.daily_trade_count,
            cap: auto.max_daily_trades,
        });
    }
    if state.current_drawdown_pct >= limits.max_drawdown_pct {
        return GateDecision::Denied(DenyReason::DrawdownExceeded {
            drawdown_pct: state.current_drawdown_pct,
            limit_pct: limits.max_drawdown_pct,
        });
    }
    if state.open_position_count >= limits.max_concurrent_positions {
        return GateDecision::Denied(DenyReason::ConcurrentPositionCapReached {
            open: state.open_position_count,
            cap: limits.max_concurrent_positions,
        });
    }
    GateDecision::Allowed
}
