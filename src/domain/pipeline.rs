//! Decision pipeline: fuse layer signals, gate on risk limits, size the order.
//!
//! Stops short of placing anything. The result is an [`OrderIntent`] a broker
//! adapter could submit, or a [`TradeDecision::Hold`].

use std::fmt;

use tracing::info;

use super::error::SentinelError;
use super::fusion::{FusedSignal, fuse};
use super::position::Side;
use super::risk_limits::{AutoTradingConfig, RiskLimits, TradingState, is_trade_allowed};
use super::rng::SeededRng;
use super::signal::{LayerSignals, Signal};
use super::sizing::{MaxLotTable, PipValueTable, SizingRequest, SizingResult, size};

/// Everything `decide` reads besides the signals themselves.
#[derive(Debug, Clone)]
pub struct DecisionContext<'a> {
    pub symbol: &'a str,
    /// Reference price the stop and target are measured from.
    pub entry_price: f64,
    pub equity: f64,
    pub state: TradingState,
    pub limits: &'a RiskLimits,
    pub auto: &'a AutoTradingConfig,
    pub pip_values: &'a PipValueTable,
    pub max_lots: &'a MaxLotTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    Neutral,
    LowConfidence,
}

impl fmt::Display for HoldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoldReason::Neutral => f.write_str("neutral fused direction"),
            HoldReason::LowConfidence => f.write_str("confidence below minimum"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderIntent {
    pub fused: FusedSignal,
    pub side: Side,
    pub symbol: String,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub sizing: SizingResult,
    pub client_tag: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TradeDecision {
    Hold { fused: FusedSignal, reason: HoldReason },
    Enter(OrderIntent),
}

impl TradeDecision {
    pub fn fused(&self) -> &FusedSignal {
        match self {
            TradeDecision::Hold { fused, .. } => fused,
            TradeDecision::Enter(intent) => &intent.fused,
        }
    }
}

/// Layer signals sharing the most recent timestamp in `signals`.
pub fn latest_layer_signals(signals: &[Signal]) -> Option<LayerSignals> {
    let latest = signals.iter().map(|s| s.timestamp).max()?;
    let mut layers = LayerSignals::default();
    for signal in signals.iter().filter(|s| s.timestamp == latest) {
        layers.insert(signal.clone());
    }
    Some(layers)
}

/// Tag that identifies an order produced from `seed`. Same seed, same tag.
pub fn client_tag(seed: u64) -> String {
    format!("SNT-{:06}", SeededRng::new(seed).next_u32())
}

/// Fuse, then hold on Neutral or low confidence, then gate, then size.
///
/// Gate denials come back as `SentinelError::TradeDenied`; sizing failures as
/// `SentinelError::Sizing`.
pub fn decide(
    signals: &LayerSignals,
    seed: u64,
    ctx: &DecisionContext<'_>,
) -> Result<TradeDecision, SentinelError> {
    let fused = fuse(signals, seed)?;

    let Some(side) = Side::from_direction(fused.direction) else {
        return Ok(TradeDecision::Hold {
            fused,
            reason: HoldReason::Neutral,
        });
    };
    if fused.confidence < ctx.auto.min_confidence {
        return Ok(TradeDecision::Hold {
            fused,
            reason: HoldReason::LowConfidence,
        });
    }

    is_trade_allowed(ctx.limits, ctx.auto, &ctx.state).into_result()?;

    let sizing = size(
        &SizingRequest {
            equity: ctx.equity,
            risk_per_trade_pct: ctx.auto.risk_per_trade_pct,
            stop_distance_pips: ctx.auto.default_sl_points,
            symbol: ctx.symbol.to_string(),
            seed,
        },
        ctx.limits,
        ctx.pip_values,
        ctx.max_lots,
    )?;

    let (stop_loss, take_profit) = match side {
        Side::Buy => (
            ctx.entry_price - ctx.auto.default_sl_points,
            ctx.entry_price + ctx.auto.default_tp_points,
        ),
        Side::Sell => (
            ctx.entry_price + ctx.auto.default_sl_points,
            ctx.entry_price - ctx.auto.default_tp_points,
        ),
    };

    let client_tag = client_tag(seed);
    info!(
        symbol = ctx.symbol,
        %side,
        volume = sizing.volume,
        stop_loss,
        take_profit,
        client_tag = %client_tag,
        "order intent"
    );

    Ok(TradeDecision::Enter(OrderIntent {
        fused,
        side,
        symbol: ctx.symbol.to_string(),
        entry_price: ctx.entry_price,
        stop_loss,
        take_profit,
        sizing,
        client_tag,
    }))
}
