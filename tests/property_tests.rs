//! Property tests for fusion, sizing and backtest accounting.
//!
//! Uses proptest to verify:
//! 1. Fusion weights sum to one for every supported layer set
//! 2. Fusion is deterministic, including the rationale text
//! 3. Sized volumes stay inside lot bounds with risk recomputed from volume
//! 4. Backtest capital equals initial capital plus trade profits
//! 5. Seeded generator output and backoff delays stay in range

mod common;

use common::*;
use proptest::prelude::*;
use sentinel::domain::backtest::{self, BacktestConfig, EntrySignal, WARMUP_BARS};
use sentinel::domain::fusion::{fuse, weights_for};
use sentinel::domain::risk_limits::{RiskLimits, RiskLimitsUpdate};
use sentinel::domain::rng::{SeededRng, jittered_backoff};
use sentinel::domain::signal::{Direction, Layer, LayerSignals, Signal};
use sentinel::domain::sizing::{MIN_LOT, MaxLotTable, PipValueTable, SizingRequest, size};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Buy),
        Just(Direction::Sell),
        Just(Direction::Neutral),
    ]
}

fn arb_signal(layer: Layer) -> impl Strategy<Value = Signal> {
    (arb_direction(), 0.0..=1.0_f64, 0.0..=1.0_f64, 0usize..500).prop_map(
        move |(direction, strength, confidence, i)| Signal {
            layer,
            direction,
            strength,
            confidence,
            timestamp: ts(i),
        },
    )
}

/// Two or three layers present.
fn arb_layer_signals() -> impl Strategy<Value = LayerSignals> {
    (
        proptest::option::of(arb_signal(Layer::Primary)),
        proptest::option::of(arb_signal(Layer::Sequential)),
        proptest::option::of(arb_signal(Layer::Contextual)),
    )
        .prop_filter("at least two layers", |(p, s, c)| {
            [p.is_some(), s.is_some(), c.is_some()]
                .iter()
                .filter(|x| **x)
                .count()
                >= 2
        })
        .prop_map(|(primary, sequential, contextual)| LayerSignals {
            primary,
            sequential,
            contextual,
        })
}

fn limits() -> RiskLimits {
    RiskLimits::new(RiskLimitsUpdate {
        max_daily_loss: 1_000.0,
        max_drawdown_pct: 20.0,
        max_risk_per_trade_pct: 5.0,
        max_concurrent_positions: 5,
        capital_protection_enabled: true,
    })
    .unwrap()
}

// ── 1. Weight sums ───────────────────────────────────────────────────

#[test]
fn weights_sum_to_one_for_supported_sets() {
    let supported = [
        (true, true, true),
        (true, true, false),
        (true, false, true),
        (false, true, true),
    ];
    for (p, s, c) in supported {
        let weights = weights_for(p, s, c).unwrap();
        assert!((weights.sum() - 1.0).abs() <= 1e-9, "{p} {s} {c}: {}", weights.sum());
    }
    for (p, s, c) in [(true, false, false), (false, true, false), (false, false, true), (false, false, false)] {
        assert!(weights_for(p, s, c).is_none());
    }
}

proptest! {
    // ── 2. Fusion determinism ────────────────────────────────────────

    #[test]
    fn fusion_is_deterministic(signals in arb_layer_signals(), seed in any::<u64>()) {
        let a = fuse(&signals, seed).unwrap();
        let b = fuse(&signals, seed).unwrap();
        prop_assert_eq!(&a.rationale, &b.rationale);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn fused_values_stay_in_unit_range(signals in arb_layer_signals()) {
        let fused = fuse(&signals, 1).unwrap();
        prop_assert!(fused.score >= -1e-12 && fused.score <= 1.0 + 1e-9);
        let confidences: Vec<f64> = signals.present().iter().map(|s| s.confidence).collect();
        let lo = confidences.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = confidences.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(fused.confidence >= lo - 1e-12 && fused.confidence <= hi + 1e-12);
        prop_assert_eq!(fused.contributing_layers.len(), signals.count());
    }

    // ── 3. Sizing bounds ─────────────────────────────────────────────

    #[test]
    fn sized_volume_within_bounds(
        equity in 100.0..1_000_000.0_f64,
        pct in 0.1..=5.0_f64,
        stop in 0.5..500.0_f64,
        pip_value in 0.1..20.0_f64,
        metal in any::<bool>(),
    ) {
        let symbol = if metal { "XAUUSD" } else { "EURUSD" };
        let pips = PipValueTable::new().with(symbol, pip_value);
        let lots = MaxLotTable::new();
        let result = size(
            &SizingRequest {
                equity,
                risk_per_trade_pct: pct,
                stop_distance_pips: stop,
                symbol: symbol.to_string(),
                seed: 7,
            },
            &limits(),
            &pips,
            &lots,
        )
        .unwrap();

        prop_assert!(result.volume >= MIN_LOT);
        prop_assert!(result.volume <= lots.max_lot(symbol));
        let cents = result.volume * 100.0;
        prop_assert!((cents - cents.round()).abs() < 1e-6);
        prop_assert!((result.risk_amount - result.volume * stop * pip_value).abs() < 1e-6);
    }

    // ── 4. Backtest accounting ───────────────────────────────────────

    #[test]
    fn capital_is_initial_plus_trade_profits(
        commission in 0.0..5.0_f64,
        slippage in 0.0..0.5_f64,
        step in -1.0..1.0_f64,
        entries in proptest::collection::vec((0usize..60, any::<bool>(), 0.5..5.0_f64), 0..6),
    ) {
        let bars = trending_bars(WARMUP_BARS + 60, 500.0, step);
        let config = BacktestConfig {
            commission,
            slippage,
            max_positions: 3,
            ..Default::default()
        };
        let result = backtest::run(&bars, &config, |history, i| {
            let close = history[i].close;
            entries
                .iter()
                .find(|(at, _, _)| WARMUP_BARS + at == i)
                .map(|&(_, buy, distance)| {
                    if buy {
                        EntrySignal { direction: Direction::Buy, stop_loss: close - distance, take_profit: close + distance }
                    } else {
                        EntrySignal { direction: Direction::Sell, stop_loss: close + distance, take_profit: close - distance }
                    }
                })
        });

        let profits: f64 = result.trades.iter().map(|t| t.profit).sum();
        prop_assert!((result.final_capital - (result.initial_capital + profits)).abs() < 1e-6);
        prop_assert_eq!(result.metrics.total_trades, result.trades.len());
        prop_assert_eq!(
            result.metrics.winning_trades + result.metrics.losing_trades
                + result.trades.iter().filter(|t| t.profit == 0.0).count(),
            result.trades.len()
        );
        prop_assert_eq!(result.equity_curve.len(), 60);
        let last = result.equity_curve.last().unwrap();
        prop_assert!((last.equity - result.final_capital).abs() < 1e-6);
    }

    // ── 5. Seeded generator ──────────────────────────────────────────

    #[test]
    fn generator_values_in_unit_interval(seed in any::<u64>()) {
        let mut rng = SeededRng::new(seed);
        for _ in 0..50 {
            let v = rng.next_f64();
            prop_assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn backoff_within_jitter_band(seed in any::<u64>(), base in 1u64..5_000, attempt in 0u32..10) {
        let mut rng = SeededRng::new(seed);
        let delay = jittered_backoff(base, attempt, &mut rng);
        let step = base * (1u64 << attempt);
        prop_assert!(delay as f64 >= step as f64 * 0.5 - 1.0);
        prop_assert!(delay <= step);
    }
}
