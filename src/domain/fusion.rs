//! Signal fusion: combines two or three layer signals into one decision.
//!
//! The score is a weighted sum of layer strengths, the confidence an unweighted
//! mean, and the direction a majority vote. Weights come from a fixed table
//! keyed by which layers are present.

use chrono::NaiveDateTime;
use tracing::debug;

use super::error::FusionError;
use super::signal::{Direction, Layer, LayerSignals, Signal};

/// Per-layer weights for one presence combination. Absent layers weigh 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerWeights {
    pub primary: f64,
    pub sequential: f64,
    pub contextual: f64,
}

impl LayerWeights {
    pub fn for_layer(&self, layer: Layer) -> f64 {
        match layer {
            Layer::Primary => self.primary,
            Layer::Sequential => self.sequential,
            Layer::Contextual => self.contextual,
        }
    }

    pub fn sum(&self) -> f64 {
        self.primary + self.sequential + self.contextual
    }
}

/// Weight table keyed by `(primary, sequential, contextual)` presence.
/// Partial combinations carry the rounded constants of the 0.5/0.3/0.2 split
/// renormalized over the layers present. Returns `None` below two layers.
pub fn weights_for(primary: bool, sequential: bool, contextual: bool) -> Option<LayerWeights> {
    let (p, s, c) = match (primary, sequential, contextual) {
        (true, true, true) => (0.50, 0.30, 0.20),
        (true, true, false) => (0.625, 0.375, 0.0),
        (true, false, true) => (0.714, 0.0, 0.286),
        (false, true, true) => (0.0, 0.6, 0.4),
        _ => return None,
    };
    Some(LayerWeights {
        primary: p,
        sequential: s,
        contextual: c,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub buy: usize,
    pub sell: usize,
    pub neutral: usize,
}

impl VoteTally {
    pub fn count(signals: &[&Signal]) -> Self {
        let mut tally = VoteTally::default();
        for signal in signals {
            match signal.direction {
                Direction::Buy => tally.buy += 1,
                Direction::Sell => tally.sell += 1,
                Direction::Neutral => tally.neutral += 1,
            }
        }
        tally
    }

    /// Majority vote. A Buy/Sell tie that outnumbers Neutral resolves to Buy;
    /// this asymmetry is a fixed rule, never Sell. Any other tie involving the
    /// leader resolves to Neutral.
    pub fn resolve(&self) -> Direction {
        if self.buy >= self.sell && self.buy > self.neutral {
            Direction::Buy
        } else if self.sell > self.buy && self.sell > self.neutral {
            Direction::Sell
        } else {
            Direction::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusedSignal {
    pub direction: Direction,
    pub score: f64,
    pub confidence: f64,
    pub contributing_layers: Vec<Signal>,
    pub weights: LayerWeights,
    pub votes: VoteTally,
    pub rationale: String,
    pub seed: u64,
    /// Latest timestamp among the contributing signals.
    pub timestamp: NaiveDateTime,
}

pub fn fuse(signals: &LayerSignals, seed: u64) -> Result<FusedSignal, FusionError> {
    let present = signals.present();
    let weights = weights_for(
        signals.primary.is_some(),
        signals.sequential.is_some(),
        signals.contextual.is_some(),
    )
    .ok_or(FusionError::InsufficientSignals {
        present: present.len(),
    })?;

    let score: f64 = present
        .iter()
        .map(|s| weights.for_layer(s.layer) * s.strength)
        .sum();
    let confidence = present.iter().map(|s| s.confidence).sum::<f64>() / present.len() as f64;

    let votes = VoteTally::count(&present);
    let direction = votes.resolve();

    let rationale = build_rationale(&present, &weights, &votes, direction, score, confidence);

    let timestamp = present
        .iter()
        .map(|s| s.timestamp)
        .max()
        .ok_or(FusionError::InsufficientSignals { present: 0 })?;

    debug!(
        direction = %direction,
        score,
        confidence,
        layers = present.len(),
        seed,
        "fused layer signals"
    );

    Ok(FusedSignal {
        direction,
        score,
        confidence,
        contributing_layers: present.into_iter().cloned().collect(),
        weights,
        votes,
        rationale,
        seed,
        timestamp,
    })
}

fn build_rationale(
    present: &[&Signal],
    weights: &LayerWeights,
    votes: &VoteTally,
    direction: Direction,
    score: f64,
    confidence: f64,
) -> String {
    let layers: String = present
        .iter()
        .map(|signal| {
            format!(
                "{}: {} strength={:.4} confidence={:.4} weight={:.3}; ",
                signal.layer,
                signal.direction,
                signal.strength,
                signal.confidence,
                weights.for_layer(signal.layer),
            )
        })
        .collect();
    format!(
        "{}votes buy={} sell={} neutral={} -> {}; score={:.4} confidence={:.4}",
        layers, votes.buy, votes.sell, votes.neutral, direction, score, confidence,
    )
}
