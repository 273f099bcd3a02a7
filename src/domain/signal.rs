//! Layer signals: one strategy layer's directional opinion at a point in time.

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Primary,
    Sequential,
    Contextual,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Primary, Layer::Sequential, Layer::Contextual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Primary => "primary",
            Layer::Sequential => "sequential",
            Layer::Contextual => "contextual",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" => Ok(Layer::Primary),
            "sequential" => Ok(Layer::Sequential),
            "contextual" => Ok(Layer::Contextual),
            other => Err(format!("unknown layer: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Buy,
    Sell,
    Neutral,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::Neutral => "NEUTRAL",
        }
    }

    pub fn is_actionable(&self) -> bool {
        !matches!(self, Direction::Neutral)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "LONG" => Ok(Direction::Buy),
            "SELL" | "SHORT" => Ok(Direction::Sell),
            "NEUTRAL" | "HOLD" => Ok(Direction::Neutral),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub layer: Layer,
    pub direction: Direction,
    /// 0..1
    pub strength: f64,
    /// 0..1
    pub confidence: f64,
    pub timestamp: NaiveDateTime,
}

/// The up-to-three layer opinions handed to fusion. A slot is `None` when the
/// layer produced nothing for this decision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerSignals {
    pub primary: Option<Signal>,
    pub sequential: Option<Signal>,
    pub contextual: Option<Signal>,
}

impl LayerSignals {
    /// Places `signal` in the slot named by its layer, replacing any previous one.
    pub fn insert(&mut self, signal: Signal) {
        match signal.layer {
            Layer::Primary => self.primary = Some(signal),
            Layer::Sequential => self.sequential = Some(signal),
            Layer::Contextual => self.contextual = Some(signal),
        }
    }

    pub fn get(&self, layer: Layer) -> Option<&Signal> {
        match layer {
            Layer::Primary => self.primary.as_ref(),
            Layer::Sequential => self.sequential.as_ref(),
            Layer::Contextual => self.contextual.as_ref(),
        }
    }

    /// Present signals in fixed layer order.
    pub fn present(&self) -> Vec<&Signal> {
        Layer::ALL.iter().filter_map(|l| self.get(*l)).collect()
    }

    pub fn count(&self) -> usize {
        self.present().len()
    }
}
