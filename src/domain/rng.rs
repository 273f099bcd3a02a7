//! Seeded linear-congruential generator.
//!
//! Every randomized element of the pipeline draws from a `SeededRng` that the
//! caller owns and passes in. There is no process-wide random source: the same
//! seed always reproduces the same stream.

const MULTIPLIER: u64 = 9301;
const INCREMENT: u64 = 49297;
const MODULUS: u64 = 233_280;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % MODULUS,
        }
    }

    pub fn state(&self) -> u64 {
        self.state
    }

    /// Advances `seed' = (seed * 9301 + 49297) mod 233280` and returns
    /// `seed' / 233280`, a value in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER + INCREMENT) % MODULUS;
        self.state as f64 / MODULUS as f64
    }

    /// Uniform value in [low, high).
    pub fn next_range(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Raw state after one step. Useful for deriving tags and identifiers.
    pub fn next_u32(&mut self) -> u32 {
        self.next_f64();
        self.state as u32
    }
}

/// Retry delay for attempt `attempt` (0-based): exponential step
/// `base_ms * 2^attempt`, scaled by a jitter factor in [0.5, 1.0) drawn from `rng`.
pub fn jittered_backoff(base_ms: u64, attempt: u32, rng: &mut SeededRng) -> u64 {
    let step = base_ms.saturating_mul(1u64 << attempt.min(16));
    let factor = rng.next_range(0.5, 1.0);
    (step as f64 * factor).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_value_matches_formula() {
        let mut rng = SeededRng::new(42);
        let expected_state = (42 * 9301 + 49297) % 233_280;
        let value = rng.next_f64();
        assert_eq!(rng.state(), expected_state);
        assert!((value - expected_state as f64 / 233_280.0).abs() < f64::EPSILON);
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = SeededRng::new(7);
        let mut b = SeededRng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SeededRng::new(1);
        let mut b = SeededRng::new(2);
        assert_ne!(a.next_f64(), b.next_f64());
    }

    #[test]
    fn values_stay_in_unit_interval() {
        let mut rng = SeededRng::new(123_456);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn range_respects_bounds() {
        let mut rng = SeededRng::new(99);
        for _ in 0..1000 {
            let v = rng.next_range(10.0, 20.0);
            assert!((10.0..20.0).contains(&v));
        }
    }

    #[test]
    fn cloned_generator_is_independent() {
        let mut original = SeededRng::new(5);
        original.next_f64();
        let mut copy = original.clone();
        let a = original.next_f64();
        let b = copy.next_f64();
        assert_eq!(a, b);
        original.next_f64();
        assert_ne!(original.state(), copy.state());
    }

    #[test]
    fn backoff_is_reproducible_and_bounded() {
        let mut a = SeededRng::new(2024);
        let mut b = SeededRng::new(2024);
        for attempt in 0..5 {
            let da = jittered_backoff(100, attempt, &mut a);
            let db = jittered_backoff(100, attempt, &mut b);
            assert_eq!(da, db);
            let step = 100 * (1u64 << attempt);
            assert!(da >= step / 2 && da <= step);
        }
    }
}
