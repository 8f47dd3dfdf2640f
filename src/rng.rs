//! Seeded linear congruential generator
//!
//! `state = (state * A + C) mod M`, returning `state / M`. The stream is a
//! pure function of the seed, so two generators built with the same seed
//! yield identical sequences.

const MULTIPLIER: u64 = 9301;
const INCREMENT: u64 = 49297;
const MODULUS: u64 = 233_280;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    seed: u64,
    state: u64,
    draws: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            state: seed % MODULUS,
            draws: 0,
        }
    }

    /// Next value in [0, 1). Advances the state by exactly one step.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER + INCREMENT) % MODULUS;
        self.draws += 1;
        self.state as f64 / MODULUS as f64
    }

    /// Uniform draw in [low, high), one step.
    pub fn range(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_f64() * (high - low)
    }

    /// Index into a collection of `len` items, one step. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        let idx = (self.next_f64() * len as f64) as usize;
        idx.min(len.saturating_sub(1))
    }

    /// Pick one element, one step. Returns `None` for an empty slice without
    /// consuming a draw.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.index(items.len());
        items.get(idx)
    }

    /// Reset to the initial state of `seed`.
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of values drawn since construction or the last reseed.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SeededRng::new(42);
        let mut b = SeededRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn test_values_in_unit_interval() {
        let mut rng = SeededRng::new(7);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_first_value_for_seed_42() {
        // (42 * 9301 + 49297) % 233280 = 439939 % 233280 = 206659
        let mut rng = SeededRng::new(42);
        assert_eq!(rng.next_f64(), 206_659.0 / 233_280.0);
    }

    #[test]
    fn test_reseed_restarts_stream() {
        let mut rng = SeededRng::new(5);
        let first = rng.next_f64();
        rng.next_f64();
        rng.reseed(5);
        assert_eq!(rng.draws(), 0);
        assert_eq!(rng.next_f64(), first);
    }

    #[test]
    fn test_pick_empty_does_not_draw() {
        let mut rng = SeededRng::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = SeededRng::new(3);
        for _ in 0..1000 {
            let v = rng.range(0.9, 1.1);
            assert!(v >= 0.9 && v < 1.1);
        }
    }
}
