//! Injectable randomness for the engine.
//!
//! The engine only ever asks for a unit float, a bounded integer, or a uniform
//! choice. Any `rand::Rng` satisfies the trait, so production runs use a seeded
//! ChaCha generator and tests can script exact draws.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub trait RandomSource {
    /// Uniform value in `[0, 1)`
    fn unit(&mut self) -> f64;

    /// Uniform integer in `[lo, hi]`
    fn int_inclusive(&mut self, lo: u32, hi: u32) -> u32;

    /// Uniform index in `[0, len)`; `len` must be non-zero
    fn index(&mut self, len: usize) -> usize;

    /// Uniform choice from a non-empty slice
    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.index(items.len())]
    }
}

impl<R: Rng> RandomSource for R {
    fn unit(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn int_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        self.gen_range(lo..=hi)
    }

    fn index(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

/// Deterministic generator for a run seed
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}
