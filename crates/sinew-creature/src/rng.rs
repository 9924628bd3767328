//! RNG trait abstraction for evolution
//!
//! Genome initialization, mutation and parent selection draw every random
//! number through [`EvolutionRng`], so a run seeded with a deterministic
//! generator (e.g. `Xoshiro256StarStar`) replays exactly.

use rand_distr::{Distribution, StandardNormal};

/// Random number source for genome creation and breeding
pub trait EvolutionRng {
    /// Uniform f32 in [0.0, 1.0)
    fn next_f32(&mut self) -> f32;

    /// Standard normal sample (mean 0, variance 1)
    fn next_gaussian(&mut self) -> f32;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Check if random value is less than probability threshold
    fn check_probability(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }
}

// Blanket implementation for any type implementing rand::Rng
impl<T: ?Sized + rand::Rng> EvolutionRng for T {
    fn next_f32(&mut self) -> f32 {
        rand::Rng::r#gen(self)
    }

    fn next_gaussian(&mut self) -> f32 {
        StandardNormal.sample(self)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        rand::Rng::gen_range(self, 0..len)
    }
}
