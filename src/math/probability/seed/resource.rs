// src/math/probability/seed/resource.rs
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministische Zufallsquelle eines Puzzles.
///
/// Derselbe Seed erzeugt dieselbe Tesselation, dieselben Attachments und
/// dieselbe Shuffle-Reihenfolge.
#[derive(Debug, Clone)]
pub struct SeedResource {
    pub seed: u64,
    rng: StdRng,
}

impl SeedResource {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_text<S: AsRef<str>>(text: S) -> Self {
        let mut hasher = DefaultHasher::new();
        text.as_ref().hash(&mut hasher);
        let seed = hasher.finish();
        Self::from_seed(seed)
    }

    /// Gleichverteilter Wert in `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Ganzzahl in `[0, upper)`; `upper == 0` liefert 0
    pub fn next_index(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        self.rng.random_range(0..upper)
    }

    /// Fisher-Yates über den ganzen Slice
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

impl Default for SeedResource {
    fn default() -> Self {
        let seed_number = rand::random::<u64>();
        Self::from_seed(seed_number)
    }
}
