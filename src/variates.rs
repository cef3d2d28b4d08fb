use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{Distribution, WALL_CLOCK_SEED};

/// Seeded source of interarrival and service-time samples.
///
/// The generator owns its RNG stream; two generators built from the same
/// seed (other than [`WALL_CLOCK_SEED`]) produce identical samples.
pub struct VariateGenerator {
    rng: StdRng,
    seed: u64,
}

impl VariateGenerator {
    pub fn new(seed: i64) -> Self {
        let seed = resolve_seed(seed);
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed the RNG was actually built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Inverse-CDF exponential draw with mean `1 / rate`.
    pub fn exponential(&mut self, rate: f64) -> f64 {
        debug_assert!(rate > 0.0, "exponential rate must be positive");
        let mut u = self.rng.gen::<f64>();
        // ln(1 - u) is -inf at u == 1 and 0 at u == 0.
        while u == 0.0 || u == 1.0 {
            u = self.rng.gen::<f64>();
        }
        -(1.0 - u).ln() / rate
    }

    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + self.rng.gen::<f64>() * (max - min)
    }

    pub fn constant(&self, value: f64) -> f64 {
        value
    }

    /// Draw a duration whose mean is `1 / rate` under `distribution`.
    pub fn sample(&mut self, distribution: Distribution, rate: f64) -> f64 {
        match distribution {
            Distribution::Exponential => self.exponential(rate),
            Distribution::Uniform => self.uniform(0.5 / rate, 1.5 / rate),
            Distribution::Constant => self.constant(1.0 / rate),
        }
    }
}

fn resolve_seed(seed: i64) -> u64 {
    if seed == WALL_CLOCK_SEED {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default()
    } else {
        seed as u64
    }
}
