use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Source of the cosmetic random draws behind the live dashboard.
///
/// Not suitable for anything security related. Any `rand` generator
/// implements it, so tests can hand the feed a seeded `StdRng`.
pub trait RandomSource: Send + 'static {
    /// Uniform integer in `low..=high`.
    fn int_inclusive(&mut self, low: i64, high: i64) -> i64;

    /// Uniform float in `low..high`.
    fn float_between(&mut self, low: f64, high: f64) -> f64;
}

impl<R: RngCore + Send + 'static> RandomSource for R {
    fn int_inclusive(&mut self, low: i64, high: i64) -> i64 {
        self.gen_range(low..=high)
    }

    fn float_between(&mut self, low: f64, high: f64) -> f64 {
        self.gen_range(low..high)
    }
}

/// Seeded generator when `seed` is given, OS entropy otherwise.
pub fn source_for(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(StdRng::from_entropy()),
    }
}
