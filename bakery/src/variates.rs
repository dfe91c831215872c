//! Random-variate source
//!
//! The model only ever asks for two distributions, so it depends on the
//! `Variates` trait rather than on an RNG. Tests swap in scripted draws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Uniform};

pub trait Variates {
    /// A draw from the uniform distribution between `low` and `high`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// A draw from the exponential distribution with the given rate
    /// (mean `1 / rate`).
    fn exponential(&mut self, rate: f64) -> f64;
}

/// `Variates` backed by a `rand` RNG.
///
/// Parameters the distributions reject yield `NaN`, which the engine refuses
/// as a duration, so a bad rate surfaces as `DesError::InvalidDuration`.
#[derive(Debug, Clone)]
pub struct RandVariates<R> {
    rng: R,
}

impl RandVariates<StdRng> {
    pub fn seeded(seed: u64) -> RandVariates<StdRng> {
        RandVariates::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandVariates<R> {
    pub fn new(rng: R) -> RandVariates<R> {
        RandVariates { rng }
    }
}

impl<R: Rng> Variates for RandVariates<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        if low == high {
            return low;
        }
        match Uniform::new_inclusive(low, high) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => f64::NAN,
        }
    }

    fn exponential(&mut self, rate: f64) -> f64 {
        match Exp::new(rate) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => f64::NAN,
        }
    }
}
