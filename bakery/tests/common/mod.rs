use std::collections::VecDeque;

use bakery::{ShopParams, Variates};

/// Replays fixed draws in order.
///
/// Exponential draws are kept per rate, so arrival gaps and service times can
/// be scripted independently of how the run interleaves them. Running out of
/// script panics, which fails the test.
#[derive(Debug, Default)]
pub struct ScriptedVariates {
    uniform: VecDeque<f64>,
    exponential: Vec<(f64, VecDeque<f64>)>,
}

impl ScriptedVariates {
    pub fn new() -> ScriptedVariates {
        ScriptedVariates::default()
    }

    pub fn with_uniform(mut self, draws: &[f64]) -> ScriptedVariates {
        self.uniform.extend(draws);
        self
    }

    pub fn with_exponential(mut self, rate: f64, draws: &[f64]) -> ScriptedVariates {
        self.exponential.push((rate, draws.iter().copied().collect()));
        self
    }
}

impl Variates for ScriptedVariates {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.uniform
            .pop_front()
            .unwrap_or_else(|| panic!("no uniform({low}, {high}) draw scripted"))
    }

    fn exponential(&mut self, rate: f64) -> f64 {
        self.exponential
            .iter_mut()
            .find(|(r, _)| *r == rate)
            .and_then(|(_, draws)| draws.pop_front())
            .unwrap_or_else(|| panic!("no exponential({rate}) draw scripted"))
    }
}

pub const ARRIVAL_RATE: f64 = 0.2;
pub const SERVICE_RATE: f64 = 0.25;

/// Shop open for `horizon` minutes with `capacity` workers, using the
/// scripted rates.
pub fn shop(horizon: f64, capacity: usize) -> ShopParams {
    ShopParams {
        horizon,
        capacity,
        arrival_rate: ARRIVAL_RATE,
        service_rate: SERVICE_RATE,
        patience_max: 50.0,
    }
}

/// Arrival gaps, service times and patience draws, in that order.
pub fn script(gaps: &[f64], services: &[f64], patience: &[f64]) -> ScriptedVariates {
    ScriptedVariates::new()
        .with_exponential(ARRIVAL_RATE, gaps)
        .with_exponential(SERVICE_RATE, services)
        .with_uniform(patience)
}
