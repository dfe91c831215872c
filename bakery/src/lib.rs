//! Bakery counter with impatient customers
//!
//! Customers arrive at random, queue for one of `capacity` workers and give up
//! if nobody has served them before their patience runs out.
//!
//! Processes:
//! - ArrivalGenerator: spawns a Customer after every exponential gap
//! - Customer: races a worker request against its patience deadline, then
//!   holds the worker for an exponential service time
//!
//! Outcomes are collected in the run's `RunStats` and summarised by
//! `RunSummary::from_stats`.

use des::{DesError, EventLoop};
use serde::{Deserialize, Serialize};

pub mod arrivals;
pub mod config;
pub mod customer;
pub mod error;
pub mod scenario;
pub mod stats;
pub mod variates;

pub use arrivals::ArrivalGenerator;
pub use config::SweepConfig;
pub use customer::Customer;
pub use error::ModelError;
pub use scenario::{Scenario, ScenarioResult, run_scenario, run_sweep};
pub use stats::{MeanSummary, RunStats, RunSummary};
pub use variates::{RandVariates, Variates};

/// Twelve opening hours, 8 AM to 8 PM.
pub const OPENING_MINUTES: f64 = 12.0 * 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShopParams {
    /// Minutes the shop stays open.
    pub horizon: f64,
    /// Number of workers behind the counter.
    pub capacity: usize,
    /// Arrivals per minute.
    pub arrival_rate: f64,
    /// Services completed per minute by one worker.
    pub service_rate: f64,
    /// Longest a customer is ever prepared to wait, in minutes.
    pub patience_max: f64,
}

impl Default for ShopParams {
    fn default() -> ShopParams {
        ShopParams {
            horizon: OPENING_MINUTES,
            capacity: 2,
            arrival_rate: 1.0 / 5.0,
            service_rate: 1.0 / 4.0,
            patience_max: 10.0,
        }
    }
}

impl ShopParams {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.capacity == 0 {
            return Err(DesError::InvalidCapacity(self.capacity).into());
        }
        if !self.horizon.is_finite() || self.horizon < 0.0 {
            return Err(ModelError::InvalidParameter {
                name: "horizon",
                value: self.horizon,
                expected: "a finite number of minutes >= 0",
            });
        }
        for (name, value) in [
            ("arrival_rate", self.arrival_rate),
            ("service_rate", self.service_rate),
            ("patience_max", self.patience_max),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ModelError::InvalidParameter {
                    name,
                    value,
                    expected: "a finite number > 0",
                });
            }
        }
        Ok(())
    }
}

/// World shared by every process of one run.
#[derive(Debug)]
pub struct Shop<V> {
    pub params: ShopParams,
    pub stats: RunStats,
    pub variates: V,
}

/// Sets up a run: one worker pool and the arrival generator.
///
/// Does not validate `params`; zero capacity still fails here, other bad
/// values fail once the run draws from them.
pub fn build_event_loop<V>(params: &ShopParams, variates: V) -> Result<EventLoop<Shop<V>>, DesError>
where
    V: Variates + 'static,
{
    let mut event_loop = EventLoop::new(Shop {
        params: *params,
        stats: RunStats::default(),
        variates,
    });
    let counter = event_loop.add_pool(params.capacity)?;
    event_loop.spawn(ArrivalGenerator::new(counter));
    Ok(event_loop)
}

/// Runs one shop day and returns the raw statistics.
pub fn simulate<V>(params: &ShopParams, variates: V) -> Result<RunStats, ModelError>
where
    V: Variates + 'static,
{
    params.validate()?;
    let mut event_loop = build_event_loop(params, variates)?;
    event_loop.run_until(params.horizon)?;
    Ok(event_loop.into_world().stats)
}

/// Runs one shop day and summarises it.
pub fn run<V>(params: &ShopParams, variates: V) -> Result<RunSummary, ModelError>
where
    V: Variates + 'static,
{
    let stats = simulate(params, variates)?;
    Ok(RunSummary::from_stats(&stats, params.horizon, params.capacity))
}
