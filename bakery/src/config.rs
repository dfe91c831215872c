//! Sweep configuration
//!
//! Loaded from TOML. Every key is optional:
//!
//! ```toml
//! horizon = 720.0
//! capacity = 2
//! patience_max = 10.0
//! replications = 10
//! base_seed = 42
//! arrival_rates = [0.3333, 0.2, 0.142857]
//! service_rates = [0.3333, 0.25, 0.2]
//! threads = 4
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ModelError, OPENING_MINUTES, Scenario};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub horizon: f64,
    pub capacity: usize,
    pub patience_max: f64,
    pub replications: usize,
    pub base_seed: u64,
    pub arrival_rates: Vec<f64>,
    pub service_rates: Vec<f64>,
    /// Worker threads per scenario; rayon's global pool when unset.
    pub threads: Option<usize>,
}

impl Default for SweepConfig {
    fn default() -> SweepConfig {
        SweepConfig {
            horizon: OPENING_MINUTES,
            capacity: 2,
            patience_max: 10.0,
            replications: 10,
            base_seed: 42,
            arrival_rates: vec![1.0 / 3.0, 1.0 / 5.0, 1.0 / 7.0],
            service_rates: vec![1.0 / 3.0, 1.0 / 4.0, 1.0 / 5.0],
            threads: None,
        }
    }
}

impl SweepConfig {
    pub fn from_toml_str(s: &str) -> Result<SweepConfig, ModelError> {
        let config: SweepConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<SweepConfig, ModelError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        SweepConfig::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.replications == 0 {
            return Err(ModelError::Config("replications must be at least 1".into()));
        }
        if self.arrival_rates.is_empty() || self.service_rates.is_empty() {
            return Err(ModelError::Config(
                "arrival_rates and service_rates must not be empty".into(),
            ));
        }
        if self.threads == Some(0) {
            return Err(ModelError::Config("threads must be at least 1".into()));
        }
        for scenario in self.scenarios() {
            scenario.params(self).validate()?;
        }
        Ok(())
    }

    /// Every (arrival rate, service rate) pair, arrival-major.
    pub fn scenarios(&self) -> Vec<Scenario> {
        self.arrival_rates
            .iter()
            .flat_map(|&arrival_rate| {
                self.service_rates.iter().map(move |&service_rate| Scenario {
                    arrival_rate,
                    service_rate,
                })
            })
            .collect()
    }

    /// Seed of replication `run` of scenario `scenario`. Distinct for every
    /// run of the sweep.
    pub fn seed_for(&self, scenario: usize, run: usize) -> u64 {
        self.base_seed
            .wrapping_add((scenario * self.replications + run) as u64)
    }
}
