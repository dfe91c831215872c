use std::fmt;

use des::parallel::{ParallelRunner, progress_reporter};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    MeanSummary, ModelError, RandVariates, RunSummary, ShopParams, SweepConfig, build_event_loop,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub arrival_rate: f64,
    pub service_rate: f64,
}

impl Scenario {
    pub fn params(&self, config: &SweepConfig) -> ShopParams {
        ShopParams {
            horizon: config.horizon,
            capacity: config.capacity,
            arrival_rate: self.arrival_rate,
            service_rate: self.service_rate,
            patience_max: config.patience_max,
        }
    }

    /// Console line announcing the scenario.
    pub fn header(&self) -> String {
        format!(
            "Running simulations with arrival rate = {:.2} and service rate = {:.2}",
            self.arrival_rate, self.service_rate
        )
    }
}

/// Every replication of one scenario, in run order, and their averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub replications: usize,
    pub runs: Vec<RunSummary>,
    pub averages: MeanSummary,
}

impl ScenarioResult {
    /// One "Simulation i:" block per run, then the line introducing the
    /// averages.
    pub fn runs_report(&self) -> String {
        let mut report = String::new();
        for (i, run) in self.runs.iter().enumerate() {
            report.push_str(&format!("Simulation {}:\n{run}\n\n", i + 1));
        }
        report.push_str(&format!(
            "Average Results across {} simulations:",
            self.replications
        ));
        report
    }
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.averages;
        writeln!(f, "  Average Waiting Time: {:.2} minutes", m.avg_wait_time)?;
        writeln!(f, "  Average Customers Served: {:.2}", m.served_customers)?;
        writeln!(f, "  Average Customers Lost: {:.2}", m.lost_customers)?;
        writeln!(
            f,
            "  Average Customer Loss Rate: {:.2}%",
            m.customer_loss_rate_pct
        )?;
        write!(
            f,
            "  Average Worker Utilization: {:.2}%",
            m.worker_utilization_pct
        )
    }
}

/// Runs every replication of `scenario` in parallel and averages them.
///
/// `index` is the scenario's position in the sweep; it only feeds the seeds.
pub fn run_scenario(
    config: &SweepConfig,
    index: usize,
    scenario: Scenario,
) -> Result<ScenarioResult, ModelError> {
    let params = scenario.params(config);
    params.validate()?;

    let mut runner = ParallelRunner::new(config.replications, |run| {
        build_event_loop(&params, RandVariates::seeded(config.seed_for(index, run)))
    })
    .progress(progress_reporter(config.replications));
    if let Some(threads) = config.threads {
        runner = runner.num_threads(threads);
    }

    let mut summaries = Vec::with_capacity(config.replications);
    for (run, shop) in runner.run(params.horizon).into_iter().enumerate() {
        let shop = shop.map_err(|source| ModelError::Run {
            scenario: index,
            run,
            source,
        })?;
        summaries.push(RunSummary::from_stats(
            &shop.stats,
            params.horizon,
            params.capacity,
        ));
    }

    let averages = MeanSummary::of(&summaries);
    info!(
        scenario = index,
        arrival_rate = scenario.arrival_rate,
        service_rate = scenario.service_rate,
        avg_wait_time = averages.avg_wait_time,
        loss_rate_pct = averages.customer_loss_rate_pct,
        "scenario finished"
    );
    Ok(ScenarioResult {
        scenario,
        replications: summaries.len(),
        runs: summaries,
        averages,
    })
}

/// Runs every scenario of the sweep, in `SweepConfig::scenarios` order.
pub fn run_sweep(config: &SweepConfig) -> Result<Vec<ScenarioResult>, ModelError> {
    config.validate()?;
    config
        .scenarios()
        .into_iter()
        .enumerate()
        .map(|(index, scenario)| run_scenario(config, index, scenario))
        .collect()
}
