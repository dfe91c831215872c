use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw outcomes of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Minutes each served customer waited for a worker, in service order.
    pub wait_times: Vec<f64>,
    pub served: usize,
    pub lost: usize,
    pub arrivals: usize,
    /// Sum of service times of served customers.
    pub busy_time: f64,
}

impl RunStats {
    pub fn record_arrival(&mut self) {
        self.arrivals += 1;
    }

    pub fn record_served(&mut self, wait_time: f64, service_time: f64) {
        self.wait_times.push(wait_time);
        self.served += 1;
        self.busy_time += service_time;
    }

    pub fn record_lost(&mut self) {
        self.lost += 1;
    }

    /// Customers that had arrived but neither left served nor gave up when
    /// the run stopped.
    pub fn in_flight(&self) -> usize {
        self.arrivals.saturating_sub(self.served + self.lost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub avg_wait_time: f64,
    pub served_customers: usize,
    pub lost_customers: usize,
    pub customer_loss_rate_pct: f64,
    pub worker_utilization_pct: f64,
}

impl RunSummary {
    pub fn from_stats(stats: &RunStats, horizon: f64, capacity: usize) -> RunSummary {
        let avg_wait_time = if stats.wait_times.is_empty() {
            0.0
        } else {
            stats.wait_times.iter().sum::<f64>() / stats.wait_times.len() as f64
        };

        let total = stats.served + stats.lost;
        let customer_loss_rate_pct = if total > 0 {
            100.0 * stats.lost as f64 / total as f64
        } else {
            0.0
        };

        let worker_utilization_pct = if horizon > 0.0 && capacity > 0 {
            100.0 * stats.busy_time / (horizon * capacity as f64)
        } else {
            0.0
        };

        RunSummary {
            avg_wait_time,
            served_customers: stats.served,
            lost_customers: stats.lost,
            customer_loss_rate_pct,
            worker_utilization_pct,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Waiting Time: {:.2} minutes", self.avg_wait_time)?;
        writeln!(f, "  Customers Served: {}", self.served_customers)?;
        writeln!(f, "  Customers Lost: {}", self.lost_customers)?;
        writeln!(f, "  Customer Loss Rate: {:.2}%", self.customer_loss_rate_pct)?;
        write!(f, "  Worker Utilization: {:.2}%", self.worker_utilization_pct)
    }
}

/// Arithmetic mean of each `RunSummary` field across replications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanSummary {
    pub avg_wait_time: f64,
    pub served_customers: f64,
    pub lost_customers: f64,
    pub customer_loss_rate_pct: f64,
    pub worker_utilization_pct: f64,
}

impl MeanSummary {
    pub fn of(runs: &[RunSummary]) -> MeanSummary {
        if runs.is_empty() {
            return MeanSummary::default();
        }
        let n = runs.len() as f64;
        let mean = |field: fn(&RunSummary) -> f64| runs.iter().map(field).sum::<f64>() / n;
        MeanSummary {
            avg_wait_time: mean(|r| r.avg_wait_time),
            served_customers: mean(|r| r.served_customers as f64),
            lost_customers: mean(|r| r.lost_customers as f64),
            customer_loss_rate_pct: mean(|r| r.customer_loss_rate_pct),
            worker_utilization_pct: mean(|r| r.worker_utilization_pct),
        }
    }
}
