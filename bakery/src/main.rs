//! Bakery queue simulation CLI
//!
//! Sweeps arrival and service rates over a shop with a fixed number of
//! workers and prints replication averages for every pair.

use std::path::PathBuf;

use anyhow::Context;
use bakery::{SweepConfig, run_scenario, run_sweep};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bakery")]
#[command(about = "Queueing simulation of a shop with impatient customers")]
#[command(version)]
struct Cli {
    /// Sweep configuration (TOML); the built-in grid when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replications per scenario
    #[arg(short, long)]
    replications: Option<usize>,

    /// Base seed for the whole sweep
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads per scenario
    #[arg(long)]
    threads: Option<usize>,

    /// Print every simulation's results before each scenario's averages
    #[arg(long)]
    per_run: bool,

    /// Print results as JSON instead of the console report
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SweepConfig::load(path)
            .with_context(|| format!("loading sweep configuration {}", path.display()))?,
        None => SweepConfig::default(),
    };
    if let Some(replications) = cli.replications {
        config.replications = replications;
    }
    if let Some(seed) = cli.seed {
        config.base_seed = seed;
    }
    if cli.threads.is_some() {
        config.threads = cli.threads;
    }
    config.validate().context("invalid sweep configuration")?;

    if cli.json {
        let results = run_sweep(&config)?;
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for (index, scenario) in config.scenarios().into_iter().enumerate() {
        println!("{}", scenario.header());
        let result = run_scenario(&config, index, scenario)
            .with_context(|| format!("running scenario {index}"))?;
        if cli.per_run {
            println!("{}", result.runs_report());
        }
        println!("{result}");
        println!();
    }
    Ok(())
}
