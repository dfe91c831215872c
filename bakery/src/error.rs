use std::path::PathBuf;

use des::DesError;
use des::parallel::RunError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Sim(#[from] DesError),

    #[error("invalid {name}: {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("scenario {scenario}, run {run}: {source}")]
    Run {
        scenario: usize,
        run: usize,
        source: RunError,
    },
}
