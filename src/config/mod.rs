//! Configuration module
//!
//! Handles CLI argument parsing, TOML experiment files, and validation.
//! A run is fully described by a [`Config`]; the binary builds one from the
//! command line, optionally starting from a TOML file whose values the CLI
//! flags override.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::simulation::methods::{default_beta, Method, MethodConfig};
use crate::simulation::ExperimentSpec;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub experiment: ExperimentConfig,
    #[serde(default = "default_methods")]
    pub methods: Vec<MethodConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Experiment parameters shared by every method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Number of buckets
    pub buckets: usize,
    /// Number of balls (placements)
    pub balls: u64,
    /// Number of independent schedulers
    #[serde(default = "default_servers")]
    pub servers: usize,
    /// Base RNG seed
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Number of trials (seeds `seed..seed + trials`)
    #[serde(default = "default_trials")]
    pub trials: u64,
}

/// Report configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Histogram bins in the text report
    #[serde(default = "default_bins")]
    pub bins: usize,
    /// Width of the longest histogram bar, in characters
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
    /// JSON report path
    pub json: Option<PathBuf>,
}

/// Execution settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Worker threads for parallel trials
    #[serde(default = "default_threads")]
    pub threads: usize,
}

pub const DEFAULT_SEED: u64 = 42;

fn default_methods() -> Vec<MethodConfig> {
    vec![MethodConfig::new(Method::UniformOutcomes, default_beta())]
}

fn default_servers() -> usize {
    1
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_trials() -> u64 {
    1
}

fn default_bins() -> usize {
    60
}

fn default_bar_width() -> usize {
    50
}

fn default_threads() -> usize {
    num_cpus::get()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            bins: default_bins(),
            bar_width: default_bar_width(),
            json: None,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
        }
    }
}

impl ExperimentConfig {
    pub fn new(buckets: usize, balls: u64) -> Self {
        Self {
            buckets,
            balls,
            servers: default_servers(),
            seed: default_seed(),
            trials: default_trials(),
        }
    }
}

impl Config {
    /// Configuration with default methods, output and runtime settings
    pub fn new(experiment: ExperimentConfig) -> Self {
        Self {
            experiment,
            methods: default_methods(),
            output: OutputConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }

    /// Validated experiment spec for the harness
    pub fn spec(&self) -> Result<ExperimentSpec> {
        ExperimentSpec::new(
            self.experiment.buckets,
            self.experiment.balls,
            self.experiment.servers,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::new(ExperimentConfig::new(100, 1000));
        assert_eq!(config.experiment.servers, 1);
        assert_eq!(config.experiment.seed, DEFAULT_SEED);
        assert_eq!(config.experiment.trials, 1);
        assert_eq!(config.methods, vec![MethodConfig::new(Method::UniformOutcomes, 1.0)]);
        assert_eq!(config.output.bins, 60);
        assert!(config.output.json.is_none());
        assert!(config.runtime.threads >= 1);
    }

    #[test]
    fn test_config_spec() {
        let config = Config::new(ExperimentConfig::new(8, 50));
        let spec = config.spec().unwrap();
        assert_eq!(spec.buckets, 8);
        assert_eq!(spec.balls, 50);

        let config = Config::new(ExperimentConfig::new(0, 50));
        assert!(config.spec().is_err());
    }
}
