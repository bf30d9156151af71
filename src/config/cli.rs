//! CLI argument parsing using clap

use crate::simulation::methods::Method;
use clap::Parser;
use std::path::PathBuf;

/// uniform-outcomes - fairness-biased placement experiments
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "uniform-outcomes")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML experiment file (CLI flags override its values)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    // === Methods ===
    /// Placement method to run (repeatable)
    #[arg(short = 'm', long = "method", value_enum)]
    pub methods: Vec<Method>,

    /// Bias parameter for the uniform-outcomes methods (>= 0)
    #[arg(long)]
    pub beta: Option<f64>,

    // === Experiment ===
    /// Number of buckets
    #[arg(short = 'n', long)]
    pub buckets: Option<usize>,

    /// Number of balls to place (e.g., 100000, 500k, 1M)
    #[arg(short = 'b', long)]
    pub balls: Option<String>,

    /// Number of independent schedulers
    #[arg(short = 's', long)]
    pub servers: Option<usize>,

    /// Base RNG seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of trials (seeds seed..seed+trials)
    #[arg(long)]
    pub trials: Option<u64>,

    /// Worker threads for parallel trials
    #[arg(short = 't', long, env = "UNIFORM_OUTCOMES_THREADS")]
    pub threads: Option<usize>,

    // === Output ===
    /// Histogram bins in the text report
    #[arg(long)]
    pub bins: Option<usize>,

    /// Write a JSON report to this file
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Validate and print the configuration without running
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        // Without a config file the experiment must come entirely from flags
        if self.config.is_none() {
            if self.buckets.is_none() {
                anyhow::bail!("--buckets is required when no --config file is given");
            }
            if self.balls.is_none() {
                anyhow::bail!("--balls is required when no --config file is given");
            }
        }

        if self.buckets == Some(0) {
            anyhow::bail!("buckets must be at least 1");
        }
        if self.servers == Some(0) {
            anyhow::bail!("servers must be at least 1");
        }
        if self.trials == Some(0) {
            anyhow::bail!("trials must be at least 1");
        }
        if self.threads == Some(0) {
            anyhow::bail!("threads must be at least 1");
        }
        if self.bins == Some(0) {
            anyhow::bail!("bins must be at least 1");
        }

        if let Some(beta) = self.beta {
            if !beta.is_finite() || beta < 0.0 {
                anyhow::bail!("beta must be a finite number >= 0, got {}", beta);
            }
        }

        Ok(())
    }
}
