//! CLI to Config conversion utilities

use crate::config::cli::Cli;
use crate::config::toml::merge_cli_with_config;
use crate::config::{Config, ExperimentConfig};
use crate::simulation::methods::{default_beta, MethodConfig};
use anyhow::{Context, Result};

/// Parse a count string (e.g., "1000", "500k", "1M", "2g") to a number
///
/// Suffixes are decimal: k = 10^3, m = 10^6, g = 10^9. Underscores are
/// ignored so `1_000_000` is accepted too.
pub fn parse_count(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase().replace('_', "");

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('k') {
        (n, 1_000u64)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 1_000_000)
    } else if let Some(n) = s.strip_suffix('g') {
        (n, 1_000_000_000)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid count format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Count overflows u64: {}", s))
}

/// Build the method list from `-m` flags, applying `--beta` to each
pub fn methods_from_cli(cli: &Cli) -> Vec<MethodConfig> {
    let beta = cli.beta.unwrap_or_else(default_beta);
    cli.methods
        .iter()
        .map(|&m| MethodConfig::new(m, beta))
        .collect()
}

/// Build a complete config from CLI flags alone
pub fn config_from_cli(cli: &Cli) -> Result<Config> {
    let buckets = cli.buckets.context("--buckets is required")?;
    let balls = parse_count(cli.balls.as_deref().context("--balls is required")?)?;

    merge_cli_with_config(cli, Config::new(ExperimentConfig::new(buckets, balls)))
}

/// Copy every explicitly given scalar flag into `config`
pub(crate) fn apply_cli_overrides(cli: &Cli, config: &mut Config) -> Result<()> {
    if let Some(buckets) = cli.buckets {
        config.experiment.buckets = buckets;
    }
    if let Some(balls) = &cli.balls {
        config.experiment.balls = parse_count(balls)?;
    }
    if let Some(servers) = cli.servers {
        config.experiment.servers = servers;
    }
    if let Some(seed) = cli.seed {
        config.experiment.seed = seed;
    }
    if let Some(trials) = cli.trials {
        config.experiment.trials = trials;
    }
    if let Some(threads) = cli.threads {
        config.runtime.threads = threads;
    }
    if let Some(bins) = cli.bins {
        config.output.bins = bins;
    }
    if let Some(json) = &cli.json {
        config.output.json = Some(json.clone());
    }
    Ok(())
}
