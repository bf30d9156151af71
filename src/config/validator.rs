//! Configuration validation

use super::*;
use anyhow::Result;
use std::collections::HashSet;
use tracing::warn;

/// Above this many `buckets * balls` steps the reference method is slow
const REFERENCE_WORK_WARN: u128 = 1_000_000_000;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_experiment(&config.experiment)?;
    validate_methods(&config.methods, &config.experiment)?;
    validate_output(&config.output)?;
    validate_runtime(&config.runtime)?;

    Ok(())
}

/// Validate experiment parameters
pub fn validate_experiment(experiment: &ExperimentConfig) -> Result<()> {
    if experiment.buckets == 0 {
        anyhow::bail!("experiment.buckets must be greater than 0");
    }
    if experiment.servers == 0 {
        anyhow::bail!("experiment.servers must be greater than 0");
    }
    if experiment.trials == 0 {
        anyhow::bail!("experiment.trials must be greater than 0");
    }
    if experiment.seed.checked_add(experiment.trials - 1).is_none() {
        anyhow::bail!(
            "experiment.seed ({}) + experiment.trials ({}) overflows u64",
            experiment.seed,
            experiment.trials
        );
    }

    if experiment.balls == 0 {
        warn!("experiment.balls is 0, every method will report all-zero counts");
    }

    Ok(())
}

/// Validate the method list
pub fn validate_methods(methods: &[MethodConfig], experiment: &ExperimentConfig) -> Result<()> {
    if methods.is_empty() {
        anyhow::bail!("at least one method must be configured");
    }

    let mut seen = HashSet::new();
    for (i, m) in methods.iter().enumerate() {
        if !m.beta.is_finite() || m.beta < 0.0 {
            anyhow::bail!(
                "methods[{}] ({}): beta must be a finite number >= 0, got {}",
                i,
                m.method,
                m.beta
            );
        }

        if !m.method.uses_beta() && m.beta != default_beta() {
            warn!(method = %m.method, beta = m.beta, "beta is ignored by this method");
        }

        if !seen.insert((m.method, m.beta.to_bits())) {
            anyhow::bail!("methods[{}] duplicates an earlier entry: {} beta={}", i, m.method, m.beta);
        }

        if m.method == Method::Reference
            && experiment.buckets as u128 * experiment.balls as u128 > REFERENCE_WORK_WARN
        {
            warn!(
                buckets = experiment.buckets,
                balls = experiment.balls,
                "reference method scans every bucket per placement, expect a long run"
            );
        }
    }

    Ok(())
}

/// Validate output configuration
pub fn validate_output(output: &OutputConfig) -> Result<()> {
    if output.bins == 0 {
        anyhow::bail!("output.bins must be greater than 0");
    }
    if output.bar_width == 0 {
        anyhow::bail!("output.bar_width must be greater than 0");
    }

    Ok(())
}

/// Validate runtime configuration
pub fn validate_runtime(runtime: &RuntimeConfig) -> Result<()> {
    if runtime.threads == 0 {
        anyhow::bail!("runtime.threads must be greater than 0");
    }

    Ok(())
}
