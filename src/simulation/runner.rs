//! Experiment runner
//!
//! Runs one method once ([`run_experiment`]) or over several seeds in
//! parallel ([`run_trials`]). Each trial builds its own schedulers and
//! randomizers, so trials share no mutable state.

use super::methods::MethodConfig;
use super::{ExperimentResult, ExperimentSpec};
use crate::stats::histogram::LoadHistogram;
use crate::util::time::format_duration;
use crate::Result;
use anyhow::Context;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Run a single experiment
pub fn run_experiment(method: &MethodConfig, spec: &ExperimentSpec, seed: u64) -> Result<ExperimentResult> {
    spec.validate()?;

    let result = method
        .simulate(spec, seed)
        .with_context(|| format!("Experiment failed for method {}", method.method))?;

    debug!(
        method = %method.method,
        seed,
        spread = result.stats.spread(),
        std = result.stats.std,
        runtime = %format_duration(result.runtime),
        "experiment finished"
    );
    Ok(result)
}

/// Run `method` once per seed `seed, seed + 1, ..., seed + trials - 1`
///
/// Trials run on a dedicated rayon pool of `threads` workers. Results come
/// back in seed order.
pub fn run_trials(
    method: &MethodConfig,
    spec: &ExperimentSpec,
    seed: u64,
    trials: u64,
    threads: usize,
) -> Result<Vec<ExperimentResult>> {
    if trials == 0 {
        anyhow::bail!("trials must be > 0");
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .context("Failed to build trial thread pool")?;

    pool.install(|| {
        (0..trials)
            .into_par_iter()
            .map(|t| run_experiment(method, spec, seed.wrapping_add(t)))
            .collect()
    })
}

/// Aggregate of several trials of one method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialSummary {
    pub trials: usize,
    pub mean_spread: f64,
    pub max_spread: u64,
    pub mean_std: f64,
    /// Bucket load percentiles pooled over every trial
    pub load_p50: u64,
    pub load_p99: u64,
}

impl TrialSummary {
    pub fn from_results(results: &[ExperimentResult]) -> Result<Self> {
        if results.is_empty() {
            anyhow::bail!("results must be non-empty");
        }

        let n = results.len() as f64;
        let mean_spread = results.iter().map(|r| r.stats.spread() as f64).sum::<f64>() / n;
        let max_spread = results.iter().map(|r| r.stats.spread()).max().unwrap_or(0);
        let mean_std = results.iter().map(|r| r.stats.std).sum::<f64>() / n;

        let mut loads = LoadHistogram::new()?;
        for r in results {
            loads.merge(&LoadHistogram::from_counts(&r.counts)?)?;
        }

        Ok(Self {
            trials: results.len(),
            mean_spread,
            max_spread,
            mean_std,
            load_p50: loads.percentile(50.0).unwrap_or(0),
            load_p99: loads.percentile(99.0).unwrap_or(0),
        })
    }
}

/// Every trial of one method plus their aggregate
#[derive(Debug, Clone)]
pub struct MethodRun {
    pub method: MethodConfig,
    /// Results in seed order; never empty
    pub results: Vec<ExperimentResult>,
    pub summary: TrialSummary,
}

impl MethodRun {
    /// The first trial (base seed), used for per-bucket reporting
    pub fn first(&self) -> &ExperimentResult {
        &self.results[0]
    }
}

/// Run all trials of `method` and summarize them
pub fn run_method(
    method: &MethodConfig,
    spec: &ExperimentSpec,
    seed: u64,
    trials: u64,
    threads: usize,
) -> Result<MethodRun> {
    let results = run_trials(method, spec, seed, trials, threads)?;
    let summary = TrialSummary::from_results(&results)?;
    Ok(MethodRun {
        method: *method,
        results,
        summary,
    })
}
