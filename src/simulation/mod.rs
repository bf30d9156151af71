//! Monte Carlo placement experiments
//!
//! An experiment throws `balls` units of work at `buckets` targets through one
//! placement [`Method`](methods::Method) and records where every ball landed.
//! Methods that model several independent schedulers (`servers`) route each
//! ball to a uniformly chosen scheduler; each scheduler keeps its own state and
//! only the global tally sees every placement.
//!
//! # Example
//!
//! ```
//! use uniform_outcomes::simulation::{ExperimentSpec, methods::{Method, MethodConfig}, runner};
//!
//! let spec = ExperimentSpec::new(32, 10_000, 4).unwrap();
//! let method = MethodConfig::new(Method::UniformOutcomes, 1.0);
//! let result = runner::run_experiment(&method, &spec, 42).unwrap();
//!
//! assert_eq!(result.counts.iter().sum::<u64>(), 10_000);
//! println!("spread = {}", result.stats.spread());
//! ```

pub mod methods;
pub mod runner;

use crate::stats::SummaryStats;
use crate::Result;
use methods::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters shared by every method of one experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentSpec {
    pub buckets: usize,
    pub balls: u64,
    /// Number of independent schedulers (ignored by single-view methods)
    pub servers: usize,
}

impl ExperimentSpec {
    pub fn new(buckets: usize, balls: u64, servers: usize) -> Result<Self> {
        let spec = Self {
            buckets,
            balls,
            servers,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buckets == 0 {
            anyhow::bail!("buckets must be > 0");
        }
        if self.servers == 0 {
            anyhow::bail!("servers must be > 0");
        }
        Ok(())
    }
}

/// Outcome of one experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub method: Method,
    pub spec: ExperimentSpec,
    pub seed: u64,
    /// Final global count per bucket
    pub counts: Vec<u64>,
    pub stats: SummaryStats,
    pub runtime: Duration,
    /// Method-specific details (feedback model, beta, servers)
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl ExperimentResult {
    /// Build a result, checking that every ball was accounted for
    pub fn new(
        method: Method,
        spec: ExperimentSpec,
        seed: u64,
        counts: Vec<u64>,
        runtime: Duration,
        meta: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self> {
        let placed: u64 = counts.iter().sum();
        if placed != spec.balls {
            anyhow::bail!(
                "counts sum mismatch for {}: expected {}, got {}",
                method,
                spec.balls,
                placed
            );
        }
        if counts.len() != spec.buckets {
            anyhow::bail!(
                "bucket count mismatch for {}: expected {}, got {}",
                method,
                spec.buckets,
                counts.len()
            );
        }

        let stats = SummaryStats::from_counts(&counts)?;
        Ok(Self {
            method,
            spec,
            seed,
            counts,
            stats,
            runtime,
            meta,
        })
    }
}

/// Shared `(xmin, xmax)` over several results, for same-axis histograms
pub fn common_x_range(results: &[ExperimentResult]) -> Result<(u64, u64)> {
    let first = results
        .first()
        .ok_or_else(|| anyhow::anyhow!("results must be non-empty"))?;

    let mut xmin = first.stats.min;
    let mut xmax = first.stats.max;
    for r in &results[1..] {
        xmin = xmin.min(r.stats.min);
        xmax = xmax.max(r.stats.max);
    }
    Ok((xmin, xmax))
}
