//! Statistics over per-bucket placement counts
//!
//! - [`SummaryStats`]: min / max / mean / population std of final counts
//! - [`chi_square_uniform`]: goodness-of-fit against the discrete uniform law
//! - [`chi_square_homogeneity`]: two-sample test over observed values
//! - [`chi_square_critical`]: approximate critical value for a significance level
//! - [`histogram::LoadHistogram`]: per-bucket load percentiles
//!
//! # Example
//!
//! ```
//! use uniform_outcomes::stats::{SummaryStats, chi_square_uniform};
//!
//! let counts = vec![10, 12, 9, 11];
//! let stats = SummaryStats::from_counts(&counts).unwrap();
//! assert_eq!(stats.spread(), 3);
//!
//! let chi2 = chi_square_uniform(&counts);
//! assert!(chi2 < 1.0);
//! ```

pub mod histogram;

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary of final bucket counts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
}

impl SummaryStats {
    /// Compute summary statistics (two-pass variance)
    pub fn from_counts(counts: &[u64]) -> Result<Self> {
        if counts.is_empty() {
            anyhow::bail!("counts must be non-empty");
        }

        let min = counts.iter().copied().min().unwrap_or(0);
        let max = counts.iter().copied().max().unwrap_or(0);

        let n = counts.len() as f64;
        let mean = counts.iter().map(|&c| c as f64).sum::<f64>() / n;
        let var = counts
            .iter()
            .map(|&c| {
                let d = c as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        Ok(Self {
            min,
            max,
            mean,
            std: var.sqrt(),
        })
    }

    /// Difference between the most and least loaded bucket
    pub fn spread(&self) -> u64 {
        self.max - self.min
    }
}

/// Pearson chi-square statistic of `counts` against equal expected counts
///
/// Returns 0 when nothing was placed.
pub fn chi_square_uniform(counts: &[u64]) -> f64 {
    let total: u64 = counts.iter().sum();
    if counts.is_empty() || total == 0 {
        return 0.0;
    }

    let expected = total as f64 / counts.len() as f64;
    counts
        .iter()
        .map(|&c| {
            let d = c as f64 - expected;
            d * d / expected
        })
        .sum()
}

/// Two-sample chi-square homogeneity test over observed values
///
/// Each sample is a list of observations (e.g. one spread per trial). Values
/// are bucketed into categories; adjacent categories are merged in ascending
/// order until each holds at least `min_pooled` observations across both
/// samples.
///
/// Returns `(statistic, degrees_of_freedom)`.
pub fn chi_square_homogeneity(a: &[u64], b: &[u64], min_pooled: u64) -> (f64, usize) {
    if a.is_empty() || b.is_empty() {
        return (0.0, 0);
    }

    let mut categories: BTreeMap<u64, (u64, u64)> = BTreeMap::new();
    for &v in a {
        categories.entry(v).or_default().0 += 1;
    }
    for &v in b {
        categories.entry(v).or_default().1 += 1;
    }

    let mut bins: Vec<(u64, u64)> = Vec::new();
    let mut pending = (0u64, 0u64);
    for (_, (ca, cb)) in categories {
        pending.0 += ca;
        pending.1 += cb;
        if pending.0 + pending.1 >= min_pooled {
            bins.push(pending);
            pending = (0, 0);
        }
    }
    if pending.0 + pending.1 > 0 {
        match bins.last_mut() {
            Some(last) => {
                last.0 += pending.0;
                last.1 += pending.1;
            }
            None => bins.push(pending),
        }
    }

    let na = a.len() as f64;
    let nb = b.len() as f64;
    let n = na + nb;

    let mut stat = 0.0;
    for &(oa, ob) in &bins {
        let pooled = (oa + ob) as f64;
        let ea = pooled * na / n;
        let eb = pooled * nb / n;
        stat += (oa as f64 - ea).powi(2) / ea + (ob as f64 - eb).powi(2) / eb;
    }

    (stat, bins.len().saturating_sub(1))
}

/// Approximate chi-square critical value for `df` degrees of freedom
///
/// Wilson–Hilferty cube approximation combined with a rational approximation
/// of the normal upper quantile (Abramowitz & Stegun 26.2.23). Slightly
/// conservative for `df == 1`.
pub fn chi_square_critical(df: usize, alpha: f64) -> f64 {
    if df == 0 {
        return 0.0;
    }
    let z = normal_upper_quantile(alpha);
    let k = df as f64;
    let h = 2.0 / (9.0 * k);
    k * (1.0 - h + z * h.sqrt()).powi(3)
}

/// `z` such that `P(Z > z) = p` for a standard normal `Z`
fn normal_upper_quantile(p: f64) -> f64 {
    let (p, sign) = if p > 0.5 { (1.0 - p, -1.0) } else { (p, 1.0) };
    let p = p.max(f64::MIN_POSITIVE);

    const C0: f64 = 2.515517;
    const C1: f64 = 0.802853;
    const C2: f64 = 0.010328;
    const D1: f64 = 1.432788;
    const D2: f64 = 0.189269;
    const D3: f64 = 0.001308;

    let t = (-2.0 * p.ln()).sqrt();
    let z = t - (C0 + C1 * t + C2 * t * t) / (1.0 + D1 * t + D2 * t * t + D3 * t * t * t);
    sign * z
}

/// Count how many values fall into each of `bins` equal-width bins over `[xmin, xmax]`
///
/// The last bin is closed on the right. Values outside the range are dropped.
pub fn bin_counts(values: &[u64], bins: usize, xmin: u64, xmax: u64) -> Vec<u64> {
    let mut out = vec![0u64; bins];
    if bins == 0 || xmax < xmin {
        return out;
    }

    let width = (xmax - xmin) as f64 / bins as f64;
    for &v in values {
        if v < xmin || v > xmax {
            continue;
        }
        let idx = if width == 0.0 {
            0
        } else {
            (((v - xmin) as f64 / width) as usize).min(bins - 1)
        };
        out[idx] += 1;
    }
    out
}
