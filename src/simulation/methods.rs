//! Placement methods compared by the harness
//!
//! - **iid**: every ball picks a bucket uniformly at random
//! - **bo2**: power-of-two choices against the fresh global counts
//! - **bo2-stale**: power-of-two choices where each scheduler only sees the
//!   balls it placed itself
//! - **uniform-outcomes**: one [`FastRandomizer`] per scheduler
//! - **reference**: one [`ReferenceRandomizer`] per scheduler (slow oracle)
//!
//! Per-scheduler RNGs are seeded `seed + 1000 * (i + 1)`; the router that
//! picks a scheduler for each ball is seeded with `seed` itself.

use super::{ExperimentResult, ExperimentSpec};
use crate::randomizer::{FastRandomizer, Randomizer, ReferenceRandomizer};
use crate::util::time::Timer;
use crate::Result;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Placement method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Uniform IID placement
    Iid,
    /// Power-of-two choices, fresh global feedback
    Bo2,
    /// Power-of-two choices, stale per-scheduler views
    Bo2Stale,
    /// Fairness-biased placement, level-partitioned randomizer
    UniformOutcomes,
    /// Fairness-biased placement, naive reference randomizer
    Reference,
}

impl Method {
    /// Whether the method reads the bias parameter
    pub fn uses_beta(&self) -> bool {
        matches!(self, Method::UniformOutcomes | Method::Reference)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Method::Iid => "iid",
            Method::Bo2 => "bo2",
            Method::Bo2Stale => "bo2-stale",
            Method::UniformOutcomes => "uniform-outcomes",
            Method::Reference => "reference",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Method {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase().replace('_', "-");
        match name.as_str() {
            "iid" => Ok(Method::Iid),
            "bo2" => Ok(Method::Bo2),
            "bo2-stale" => Ok(Method::Bo2Stale),
            "uniform-outcomes" => Ok(Method::UniformOutcomes),
            "reference" => Ok(Method::Reference),
            _ => anyhow::bail!(
                "unknown method '{}'. Available: bo2, bo2-stale, iid, reference, uniform-outcomes",
                s
            ),
        }
    }
}

/// A method together with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodConfig {
    #[serde(rename = "name")]
    pub method: Method,
    /// Bias parameter (only read by the uniform-outcomes methods)
    #[serde(default = "default_beta")]
    pub beta: f64,
}

pub fn default_beta() -> f64 {
    1.0
}

impl MethodConfig {
    pub fn new(method: Method, beta: f64) -> Self {
        Self { method, beta }
    }

    /// Run this method once under `spec` with base seed `seed`
    pub fn simulate(&self, spec: &ExperimentSpec, seed: u64) -> Result<ExperimentResult> {
        match self.method {
            Method::Iid => simulate_iid(spec, seed),
            Method::Bo2 => simulate_bo2(spec, seed),
            Method::Bo2Stale => simulate_bo2_stale(spec, seed),
            Method::UniformOutcomes => simulate_uniform_outcomes(spec, seed, self.beta),
            Method::Reference => simulate_reference(spec, seed, self.beta),
        }
    }
}

/// Seed for scheduler `i` derived from the experiment seed
fn scheduler_seed(seed: u64, i: usize) -> u64 {
    seed.wrapping_add(1000 * (i as u64 + 1))
}

/// IID uniform placement
pub fn simulate_iid(spec: &ExperimentSpec, seed: u64) -> Result<ExperimentResult> {
    spec.validate()?;

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut counts = vec![0u64; spec.buckets];

    let timer = Timer::start();
    for _ in 0..spec.balls {
        counts[rng.gen_range(0..spec.buckets)] += 1;
    }

    ExperimentResult::new(Method::Iid, *spec, seed, counts, timer.elapsed(), Default::default())
}

/// Pick the less loaded of `a` and `b` in `view`, breaking ties with a coin flip
#[inline]
fn choose_of_two(view: &[u64], a: usize, b: usize, rng: &mut Xoshiro256PlusPlus) -> usize {
    if view[a] < view[b] {
        a
    } else if view[b] < view[a] {
        b
    } else if rng.gen_bool(0.5) {
        a
    } else {
        b
    }
}

/// Power-of-two choices with a single fresh global view
///
/// `spec.servers` has no effect: every decision reads the global truth, so
/// any number of schedulers behaves like one.
pub fn simulate_bo2(spec: &ExperimentSpec, seed: u64) -> Result<ExperimentResult> {
    spec.validate()?;

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut counts = vec![0u64; spec.buckets];

    let timer = Timer::start();
    for _ in 0..spec.balls {
        let a = rng.gen_range(0..spec.buckets);
        let b = rng.gen_range(0..spec.buckets);
        let chosen = choose_of_two(&counts, a, b, &mut rng);
        counts[chosen] += 1;
    }

    let mut meta = serde_json::Map::new();
    meta.insert("feedback".into(), json!("fresh_global"));
    ExperimentResult::new(Method::Bo2, *spec, seed, counts, timer.elapsed(), meta)
}

/// Power-of-two choices where each scheduler compares its own local view
pub fn simulate_bo2_stale(spec: &ExperimentSpec, seed: u64) -> Result<ExperimentResult> {
    spec.validate()?;

    let mut router = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut schedulers: Vec<(Xoshiro256PlusPlus, Vec<u64>)> = (0..spec.servers)
        .map(|i| {
            (
                Xoshiro256PlusPlus::seed_from_u64(scheduler_seed(seed, i)),
                vec![0u64; spec.buckets],
            )
        })
        .collect();
    let mut counts = vec![0u64; spec.buckets];

    let timer = Timer::start();
    for _ in 0..spec.balls {
        let s = router.gen_range(0..spec.servers);
        let (rng, local) = &mut schedulers[s];

        let a = rng.gen_range(0..spec.buckets);
        let b = rng.gen_range(0..spec.buckets);
        let chosen = choose_of_two(local, a, b, rng);

        local[chosen] += 1;
        counts[chosen] += 1;
    }

    let mut meta = serde_json::Map::new();
    meta.insert("feedback".into(), json!("stale_local"));
    meta.insert("servers".into(), json!(spec.servers));
    ExperimentResult::new(Method::Bo2Stale, *spec, seed, counts, timer.elapsed(), meta)
}

/// Route every ball to a random scheduler that owns its own randomizer
fn simulate_with<R, F>(
    method: Method,
    spec: &ExperimentSpec,
    seed: u64,
    beta: f64,
    build: F,
) -> Result<ExperimentResult>
where
    R: Randomizer,
    F: Fn(u64) -> Result<R>,
{
    spec.validate()?;

    let mut router = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut schedulers = (0..spec.servers)
        .map(|i| build(scheduler_seed(seed, i)))
        .collect::<Result<Vec<R>>>()?;
    let mut counts = vec![0u64; spec.buckets];

    let timer = Timer::start();
    for _ in 0..spec.balls {
        let s = router.gen_range(0..spec.servers);
        let b = schedulers[s].sample_and_place()?;
        counts[b] += 1;
    }

    let mut meta = serde_json::Map::new();
    meta.insert("beta".into(), json!(beta));
    meta.insert("servers".into(), json!(spec.servers));
    ExperimentResult::new(method, *spec, seed, counts, timer.elapsed(), meta)
}

/// Fairness-biased placement with one [`FastRandomizer`] per scheduler
pub fn simulate_uniform_outcomes(spec: &ExperimentSpec, seed: u64, beta: f64) -> Result<ExperimentResult> {
    simulate_with(Method::UniformOutcomes, spec, seed, beta, |s| {
        Ok(FastRandomizer::new(spec.buckets, beta, Some(s))?)
    })
}

/// Fairness-biased placement with one [`ReferenceRandomizer`] per scheduler
pub fn simulate_reference(spec: &ExperimentSpec, seed: u64, beta: f64) -> Result<ExperimentResult> {
    simulate_with(Method::Reference, spec, seed, beta, |s| {
        Ok(ReferenceRandomizer::new(spec.buckets, beta, Some(s))?)
    })
}
