//! Reference randomizer
//!
//! Straightforward O(buckets)-per-call implementation of the biased
//! distribution: every placement recomputes the baseline and every bucket's
//! weight from scratch. It is slow on purpose and exists as a correctness
//! oracle for [`FastRandomizer`](super::fast::FastRandomizer), which must
//! produce statistically indistinguishable outcomes (not the same draws).

use super::Randomizer;
use crate::error::{validate_params, PlacementError};
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::debug;

/// Naive fairness-biased randomizer
#[derive(Debug, Clone)]
pub struct ReferenceRandomizer {
    beta: f64,
    counts: Vec<u64>,
    rng: Xoshiro256PlusPlus,
    weights: Vec<f64>,
}

impl ReferenceRandomizer {
    /// Create a randomizer with `num_buckets` empty buckets
    ///
    /// Same parameter rules as `FastRandomizer::new`.
    pub fn new(num_buckets: usize, beta: f64, seed: Option<u64>) -> Result<Self, PlacementError> {
        validate_params(num_buckets, beta)?;

        let rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        Ok(Self {
            beta,
            counts: vec![0; num_buckets],
            rng,
            weights: Vec::with_capacity(num_buckets),
        })
    }

    fn baseline(&self) -> Option<u64> {
        self.counts.iter().min().copied()
    }

    #[cfg(test)]
    pub(crate) fn from_counts(counts: &[u64], beta: f64, seed: u64) -> Self {
        let mut r = Self::new(counts.len(), beta, Some(seed)).unwrap();
        r.counts = counts.to_vec();
        r
    }
}

impl Randomizer for ReferenceRandomizer {
    fn sample_and_place(&mut self) -> Result<usize, PlacementError> {
        let baseline = self.baseline().ok_or(PlacementError::Empty)?;

        self.weights.clear();
        let mut total = 0.0;
        for &c in &self.counts {
            let w = (-self.beta * (c - baseline) as f64).exp();
            self.weights.push(w);
            total += w;
        }

        let r = self.rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for (i, &w) in self.weights.iter().enumerate() {
            cumulative += w;
            if r <= cumulative {
                self.counts[i] += 1;
                return Ok(i);
            }
        }

        let last = self.counts.len() - 1;
        self.counts[last] += 1;
        Ok(last)
    }

    fn add_buckets(&mut self, n: usize) -> Result<(), PlacementError> {
        if n == 0 {
            return Err(PlacementError::EmptyGrowth);
        }

        // Zero excess, like the fast randomizer
        let baseline = self.baseline().unwrap_or(0);
        self.counts.extend(std::iter::repeat(baseline).take(n));
        debug!(added = n, buckets = self.counts.len(), baseline, "added buckets");
        Ok(())
    }

    fn remove_bucket(&mut self, index: usize) -> Result<(), PlacementError> {
        let len = self.counts.len();
        if index >= len {
            return Err(PlacementError::OutOfRange { index, len });
        }
        if len == 1 {
            return Err(PlacementError::LastBucket);
        }

        self.counts.remove(index);
        debug!(index, buckets = self.counts.len(), "removed bucket");
        Ok(())
    }

    fn bucket_count(&self) -> usize {
        self.counts.len()
    }

    fn snapshot_counts(&self) -> Vec<u64> {
        self.counts.clone()
    }
}
