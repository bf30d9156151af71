//! Level-partitioned randomizer
//!
//! Samples the same distribution as the reference randomizer,
//! `P(i) ∝ exp(-beta * (count_i - baseline))`, without touching every bucket
//! on every call.
//!
//! # Layout
//!
//! ```text
//! counts:    [2, 3, 2, 4, 3]          count per bucket handle
//! levels:    2 -> [0, 2]              absolute count -> member handles
//!            3 -> [4, 1]
//!            4 -> [3]
//! positions: [0, 1, 1, 0, 0]          slot of each handle in its level
//! baseline:  2                        smallest key in `levels`
//! ```
//!
//! Every bucket of a level shares one weight, so a placement first picks a
//! level with probability `|L| * exp(-beta * (c - baseline))`, then a member
//! uniformly. Moving the winner to level `c + 1` is a swap-and-pop on the
//! source level and a push on the destination.
//!
//! # Performance
//!
//! | Operation          | Time                 |
//! |--------------------|----------------------|
//! | `sample_and_place` | O(active levels)     |
//! | `add_buckets(n)`   | O(n)                 |
//! | `remove_bucket`    | O(buckets)           |
//!
//! The number of active levels stays small while `beta > 0`, since the bias
//! keeps pulling outliers back toward the baseline.

use super::weights::WeightCache;
use super::Randomizer;
use crate::error::{validate_params, PlacementError};
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Amortized fairness-biased randomizer
///
/// Levels are kept in a `BTreeMap` so they are always walked in ascending
/// count order. Two instances built from the same seed and fed the same
/// operations therefore return the same handles.
#[derive(Debug, Clone)]
pub struct FastRandomizer {
    beta: f64,
    rng: Xoshiro256PlusPlus,

    /// Absolute count per bucket handle
    counts: Vec<u64>,

    /// Absolute count -> handles holding that count (never empty)
    levels: BTreeMap<u64, Vec<usize>>,

    /// Slot of each handle inside its level
    positions: Vec<usize>,

    /// Smallest key in `levels`
    baseline: u64,

    weights: WeightCache,

    /// Per-call `(count, level weight)` pairs, reused across calls
    scratch: Vec<(u64, f64)>,
}

impl FastRandomizer {
    /// Create a randomizer with `num_buckets` empty buckets
    ///
    /// # Arguments
    ///
    /// * `num_buckets` - Initial number of buckets (must be > 0)
    /// * `beta` - Bias against excess load (must be finite and >= 0)
    /// * `seed` - RNG seed; `None` seeds from OS entropy
    ///
    /// # Errors
    ///
    /// Returns a config-class [`PlacementError`] for invalid parameters.
    pub fn new(num_buckets: usize, beta: f64, seed: Option<u64>) -> Result<Self, PlacementError> {
        validate_params(num_buckets, beta)?;

        let rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut levels = BTreeMap::new();
        levels.insert(0, (0..num_buckets).collect());

        Ok(Self {
            beta,
            rng,
            counts: vec![0; num_buckets],
            levels,
            positions: (0..num_buckets).collect(),
            baseline: 0,
            weights: WeightCache::new(beta),
            scratch: Vec::new(),
        })
    }

    /// Current minimum count across all buckets
    pub fn baseline(&self) -> u64 {
        self.baseline
    }

    /// Number of distinct counts currently present (the active spread)
    pub fn active_levels(&self) -> usize {
        self.levels.len()
    }

    /// Choose a level and a slot inside it from the weighted distribution
    fn pick_weighted(&mut self) -> Result<(u64, usize), PlacementError> {
        let base = self.baseline;
        self.scratch.clear();

        let mut total = 0.0;
        for (&count, members) in &self.levels {
            let w = members.len() as f64 * self.weights.weight(count - base);
            self.scratch.push((count, w));
            total += w;
        }

        let r = self.rng.gen::<f64>() * total;
        if let Some(idx) = cumulative_index(&self.scratch, r) {
            let count = self.scratch[idx].0;
            let len = self.level_len(count)?;
            return Ok((count, self.rng.gen_range(0..len)));
        }

        // Rounding left r past the last cumulative sum: take the tail of the last level
        let &(count, _) = self.scratch.last().ok_or(PlacementError::Empty)?;
        trace!(count, r, total, "weighted walk exhausted, using last level");
        Ok((count, self.level_len(count)? - 1))
    }

    fn level_len(&self, count: u64) -> Result<usize, PlacementError> {
        self.levels
            .get(&count)
            .map(Vec::len)
            .ok_or(PlacementError::MissingLevel { count })
    }

    /// Move the bucket at `levels[count][pos]` up to `count + 1`
    ///
    /// Returns the moved handle.
    fn promote(&mut self, count: u64, pos: usize) -> Result<usize, PlacementError> {
        let members = self
            .levels
            .get_mut(&count)
            .ok_or(PlacementError::MissingLevel { count })?;

        let bucket = members.swap_remove(pos);
        if let Some(&moved) = members.get(pos) {
            self.positions[moved] = pos;
        }
        let emptied = members.is_empty();
        if emptied {
            self.levels.remove(&count);
        }

        let next = count + 1;
        let dest = self.levels.entry(next).or_default();
        self.positions[bucket] = dest.len();
        dest.push(bucket);
        self.counts[bucket] = next;

        if emptied && count == self.baseline {
            // Terminates: `next` was just populated
            self.baseline += 1;
            while !self.levels.contains_key(&self.baseline) {
                self.baseline += 1;
            }
        }

        Ok(bucket)
    }
}

#[cfg(test)]
impl FastRandomizer {
    /// Build a randomizer holding the given counts
    pub(crate) fn from_counts(counts: &[u64], beta: f64, seed: u64) -> Self {
        let mut r = Self::new(counts.len(), beta, Some(seed)).unwrap();
        r.levels.clear();
        for (b, &c) in counts.iter().enumerate() {
            let level = r.levels.entry(c).or_default();
            r.positions[b] = level.len();
            level.push(b);
        }
        r.counts = counts.to_vec();
        r.baseline = counts.iter().copied().min().unwrap_or(0);
        r
    }
}

impl Randomizer for FastRandomizer {
    fn sample_and_place(&mut self) -> Result<usize, PlacementError> {
        let k = self.counts.len();
        if k == 0 {
            return Err(PlacementError::Empty);
        }

        let (count, pos) = if self.beta == 0.0 {
            let b = self.rng.gen_range(0..k);
            (self.counts[b], self.positions[b])
        } else {
            self.pick_weighted()?
        };

        self.promote(count, pos)
    }

    fn add_buckets(&mut self, n: usize) -> Result<(), PlacementError> {
        if n == 0 {
            return Err(PlacementError::EmptyGrowth);
        }

        let start = self.counts.len();
        let base = self.baseline;
        let level = self.levels.entry(base).or_default();

        for b in start..start + n {
            self.counts.push(base);
            self.positions.push(level.len());
            level.push(b);
        }

        debug!(added = n, buckets = self.counts.len(), baseline = base, "added buckets");
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

        let count = self.counts[index];
        let pos = self.positions[index];
        let members = self
            .levels
            .get_mut(&count)
            .ok_or(PlacementError::MissingLevel { count })?;
        members.swap_remove(pos);
        if members.is_empty() {
            self.levels.remove(&count);
        }

        self.counts.remove(index);

        // Keep handles dense: everything above `index` shifts down by one
        for members in self.levels.values_mut() {
            for b in members.iter_mut() {
                if *b > index {
                    *b -= 1;
                }
            }
        }

        self.positions = vec![0; len - 1];
        for members in self.levels.values() {
            for (slot, &b) in members.iter().enumerate() {
                self.positions[b] = slot;
            }
        }

        if let Some(&min) = self.levels.keys().next() {
            self.baseline = min;
        }

        debug!(index, removed_count = count, buckets = len - 1, baseline = self.baseline, "removed bucket");
        Ok(())
    }

    fn bucket_count(&self) -> usize {
        self.counts.len()
    }

    fn snapshot_counts(&self) -> Vec<u64> {
        self.counts.clone()
    }
}

/// Index of the first entry whose running weight reaches `r`
///
/// `None` when floating-point rounding leaves `r` above the final sum.
fn cumulative_index(levels: &[(u64, f64)], r: f64) -> Option<usize> {
    let mut acc = 0.0;
    for (idx, &(_, w)) in levels.iter().enumerate() {
        acc += w;
        if r <= acc {
            return Some(idx);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::stats::{chi_square_critical, chi_square_uniform};

    impl FastRandomizer {
        /// Check level membership, positions and baseline against `counts`
        fn assert_consistent(&self) {
            let mut members = 0;
            for (&count, level) in &self.levels {
                assert!(!level.is_empty(), "empty level {} persisted", count);
                for (slot, &b) in level.iter().enumerate() {
                    assert_eq!(self.counts[b], count, "bucket {} in wrong level", b);
                    assert_eq!(self.positions[b], slot, "bucket {} has stale position", b);
                }
                members += level.len();
            }
            assert_eq!(members, self.counts.len(), "level membership does not cover every bucket");
            assert_eq!(self.positions.len(), self.counts.len());
            assert_eq!(Some(&self.baseline), self.counts.iter().min());
            assert_eq!(Some(&self.baseline), self.levels.keys().next());
        }
    }

    #[test]
    fn test_fast_new_invalid_params() {
        let err = FastRandomizer::new(0, 1.0, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = FastRandomizer::new(4, -0.5, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_fast_initial_state() {
        let r = FastRandomizer::new(8, 1.0, Some(1)).unwrap();
        assert_eq!(r.bucket_count(), 8);
        assert_eq!(r.snapshot_counts(), vec![0; 8]);
        assert_eq!(r.baseline(), 0);
        assert_eq!(r.active_levels(), 1);
        r.assert_consistent();
    }

    #[test]
    fn test_fast_unseeded() {
        let mut r = FastRandomizer::new(4, 1.0, None).unwrap();
        for _ in 0..100 {
            assert!(r.sample_and_place().unwrap() < 4);
        }
        assert_eq!(r.snapshot_counts().iter().sum::<u64>(), 100);
    }

    #[test]
    fn test_fast_conservation() {
        for beta in [0.0, 0.5, 1.0, 4.0] {
            let mut r = FastRandomizer::new(13, beta, Some(7)).unwrap();
            for k in 1..=5000u64 {
                let b = r.sample_and_place().unwrap();
                assert!(b < 13);
                if k % 1000 == 0 {
                    assert_eq!(r.snapshot_counts().iter().sum::<u64>(), k);
                }
            }
        }
    }

    #[test]
    fn test_fast_returned_handle_was_incremented() {
        let mut r = FastRandomizer::new(6, 1.0, Some(3)).unwrap();
        for _ in 0..500 {
            let before = r.snapshot_counts();
            let b = r.sample_and_place().unwrap();
            let after = r.snapshot_counts();
            assert_eq!(after[b], before[b] + 1);
            for i in (0..6).filter(|&i| i != b) {
                assert_eq!(after[i], before[i]);
            }
        }
    }

    #[test]
    fn test_fast_partition_integrity_mixed_operations() {
        let mut r = FastRandomizer::new(5, 0.8, Some(99)).unwrap();
        let mut placed = 0u64;
        let mut removed = 0u64;
        // New buckets arrive already holding the baseline count
        let mut added = 0u64;

        for round in 0..40 {
            for _ in 0..50 {
                r.sample_and_place().unwrap();
                placed += 1;
                r.assert_consistent();
            }
            if round % 3 == 0 {
                added += 2 * r.baseline();
                r.add_buckets(2).unwrap();
            } else if r.bucket_count() > 1 {
                let idx = round % r.bucket_count();
                removed += r.snapshot_counts()[idx];
                r.remove_bucket(idx).unwrap();
            }
            r.assert_consistent();
            assert_eq!(r.snapshot_counts().iter().sum::<u64>(), placed + added - removed);
        }
    }

    #[test]
    fn test_fast_partition_integrity_beta_zero() {
        let mut r = FastRandomizer::new(10, 0.0, Some(5)).unwrap();
        for _ in 0..2000 {
            r.sample_and_place().unwrap();
            r.assert_consistent();
        }
    }

    #[test]
    fn test_fast_uniform_when_beta_zero() {
        let buckets = 20;
        let placements = 200_000;
        let mut r = FastRandomizer::new(buckets, 0.0, Some(2024)).unwrap();
        for _ in 0..placements {
            r.sample_and_place().unwrap();
        }

        let counts = r.snapshot_counts();
        let chi2 = chi_square_uniform(&counts);
        let critical = chi_square_critical(buckets - 1, 0.001);
        assert!(chi2 < critical, "chi2={:.2} >= critical={:.2}, counts {:?}", chi2, critical, counts);
    }

    #[test]
    fn test_fast_fairness_bound() {
        let mut r = FastRandomizer::new(100, 1.0, Some(42)).unwrap();
        for _ in 0..1_000_000 {
            r.sample_and_place().unwrap();
        }

        let counts = r.snapshot_counts();
        let max = *counts.iter().max().unwrap();
        let min = *counts.iter().min().unwrap();
        assert!(max - min <= 5, "spread {} exceeds bound (min={}, max={})", max - min, min, max);
        assert!(r.active_levels() <= 6);
        r.assert_consistent();
    }

    #[test]
    fn test_fast_growth_neutrality() {
        let mut r = FastRandomizer::new(10, 1.0, Some(11)).unwrap();
        for _ in 0..5000 {
            r.sample_and_place().unwrap();
        }
        let baseline = r.baseline();
        assert!(baseline > 0);

        r.add_buckets(3).unwrap();
        let counts = r.snapshot_counts();
        assert_eq!(counts.len(), 13);
        assert_eq!(&counts[10..], &[baseline; 3]);
        assert_eq!(r.baseline(), baseline);
        r.assert_consistent();

        // New buckets sit at zero excess, so the spread does not grow
        for _ in 0..5000 {
            r.sample_and_place().unwrap();
        }
        r.assert_consistent();
        assert_eq!(r.snapshot_counts().iter().sum::<u64>(), 10_000 + 3 * baseline);
    }

    #[test]
    fn test_fast_add_zero_rejected() {
        let mut r = FastRandomizer::new(3, 1.0, Some(1)).unwrap();
        r.sample_and_place().unwrap();
        let before = r.snapshot_counts();

        let err = r.add_buckets(0).unwrap_err();
        assert_eq!(err, PlacementError::EmptyGrowth);
        assert_eq!(err.kind(), ErrorKind::Value);
        assert_eq!(r.snapshot_counts(), before);
        r.assert_consistent();
    }

    #[test]
    fn test_fast_shrink_renumbering() {
        let mut r = FastRandomizer::from_counts(&[5, 2, 7], 1.0, 1);
        assert_eq!(r.baseline(), 2);

        r.remove_bucket(1).unwrap();
        assert_eq!(r.bucket_count(), 2);
        assert_eq!(r.snapshot_counts(), vec![5, 7]);
        assert_eq!(r.baseline(), 5);
        r.assert_consistent();

        // Former handle 2 now answers as handle 1
        assert_eq!(r.levels.get(&7), Some(&vec![1]));
    }

    #[test]
    fn test_fast_remove_keeps_shared_baseline() {
        let mut r = FastRandomizer::from_counts(&[3, 3, 4, 6], 1.0, 1);
        r.remove_bucket(0).unwrap();
        assert_eq!(r.snapshot_counts(), vec![3, 4, 6]);
        assert_eq!(r.baseline(), 3);
        r.assert_consistent();
    }

    #[test]
    fn test_fast_remove_errors_leave_state_intact() {
        let mut r = FastRandomizer::from_counts(&[1, 2], 1.0, 1);

        let err = r.remove_bucket(2).unwrap_err();
        assert_eq!(err, PlacementError::OutOfRange { index: 2, len: 2 });
        assert_eq!(err.kind(), ErrorKind::Range);
        assert_eq!(r.snapshot_counts(), vec![1, 2]);

        r.remove_bucket(0).unwrap();
        let err = r.remove_bucket(0).unwrap_err();
        assert_eq!(err, PlacementError::LastBucket);
        assert_eq!(err.kind(), ErrorKind::Invariant);
        assert_eq!(r.snapshot_counts(), vec![2]);
        r.assert_consistent();
    }

    #[test]
    fn test_fast_single_bucket() {
        let mut r = FastRandomizer::new(1, 2.0, Some(8)).unwrap();
        for _ in 0..100 {
            assert_eq!(r.sample_and_place().unwrap(), 0);
        }
        assert_eq!(r.snapshot_counts(), vec![100]);
        assert_eq!(r.baseline(), 100);
        assert_eq!(r.active_levels(), 1);
    }

    #[test]
    fn test_fast_baseline_advances() {
        // Lone bucket at the baseline; everything else sits two levels up
        let mut r = FastRandomizer::from_counts(&[0, 2, 2], 50.0, 4);
        let b = r.sample_and_place().unwrap();
        // With beta = 50 the lone bucket at the baseline is all but certain
        assert_eq!(b, 0);
        assert_eq!(r.baseline(), 1);
        r.sample_and_place().unwrap();
        assert_eq!(r.baseline(), 2);
        r.assert_consistent();
    }

    #[test]
    fn test_fast_determinism() {
        let run = |seed: u64| {
            let mut r = FastRandomizer::new(12, 0.7, Some(seed)).unwrap();
            let mut handles = Vec::new();
            for i in 0..3000 {
                handles.push(r.sample_and_place().unwrap());
                if i == 1000 {
                    r.add_buckets(4).unwrap();
                }
                if i == 2000 {
                    r.remove_bucket(3).unwrap();
                }
            }
            (handles, r.snapshot_counts())
        };

        let (h1, c1) = run(12345);
        let (h2, c2) = run(12345);
        assert_eq!(h1, h2);
        assert_eq!(c1, c2);

        let (h3, _) = run(54321);
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_cumulative_index() {
        let levels = [(3, 1.0), (4, 0.5), (5, 0.25)];
        assert_eq!(cumulative_index(&levels, 0.0), Some(0));
        assert_eq!(cumulative_index(&levels, 1.0), Some(0));
        assert_eq!(cumulative_index(&levels, 1.2), Some(1));
        assert_eq!(cumulative_index(&levels, 1.75), Some(2));
        assert_eq!(cumulative_index(&levels, 1.7500001), None);
        assert_eq!(cumulative_index(&[], 0.0), None);
    }

    #[test]
    fn test_fast_snapshot_is_a_copy() {
        let mut r = FastRandomizer::new(3, 1.0, Some(1)).unwrap();
        let mut snap = r.snapshot_counts();
        snap[0] = 1000;
        r.sample_and_place().unwrap();
        assert_eq!(r.snapshot_counts().iter().sum::<u64>(), 1);
        r.assert_consistent();
    }
}
