//! Fairness-biased placement randomizers
//!
//! A randomizer owns a fixed set of buckets (servers, shards, workers) and a
//! load counter per bucket. Every placement picks bucket `i` with probability
//!
//! ```text
//! P(i) ∝ exp(-beta * (count_i - min(counts)))
//! ```
//!
//! and increments its counter. Only the *excess* over the global minimum is
//! penalized, so the distribution is unchanged when every bucket gains the
//! same load. `beta = 0` reduces to uniform IID placement.
//!
//! # Implementations
//!
//! - **Fast** ([`fast::FastRandomizer`]): groups buckets into levels by count and
//!   samples a level, then a member. Cost per placement is proportional to the
//!   number of distinct levels (the *active spread*), not the number of buckets.
//! - **Reference** ([`reference::ReferenceRandomizer`]): recomputes every
//!   bucket's weight on every call. O(buckets) per placement; used as a
//!   correctness oracle.
//!
//! # Example
//!
//! ```
//! use uniform_outcomes::randomizer::{Randomizer, fast::FastRandomizer};
//!
//! let mut r = FastRandomizer::new(16, 1.0, Some(42)).unwrap();
//! for _ in 0..1000 {
//!     let bucket = r.sample_and_place().unwrap();
//!     assert!(bucket < 16);
//! }
//!
//! let counts = r.snapshot_counts();
//! assert_eq!(counts.iter().sum::<u64>(), 1000);
//! ```

use crate::error::PlacementError;

/// Placement randomizer interface
///
/// Both randomizers implement this trait so the simulation harness and the
/// equivalence tests can treat them interchangeably.
///
/// # Thread Safety
///
/// Implementations are `Send` but carry no internal synchronization. Each
/// scheduler owns its own instance; a host that shares one must serialize
/// access itself.
pub trait Randomizer: Send {
    /// Pick a bucket from the biased distribution and increment its count
    ///
    /// Returns the handle of the chosen bucket, in `[0, bucket_count())`.
    fn sample_and_place(&mut self) -> Result<usize, PlacementError>;

    /// Append `n` new buckets at the current baseline
    ///
    /// New handles follow the current highest handle. Rejects `n == 0`
    /// without changing state.
    fn add_buckets(&mut self, n: usize) -> Result<(), PlacementError>;

    /// Remove a bucket and renumber every higher handle down by one
    ///
    /// Fails for an out-of-range handle or when only one bucket remains.
    fn remove_bucket(&mut self, index: usize) -> Result<(), PlacementError>;

    /// Number of live buckets
    fn bucket_count(&self) -> usize;

    /// Copy of every bucket's count, indexed by handle
    fn snapshot_counts(&self) -> Vec<u64>;
}

pub mod fast;
pub mod reference;
pub mod weights;

pub use fast::FastRandomizer;
pub use reference::ReferenceRandomizer;
