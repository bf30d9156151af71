//! uniform-outcomes - fairness-biased randomized placement
//!
//! Places units of work (balls) onto targets (buckets) so that final
//! per-bucket counts stay nearly equal, even when several schedulers place
//! independently without sharing state.
//!
//! # Architecture
//!
//! - **Randomizers**: [`FastRandomizer`] samples through a level-partitioned
//!   structure in time proportional to the number of distinct counts;
//!   [`ReferenceRandomizer`] is the naive O(buckets) oracle it is checked against
//! - **Simulation**: Monte Carlo harness comparing placement methods
//! - **Statistics**: summary statistics, chi-square tests, load percentiles
//! - **Output**: text and JSON reports
//!
//! # Example
//!
//! ```
//! use uniform_outcomes::{FastRandomizer, Randomizer};
//!
//! let mut r = FastRandomizer::new(4, 1.0, Some(7)).unwrap();
//! for _ in 0..100 {
//!     r.sample_and_place().unwrap();
//! }
//! let counts = r.snapshot_counts();
//! assert_eq!(counts.iter().sum::<u64>(), 100);
//! ```

pub mod config;
pub mod error;
pub mod output;
pub mod randomizer;
pub mod simulation;
pub mod stats;
pub mod util;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorKind, PlacementError};
pub use randomizer::{FastRandomizer, Randomizer, ReferenceRandomizer};

/// Result type used throughout uniform-outcomes
pub type Result<T> = anyhow::Result<T>;
