//! Per-bucket load histogram using HdrHistogram
//!
//! Records the final count of every bucket so reports can quote load
//! percentiles (p50, p99, ...) next to min/max. Histograms from several
//! trials merge into one.
//!
//! # Example
//!
//! ```
//! use uniform_outcomes::stats::histogram::LoadHistogram;
//!
//! let hist = LoadHistogram::from_counts(&[98, 100, 101, 99, 102]).unwrap();
//! assert_eq!(hist.len(), 5);
//! assert_eq!(hist.min(), Some(98));
//! assert_eq!(hist.max(), Some(102));
//! ```

use crate::Result;
use anyhow::Context;
use hdrhistogram::Histogram;

/// Histogram of bucket loads
///
/// Auto-resizing with 3 significant digits, so loads up to a few thousand are
/// exact and larger loads are accurate to within 0.1%.
#[derive(Debug, Clone)]
pub struct LoadHistogram {
    histogram: Histogram<u64>,
}

impl LoadHistogram {
    /// Create an empty histogram
    pub fn new() -> Result<Self> {
        let histogram = Histogram::new(3).context("Failed to create load histogram")?;
        Ok(Self { histogram })
    }

    /// Create a histogram holding one sample per bucket count
    pub fn from_counts(counts: &[u64]) -> Result<Self> {
        let mut hist = Self::new()?;
        for &c in counts {
            hist.record(c)?;
        }
        Ok(hist)
    }

    /// Record one bucket's load
    #[inline]
    pub fn record(&mut self, load: u64) -> Result<()> {
        self.histogram
            .record(load)
            .map_err(|e| anyhow::anyhow!("Failed to record load {}: {}", load, e))
    }

    /// Load at the given percentile (0.0-100.0)
    pub fn percentile(&self, percentile: f64) -> Option<u64> {
        if self.is_empty() {
            return None;
        }
        Some(self.histogram.value_at_percentile(percentile))
    }

    pub fn min(&self) -> Option<u64> {
        if self.is_empty() {
            return None;
        }
        Some(self.histogram.min())
    }

    pub fn max(&self) -> Option<u64> {
        if self.is_empty() {
            return None;
        }
        Some(self.histogram.max())
    }

    /// Number of recorded bucket loads
    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Merge another histogram into this one
    ///
    /// Used to pool bucket loads across trials.
    pub fn merge(&mut self, other: &LoadHistogram) -> Result<()> {
        self.histogram
            .add(&other.histogram)
            .map_err(|e| anyhow::anyhow!("Failed to merge histograms: {}", e))
    }
}
