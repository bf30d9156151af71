//! Memoized excess → weight transform
//!
//! Sampling evaluates `exp(-beta * delta)` once per active level per call. The
//! deltas stay small while the bias is doing its job, so the values are cached
//! by delta. Keys are relative to the baseline, which means a baseline shift
//! never invalidates an entry.

/// Deltas at or above this are computed on every call instead of cached
const MAX_CACHED_DELTA: u64 = 1 << 16;

/// Cache of unnormalized weights keyed by excess over the baseline
#[derive(Debug, Clone)]
pub struct WeightCache {
    beta: f64,
    /// `slots[delta]` is `Some(exp(-beta * delta))` once that delta was seen
    slots: Vec<Option<f64>>,
}

impl WeightCache {
    /// Create a cache seeded with `0 → 1.0`
    pub fn new(beta: f64) -> Self {
        Self {
            beta,
            slots: vec![Some(1.0)],
        }
    }

    /// Weight for a bucket `delta` above the baseline
    #[inline]
    pub fn weight(&mut self, delta: u64) -> f64 {
        if delta >= MAX_CACHED_DELTA {
            return self.compute(delta);
        }

        // Below the cap, so the cast cannot truncate
        let idx = delta as usize;
        if let Some(Some(w)) = self.slots.get(idx) {
            return *w;
        }

        let w = self.compute(delta);
        if idx >= self.slots.len() {
            self.slots.resize(idx + 1, None);
        }
        self.slots[idx] = Some(w);
        w
    }

    #[inline]
    fn compute(&self, delta: u64) -> f64 {
        (-self.beta * delta as f64).exp()
    }

    /// Number of deltas computed so far
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|w| w.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
