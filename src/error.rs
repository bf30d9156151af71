//! Typed errors for the placement core
//!
//! The randomizers report every rejected operation through [`PlacementError`].
//! Each variant belongs to one [`ErrorKind`], so callers can branch on the
//! class of failure without matching individual variants.
//!
//! A rejected operation never mutates the randomizer: every check runs before
//! the first write.

use thiserror::Error;

/// Class of a placement failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid construction parameters
    Config,
    /// Bucket handle outside `[0, bucket_count)`
    Range,
    /// Operation would break a structural invariant (programming error)
    Invariant,
    /// Invalid argument to a growth operation
    Value,
}

/// Error returned by randomizer operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error("num_buckets must be > 0")]
    NoBuckets,

    #[error("beta must be a finite value >= 0, got {0}")]
    InvalidBeta(f64),

    #[error("bucket index {index} out of range (bucket count {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("cannot remove the last remaining bucket")]
    LastBucket,

    #[error("no buckets available")]
    Empty,

    #[error("level {count} is missing from the level map")]
    MissingLevel { count: u64 },

    #[error("n must be > 0")]
    EmptyGrowth,
}

impl PlacementError {
    /// Get the failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlacementError::NoBuckets | PlacementError::InvalidBeta(_) => ErrorKind::Config,
            PlacementError::OutOfRange { .. } => ErrorKind::Range,
            PlacementError::LastBucket
            | PlacementError::Empty
            | PlacementError::MissingLevel { .. } => ErrorKind::Invariant,
            PlacementError::EmptyGrowth => ErrorKind::Value,
        }
    }
}

/// Check construction parameters shared by every randomizer
pub(crate) fn validate_params(num_buckets: usize, beta: f64) -> Result<(), PlacementError> {
    if num_buckets == 0 {
        return Err(PlacementError::NoBuckets);
    }
    // NaN fails the range check; +inf would turn exp(-beta * 0) into NaN
    if !(beta >= 0.0) || !beta.is_finite() {
        return Err(PlacementError::InvalidBeta(beta));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(PlacementError::NoBuckets.kind(), ErrorKind::Config);
        assert_eq!(PlacementError::InvalidBeta(-1.0).kind(), ErrorKind::Config);
        assert_eq!(PlacementError::OutOfRange { index: 3, len: 2 }.kind(), ErrorKind::Range);
        assert_eq!(PlacementError::LastBucket.kind(), ErrorKind::Invariant);
        assert_eq!(PlacementError::Empty.kind(), ErrorKind::Invariant);
        assert_eq!(PlacementError::EmptyGrowth.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_validate_params() {
        assert!(validate_params(1, 0.0).is_ok());
        assert!(validate_params(10, 2.5).is_ok());
        assert_eq!(validate_params(0, 1.0), Err(PlacementError::NoBuckets));
        assert!(matches!(validate_params(4, -0.1), Err(PlacementError::InvalidBeta(_))));
        assert!(matches!(validate_params(4, f64::NAN), Err(PlacementError::InvalidBeta(_))));
        assert!(matches!(validate_params(4, f64::INFINITY), Err(PlacementError::InvalidBeta(_))));
    }

    #[test]
    fn test_error_messages() {
        let err = PlacementError::OutOfRange { index: 7, len: 3 };
        assert_eq!(err.to_string(), "bucket index 7 out of range (bucket count 3)");
        assert_eq!(PlacementError::LastBucket.to_string(), "cannot remove the last remaining bucket");
    }
}
