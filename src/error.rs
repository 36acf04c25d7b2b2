//! Error type shared by every fit.
//!
//! A fit either produces a result record or one of these errors. Running out of
//! iterations is *not* an error: the driver reports it through
//! [`StopReason`](crate::domain::StopReason) and returns the best iterate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum FitError {
    /// The point cloud was empty.
    #[error("no data points to fit")]
    EmptyInput,

    /// Fewer points than the model needs to be determined.
    #[error("not enough data points: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A linear solve, integration or evaluation produced an unusable value.
    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    /// A fitted circle does not cross the baseline.
    #[error("circle does not intersect the baseline")]
    NonIntersectingGeometry,

    /// Geometry that cannot be represented (zero-length line, etc.).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// A configuration value was out of range or could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FitError {
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::NumericalFailure(message.into())
    }

    /// Reject empty or too-small point clouds.
    pub fn check_len(got: usize, needed: usize) -> Result<(), FitError> {
        if got == 0 {
            return Err(FitError::EmptyInput);
        }
        if got < needed {
            return Err(FitError::InsufficientData { needed, got });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_len_distinguishes_empty_from_short() {
        assert_eq!(FitError::check_len(0, 3), Err(FitError::EmptyInput));
        assert_eq!(
            FitError::check_len(2, 3),
            Err(FitError::InsufficientData { needed: 3, got: 2 })
        );
        assert!(FitError::check_len(3, 3).is_ok());
    }

    #[test]
    fn messages_are_readable() {
        let e = FitError::InsufficientData { needed: 5, got: 1 };
        assert_eq!(e.to_string(), "not enough data points: need at least 5, got 1");
    }
}
