//! Error types for structured error handling.
//!
//! Every layer of the workspace reports failures through [`LookbackError`].
//! The variants fall into two groups:
//!
//! - **Fatal**: `InvalidConfig`, `EmptyScan` and `StepFailed` abort the whole
//!   pricing request.
//! - **Recoverable per step**: `DegenerateDistribution`, `ConvergenceFailure`
//!   and `Cancelled` affect a single time step; the scanner decides whether
//!   they abort the scan or mark the day as skipped.

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, LookbackError>;

/// Categorised lookback pricing errors.
///
/// # Examples
/// ```
/// use lookback_core::types::LookbackError;
///
/// let err = LookbackError::InvalidConfig("n_paths must be positive".to_string());
/// assert_eq!(format!("{}", err), "Invalid configuration: n_paths must be positive");
/// assert!(!err.is_recoverable());
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookbackError {
    /// Invalid market data, grid, payoff or estimator configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The terminal distribution collapses (zero maturity, zero volatility,
    /// or empty support).
    #[error("Degenerate distribution at maturity {maturity}: {reason}")]
    DegenerateDistribution {
        /// Time to maturity in years
        maturity: f64,
        /// What collapsed
        reason: String,
    },

    /// The resolution-bounded estimator ran out of its iteration budget
    /// before reaching the target precision.
    #[error(
        "Convergence failure after {iterations} iterations ({shots} shots): \
         half-width {half_width:.3e} above target {target:.3e}"
    )]
    ConvergenceFailure {
        /// Refinement rounds completed
        iterations: usize,
        /// Total oracle shots spent
        shots: u64,
        /// Amplitude half-width reached
        half_width: f64,
        /// Requested half-width
        target: f64,
    },

    /// Estimation was cancelled or hit its wall-clock budget.
    #[error("Estimation cancelled after {iterations} iterations")]
    Cancelled {
        /// Refinement rounds completed before cancellation
        iterations: usize,
    },

    /// No time step produced a price, so there is nothing to select from.
    #[error("No priced time steps available for extremum selection")]
    EmptyScan,

    /// A time step failed and the scan was configured to fail fast.
    #[error("Day {day} failed: {source}")]
    StepFailed {
        /// 1-based day index of the failing step
        day: usize,
        /// The underlying per-step error
        #[source]
        source: Box<LookbackError>,
    },
}

impl LookbackError {
    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a degenerate distribution error.
    pub fn degenerate(maturity: f64, reason: impl Into<String>) -> Self {
        Self::DegenerateDistribution {
            maturity,
            reason: reason.into(),
        }
    }

    /// Returns true for errors that only invalidate a single time step.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DegenerateDistribution { .. }
                | Self::ConvergenceFailure { .. }
                | Self::Cancelled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LookbackError::degenerate(0.0, "maturity must be positive");
        assert!(err.to_string().contains("maturity must be positive"));

        let err = LookbackError::ConvergenceFailure {
            iterations: 12,
            shots: 1200,
            half_width: 0.05,
            target: 0.01,
        };
        assert!(err.to_string().contains("12 iterations"));
        assert!(err.to_string().contains("1200 shots"));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(LookbackError::degenerate(0.0, "x").is_recoverable());
        assert!(LookbackError::Cancelled { iterations: 3 }.is_recoverable());
        assert!(LookbackError::ConvergenceFailure {
            iterations: 1,
            shots: 1,
            half_width: 1.0,
            target: 0.1,
        }
        .is_recoverable());

        assert!(!LookbackError::invalid_config("x").is_recoverable());
        assert!(!LookbackError::EmptyScan.is_recoverable());
    }

    #[test]
    fn test_step_failed_wraps_source() {
        use std::error::Error;

        let err = LookbackError::StepFailed {
            day: 7,
            source: Box::new(LookbackError::Cancelled { iterations: 2 }),
        };
        assert!(err.to_string().starts_with("Day 7 failed"));
        assert!(err.source().is_some());
        assert!(!err.is_recoverable());
    }
}
