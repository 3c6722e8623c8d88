//! Error types for the household solver.

use std::fmt;

use serde::{Deserialize, Serialize};
use smoothsim_math::MathError;
use thiserror::Error;

/// A specialized Result type for household computations.
pub type HouseholdResult<T> = Result<T, HouseholdError>;

/// The fixed-point iteration that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationStage {
    /// Endogenous-gridpoint iteration on marginal utility.
    Backward,
    /// Iteration on the asset distribution.
    Forward,
    /// Power iteration for the stationary distribution of the Markov chain.
    Stationary,
}

impl fmt::Display for IterationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backward => write!(f, "backward"),
            Self::Forward => write!(f, "forward"),
            Self::Stationary => write!(f, "stationary distribution"),
        }
    }
}

/// Errors that can occur while solving for the steady state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HouseholdError {
    /// An iteration hit its cap before meeting its tolerance.
    #[error("{stage} iteration did not converge after {iterations} iterations (distance {distance:.3e})")]
    ConvergenceFailed {
        /// Which iteration failed.
        stage: IterationStage,
        /// Number of iterations performed.
        iterations: usize,
        /// Sup-norm change at the last iteration.
        distance: f64,
    },

    /// The calibration is inconsistent or outside the model's domain.
    #[error("Invalid calibration: {reason}")]
    InvalidCalibration {
        /// What is wrong with it.
        reason: String,
    },

    /// A numerical kernel failed.
    #[error(transparent)]
    Math(#[from] MathError),
}

impl HouseholdError {
    /// Creates a convergence failure.
    #[must_use]
    pub fn convergence_failed(stage: IterationStage, iterations: usize, distance: f64) -> Self {
        Self::ConvergenceFailed {
            stage,
            iterations,
            distance,
        }
    }

    /// Creates an invalid calibration error.
    #[must_use]
    pub fn invalid_calibration(reason: impl Into<String>) -> Self {
        Self::InvalidCalibration {
            reason: reason.into(),
        }
    }

    /// Returns true if this is a convergence failure.
    #[must_use]
    pub fn is_convergence_failure(&self) -> bool {
        matches!(self, Self::ConvergenceFailed { .. })
    }
}
