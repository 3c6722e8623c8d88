//! CLI error types.

use std::path::PathBuf;

use smoothsim_household::HouseholdError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// The recipe file could not be read.
    #[error("Cannot read calibration recipe {path}: {source}")]
    RecipeRead {
        /// Path given on the command line.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The recipe file is not valid TOML or JSON for a recipe.
    #[error("Invalid calibration recipe {path}: {reason}")]
    RecipeParse {
        /// Path given on the command line.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// Invalid argument value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Income state index past the end of the chain.
    #[error("State {state} is out of range; the calibration has {n_states} income states")]
    StateOutOfRange {
        /// Requested state.
        state: usize,
        /// Number of states.
        n_states: usize,
    },

    /// Solver or calibration error.
    #[error(transparent)]
    Household(#[from] HouseholdError),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
