//! CLI command implementations.

pub mod income;
pub mod policy;
pub mod solve;

pub use income::IncomeArgs;
pub use policy::PolicyArgs;
pub use solve::SolveArgs;

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use smoothsim_household::TailCorrection;

use crate::error::{CliError, CliResult};
use crate::recipe::CalibrationRecipe;

/// Calibration source shared by every command: a recipe file plus overrides.
#[derive(Args, Debug, Default)]
pub struct RecipeArgs {
    /// Calibration recipe (TOML, or JSON with a .json extension). Defaults to the benchmark.
    #[arg(short, long, env = "SMOOTHSIM_CALIBRATION")]
    pub calibration: Option<PathBuf>,

    /// Interest rate r
    #[arg(long)]
    pub interest_rate: Option<f64>,

    /// Discount factor (of the most patient type when types are configured)
    #[arg(long)]
    pub beta: Option<f64>,

    /// Elasticity of intertemporal substitution
    #[arg(long)]
    pub eis: Option<f64>,

    /// Number of asset gridpoints
    #[arg(long)]
    pub asset_points: Option<usize>,

    /// Top of the asset grid
    #[arg(long)]
    pub asset_max: Option<f64>,

    /// Number of Rouwenhorst income states
    #[arg(long)]
    pub income_states: Option<usize>,

    /// Finite-grid correction of the upper CDF tail
    #[arg(long, value_enum)]
    pub tail_correction: Option<TailChoice>,

    /// Solve every income state on the calling thread
    #[arg(long)]
    pub sequential: bool,
}

impl RecipeArgs {
    /// Loads the recipe, if any, and applies the command-line overrides.
    pub fn recipe(&self) -> CliResult<CalibrationRecipe> {
        let mut recipe = match &self.calibration {
            Some(path) => CalibrationRecipe::load(path)?,
            None => CalibrationRecipe::default(),
        };

        if let Some(r) = self.interest_rate {
            recipe.interest_rate = r;
        }
        if let Some(beta) = self.beta {
            recipe.discount_factor = beta;
        }
        if let Some(eis) = self.eis {
            recipe.eis = eis;
        }
        if let Some(points) = self.asset_points {
            recipe.assets.points = points;
        }
        if let Some(max) = self.asset_max {
            recipe.assets.max = max;
        }
        if let Some(states) = self.income_states {
            recipe.income.states = states;
        }
        if let Some(choice) = self.tail_correction {
            recipe.solver.tail_correction = choice.into();
        }
        if self.sequential {
            recipe.solver.parallel = false;
        }

        Ok(recipe)
    }
}

/// Tail correction choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TailChoice {
    /// Blend the CDF towards one over the upper half of the grid
    #[value(name = "smooth-step")]
    SmoothStep,
    /// Leave the CDF uncorrected
    #[value(name = "disabled")]
    Disabled,
}

impl From<TailChoice> for TailCorrection {
    fn from(choice: TailChoice) -> Self {
        match choice {
            TailChoice::SmoothStep => TailCorrection::SmoothStep,
            TailChoice::Disabled => TailCorrection::Disabled,
        }
    }
}

/// Checks that `state` indexes one of `n_states` income states.
pub fn validate_state(state: usize, n_states: usize) -> CliResult<usize> {
    if state >= n_states {
        return Err(CliError::StateOutOfRange { state, n_states });
    }
    Ok(state)
}
