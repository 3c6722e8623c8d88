//! Calibration recipes.
//!
//! A recipe lists generator parameters rather than matrices: the asset grid
//! bounds, the Rouwenhorst income chain, preferences, optional patience
//! types and the solver settings. Every field defaults to the benchmark
//! calibration, so an empty file solves the benchmark.
//!
//! ```toml
//! interest_rate = 0.01
//!
//! [assets]
//! max = 200.0
//! points = 40
//!
//! [income]
//! states = 3
//!
//! [discount_types]
//! types = 2
//! spread = 0.02
//!
//! [solver]
//! tail_correction = "disabled"
//! ```

use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use smoothsim_household::calibration::tile;
use smoothsim_household::prelude::*;

use crate::error::{CliError, CliResult};

/// Double-exponential asset grid from the zero borrowing limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetGrid {
    /// Top of the grid.
    pub max: f64,
    /// Number of gridpoints.
    pub points: usize,
}

impl Default for AssetGrid {
    fn default() -> Self {
        Self {
            max: 10_000.0,
            points: 200,
        }
    }
}

/// Rouwenhorst chain for persistent log income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IncomeChain {
    /// AR(1) persistence.
    pub persistence: f64,
    /// Cross-sectional standard deviation of log income.
    pub std: f64,
    /// Number of states.
    pub states: usize,
}

impl Default for IncomeChain {
    fn default() -> Self {
        Self {
            persistence: 0.92,
            std: 0.8,
            states: 11,
        }
    }
}

/// Persistent patience types layered over the income chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscountTypes {
    /// Number of types, equally likely.
    pub types: usize,
    /// Gap between adjacent types' discount factors.
    pub spread: f64,
    /// Per-period probability of redrawing the type.
    pub switch_probability: f64,
}

impl Default for DiscountTypes {
    fn default() -> Self {
        Self {
            types: 2,
            spread: 0.01,
            switch_probability: 0.01,
        }
    }
}

/// Everything needed to build a [`Calibration`] and solve it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalibrationRecipe {
    /// Asset grid.
    pub assets: AssetGrid,
    /// Persistent income chain.
    pub income: IncomeChain,
    /// Interest rate.
    pub interest_rate: f64,
    /// Discount factor; with patience types, that of the most patient type.
    pub discount_factor: f64,
    /// Elasticity of intertemporal substitution.
    pub eis: f64,
    /// Standard deviation of log transitory income.
    pub income_log_std: f64,
    /// Transitory share of income.
    pub income_share: f64,
    /// Optional patience types.
    pub discount_types: Option<DiscountTypes>,
    /// Solver settings.
    pub solver: SolverConfig,
}

impl Default for CalibrationRecipe {
    fn default() -> Self {
        Self {
            assets: AssetGrid::default(),
            income: IncomeChain::default(),
            interest_rate: 0.02,
            discount_factor: 0.95,
            eis: 1.0,
            income_log_std: 0.3,
            income_share: 0.8,
            discount_types: None,
            solver: SolverConfig::default(),
        }
    }
}

impl CalibrationRecipe {
    /// Reads a recipe; `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::RecipeRead {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|reason| CliError::RecipeParse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Discretizes the grid and income chain and validates the result.
    ///
    /// With patience types the state index is `type * income.states + income_state`.
    pub fn build(&self) -> CliResult<Calibration> {
        if self.income.states == 0 {
            return Err(CliError::InvalidArgument(
                "income chain needs at least one state".into(),
            ));
        }

        let income = discretize_income(
            self.income.persistence,
            self.income.std,
            self.income.states,
        )?;
        let grid = discretize_assets(0.0, self.assets.max, self.assets.points);

        let calibration = match &self.discount_types {
            None => Calibration::new(
                income.transition,
                grid,
                income.levels,
                self.interest_rate,
                self.discount_factor,
                self.eis,
                self.income_log_std,
                self.income_share,
            )?,
            Some(types) => {
                if types.types == 0 {
                    return Err(CliError::InvalidArgument(
                        "discount_types.types must be at least one".into(),
                    ));
                }
                if !(0.0..=1.0).contains(&types.switch_probability) {
                    return Err(CliError::InvalidArgument(format!(
                        "discount_types.switch_probability must lie in [0, 1], got {}",
                        types.switch_probability
                    )));
                }

                let weights = Array1::from_elem(types.types, 1.0 / types.types as f64);
                let switching = persistent_types(types.switch_probability, weights.view());
                Calibration::new(
                    kron(switching.view(), income.transition.view()),
                    grid,
                    tile(income.levels.view(), types.types),
                    self.interest_rate,
                    discount_factor_types(
                        self.discount_factor,
                        types.spread,
                        types.types,
                        self.income.states,
                    ),
                    self.eis,
                    self.income_log_std,
                    self.income_share,
                )?
            }
        };

        Ok(calibration)
    }
}
