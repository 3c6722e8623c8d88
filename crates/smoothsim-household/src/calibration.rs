//! Model inputs and the builders that discretize them.
//!
//! A [`Calibration`] bundles everything the solver needs: the income chain,
//! the asset grid, prices and preferences. The free functions build the
//! standard pieces:
//!
//! - [`discretize_assets`]: double-exponential asset grid
//! - [`discretize_income`]: Rouwenhorst income process normalized to mean one
//! - [`discount_factor_types`]: per-state discount factors for persistent
//!   patience types

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use smoothsim_math::interpolation::MIN_POINTS;

use crate::config::{DEFAULT_MAX_ITERATIONS, DEFAULT_STATIONARY_TOLERANCE};
use crate::error::{HouseholdError, HouseholdResult};
use crate::markov::{rouwenhorst, row_sum_error, stationary_distribution};

/// Row sums of the transition matrix may differ from one by at most this.
const ROW_SUM_TOLERANCE: f64 = 1e-10;

/// Discount factor, shared by all states or given per state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiscountFactor {
    /// One `beta` for every state.
    Uniform(f64),
    /// `beta[s]` for each income state.
    PerState(Vec<f64>),
}

impl DiscountFactor {
    /// Discount factor in state `s`.
    #[must_use]
    pub fn for_state(&self, s: usize) -> f64 {
        match self {
            Self::Uniform(beta) => *beta,
            Self::PerState(betas) => betas[s],
        }
    }

    /// Every configured value.
    fn values(&self) -> Vec<f64> {
        match self {
            Self::Uniform(beta) => vec![*beta],
            Self::PerState(betas) => betas.clone(),
        }
    }
}

impl From<f64> for DiscountFactor {
    fn from(beta: f64) -> Self {
        Self::Uniform(beta)
    }
}

impl From<Vec<f64>> for DiscountFactor {
    fn from(betas: Vec<f64>) -> Self {
        Self::PerState(betas)
    }
}

/// Inputs of the household problem.
///
/// Cash-on-hand in state `s` with assets `a` is
/// `(1 + r) a + (1 - share) y[s] + Y`, where `log Y ~ N(log(share y[s]) - sigma^2/2, sigma^2)`,
/// so the transitory component has mean `share * y[s]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Row-stochastic income transition matrix, `S x S`.
    pub transition: Array2<f64>,
    /// Strictly increasing asset grid starting at the borrowing limit, zero.
    pub asset_grid: Array1<f64>,
    /// Mean income in each state.
    pub income: Array1<f64>,
    /// Interest rate `r`.
    pub interest_rate: f64,
    /// Discount factor `beta`.
    pub discount_factor: DiscountFactor,
    /// Elasticity of intertemporal substitution.
    pub eis: f64,
    /// Standard deviation of log transitory income.
    pub income_log_std: f64,
    /// Share of income that is transitory.
    pub income_share: f64,
}

impl Calibration {
    /// Creates a validated calibration.
    ///
    /// # Errors
    ///
    /// Returns [`HouseholdError::InvalidCalibration`] if the inputs are
    /// inconsistent; see [`validate`](Self::validate).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transition: Array2<f64>,
        asset_grid: Array1<f64>,
        income: Array1<f64>,
        interest_rate: f64,
        discount_factor: impl Into<DiscountFactor>,
        eis: f64,
        income_log_std: f64,
        income_share: f64,
    ) -> HouseholdResult<Self> {
        let calibration = Self {
            transition,
            asset_grid,
            income,
            interest_rate,
            discount_factor: discount_factor.into(),
            eis,
            income_log_std,
            income_share,
        };
        calibration.validate()?;
        Ok(calibration)
    }

    /// The benchmark calibration: 11-state Rouwenhorst income (persistence
    /// 0.92, standard deviation 0.8), `beta = 0.95`, `r = 0.02`, unit EIS,
    /// `sigma = 0.3`, transitory share 0.8 and 200 asset points on `[0, 10000]`.
    ///
    /// # Errors
    ///
    /// Fails only if the income chain's stationary distribution does.
    pub fn benchmark() -> HouseholdResult<Self> {
        let income = discretize_income(0.92, 0.8, 11)?;
        Self::new(
            income.transition,
            discretize_assets(0.0, 10_000.0, 200),
            income.levels,
            0.02,
            0.95,
            1.0,
            0.3,
            0.8,
        )
    }

    /// Number of income states.
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.income.len()
    }

    /// Number of asset grid points.
    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.asset_grid.len()
    }

    /// Discount factor in each state.
    #[must_use]
    pub fn discount_factors(&self) -> Array1<f64> {
        (0..self.n_states())
            .map(|s| self.discount_factor.for_state(s))
            .collect()
    }

    /// Checks shapes and parameter domains.
    ///
    /// # Errors
    ///
    /// Returns [`HouseholdError::InvalidCalibration`] describing the first
    /// problem found.
    pub fn validate(&self) -> HouseholdResult<()> {
        let n = self.n_states();
        if n == 0 {
            return Err(HouseholdError::invalid_calibration("no income states"));
        }
        check_transition(self.transition.view())?;
        if self.transition.nrows() != n {
            return Err(HouseholdError::invalid_calibration(format!(
                "transition matrix has {} states, income has {n}",
                self.transition.nrows()
            )));
        }

        if self.n_assets() < MIN_POINTS {
            return Err(HouseholdError::invalid_calibration(format!(
                "asset grid needs at least {MIN_POINTS} points, got {}",
                self.n_assets()
            )));
        }
        if self
            .asset_grid
            .windows(2)
            .into_iter()
            .any(|w| w[1].is_nan() || w[1] <= w[0])
        {
            return Err(HouseholdError::invalid_calibration(
                "asset grid must be strictly increasing",
            ));
        }
        if self.asset_grid[0] != 0.0 {
            return Err(HouseholdError::invalid_calibration(format!(
                "asset grid must start at the zero borrowing limit, got {}",
                self.asset_grid[0]
            )));
        }

        if !self.income.iter().all(|&y| y > 0.0) {
            return Err(HouseholdError::invalid_calibration(
                "income must be positive in every state",
            ));
        }

        if let DiscountFactor::PerState(betas) = &self.discount_factor {
            if betas.len() != n {
                return Err(HouseholdError::invalid_calibration(format!(
                    "{} discount factors for {n} states",
                    betas.len()
                )));
            }
        }
        if !self.discount_factor.values().iter().all(|&b| b > 0.0) {
            return Err(HouseholdError::invalid_calibration(
                "discount factors must be positive",
            ));
        }

        if self.interest_rate.is_nan() || self.interest_rate <= -1.0 {
            return Err(HouseholdError::invalid_calibration(
                "interest rate must exceed -1",
            ));
        }
        if self.eis.is_nan() || self.eis <= 0.0 {
            return Err(HouseholdError::invalid_calibration("eis must be positive"));
        }
        if self.income_log_std.is_nan() || self.income_log_std <= 0.0 {
            return Err(HouseholdError::invalid_calibration(
                "income_log_std must be positive",
            ));
        }
        if self.income_share.is_nan() || self.income_share <= 0.0 || self.income_share > 1.0 {
            return Err(HouseholdError::invalid_calibration(
                "income_share must lie in (0, 1]",
            ));
        }
        Ok(())
    }
}

/// Double-exponential grid of `n` points on `[amin, amax]`.
///
/// Points are `amin + exp(exp(u) - 1) - 1` for `u` uniform on
/// `[0, log(1 + log(1 + amax - amin))]`, which packs points near the
/// borrowing limit.
#[must_use]
pub fn discretize_assets(amin: f64, amax: f64, n: usize) -> Array1<f64> {
    let ubar = (1.0 + (1.0 + amax - amin).ln()).ln();
    Array1::linspace(0.0, ubar, n).mapv(|u| amin + (u.exp() - 1.0).exp() - 1.0)
}

/// Discretized income process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeProcess {
    /// Income level in each state, mean one under [`stationary`](Self::stationary).
    pub levels: Array1<f64>,
    /// Stationary distribution of the chain.
    pub stationary: Array1<f64>,
    /// Transition matrix.
    pub transition: Array2<f64>,
}

impl IncomeProcess {
    /// Mean income under the stationary distribution.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.stationary.dot(&self.levels)
    }
}

/// Rouwenhorst discretization of an AR(1) in log income with persistence
/// `rho` and cross-sectional standard deviation `sd`, on `n` states.
///
/// # Errors
///
/// Returns an error if the stationary distribution does not converge.
pub fn discretize_income(rho: f64, sd: f64, n: usize) -> HouseholdResult<IncomeProcess> {
    let p = (1.0 + rho) / 2.0;
    let alpha = if n > 1 {
        2.0 * sd / ((n - 1) as f64).sqrt()
    } else {
        0.0
    };

    let transition = rouwenhorst(n, p);
    let stationary = stationary_distribution(
        transition.view(),
        DEFAULT_STATIONARY_TOLERANCE,
        DEFAULT_MAX_ITERATIONS,
    )?;

    let mut levels: Array1<f64> = (0..n).map(|k| (alpha * k as f64).exp()).collect();
    let mean = stationary.dot(&levels);
    levels /= mean;

    Ok(IncomeProcess {
        levels,
        stationary,
        transition,
    })
}

/// Per-state discount factors for `n_types` patience types.
///
/// Type `k` has `beta_hi - (n_types - 1 - k) * dbeta`; each value is repeated
/// over the `inner_len` states of the chain it is combined with, matching the
/// state order of [`kron`](crate::markov::kron) with the type chain outermost.
#[must_use]
pub fn discount_factor_types(
    beta_hi: f64,
    dbeta: f64,
    n_types: usize,
    inner_len: usize,
) -> Vec<f64> {
    (0..n_types)
        .flat_map(|k| {
            let beta = beta_hi - (n_types - 1 - k) as f64 * dbeta;
            std::iter::repeat(beta).take(inner_len)
        })
        .collect()
}

/// Stacks `inner` levels once per outer type, matching `kron(outer, inner)`.
#[must_use]
pub fn tile(inner: ArrayView1<'_, f64>, n_outer: usize) -> Array1<f64> {
    (0..n_outer).flat_map(|_| inner.iter().copied()).collect()
}

/// Checks that `transition` is square, non-negative, with rows summing to one.
///
/// # Errors
///
/// Returns [`HouseholdError::InvalidCalibration`] otherwise.
pub fn check_transition(transition: ArrayView2<'_, f64>) -> HouseholdResult<()> {
    let (rows, cols) = transition.dim();
    if rows != cols {
        return Err(HouseholdError::invalid_calibration(format!(
            "transition matrix is {rows}x{cols}"
        )));
    }
    if !transition.iter().all(|&p| p >= 0.0) {
        return Err(HouseholdError::invalid_calibration(
            "transition probabilities must be non-negative",
        ));
    }
    let row_error = row_sum_error(transition);
    if row_error.is_nan() || row_error > ROW_SUM_TOLERANCE {
        return Err(HouseholdError::invalid_calibration(format!(
            "transition rows must sum to one (off by {row_error:.3e})"
        )));
    }
    Ok(())
}
