//! Backward iteration on marginal utility by endogenous gridpoints.
//!
//! One step takes next period's marginal utility of assets `Va'` on the
//! `(state, asset)` grid and returns this period's:
//!
//! 1. `W = beta[s] * (Pi @ Va')`, expected discounted marginal utility of
//!    end-of-period assets.
//! 2. Consumption from the Euler equation, `c = W^(-eis)`, and the
//!    cash-on-hand that makes it optimal, `coh = c + a`. A spline through
//!    `(coh, c)` is the unconstrained policy; below `coh[0]` the household
//!    consumes everything.
//! 3. `Va = (1 + r) E[c(coh)^(-1/eis)]` over the lognormal part of
//!    cash-on-hand, split at the constraint threshold.

use ndarray::{Array2, ArrayView2, Axis};
use smoothsim_math::interpolation::CubicBSpline;
use smoothsim_math::quadrature::{integrate_lognormal_interval, GaussLegendre};
use tracing::{debug, trace, warn};

use crate::calibration::Calibration;
use crate::cash_on_hand::CashOnHand;
use crate::config::SolverConfig;
use crate::error::{HouseholdError, HouseholdResult, IterationStage};
use crate::parallel::map_states;
use crate::policy::PolicySplines;
use crate::sup_distance;

/// Iterations between trace events.
const TRACE_EVERY: usize = 100;

/// Result of one backward step.
#[derive(Debug, Clone, PartialEq)]
pub struct BackwardStep {
    /// Marginal utility of assets this period, `S x N`.
    pub marginal_utility: Array2<f64>,
    /// Consumption policy implied by next period's marginal utility.
    pub policy: PolicySplines,
}

/// Converged backward iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySolution {
    /// Steady-state marginal utility of assets, `S x N`.
    pub marginal_utility: Array2<f64>,
    /// Steady-state consumption policy.
    pub policy: PolicySplines,
    /// Backward steps taken.
    pub iterations: usize,
}

struct StateStep {
    coefficients: Vec<f64>,
    coh_endog: Vec<f64>,
    marginal_utility: Vec<f64>,
}

/// One backward step from next period's marginal utility `va_next`.
#[must_use]
pub fn backward_step(
    calibration: &Calibration,
    cash_on_hand: &CashOnHand,
    rule: &GaussLegendre,
    config: &SolverConfig,
    va_next: ArrayView2<'_, f64>,
) -> BackwardStep {
    let n_states = calibration.n_states();
    let n_assets = calibration.n_assets();
    let eis = calibration.eis;
    let sigma = calibration.income_log_std;
    let gross_return = 1.0 + calibration.interest_rate;
    let grid = calibration.asset_grid.to_vec();

    let mut wa = calibration.transition.dot(&va_next);
    for (s, mut row) in wa.axis_iter_mut(Axis(0)).enumerate() {
        row *= calibration.discount_factor.for_state(s);
    }

    let states = map_states(n_states, config, |s| {
        let c_endog: Vec<f64> = wa.row(s).iter().map(|w| w.powf(-eis)).collect();
        let coh_endog: Vec<f64> = c_endog.iter().zip(&grid).map(|(c, a)| c + a).collect();
        let spline = CubicBSpline::fit(&coh_endog, &c_endog);

        let mu = cash_on_hand.log_mean[s];
        let marginal_utility = cash_on_hand
            .certain
            .row(s)
            .iter()
            .map(|&certain| {
                gross_return * expected_marginal_utility(rule, &spline, certain, mu, sigma, eis)
            })
            .collect();

        StateStep {
            coefficients: spline.into_coefficients(),
            coh_endog,
            marginal_utility,
        }
    });

    let shape = (n_states, n_assets);
    BackwardStep {
        marginal_utility: Array2::from_shape_fn(shape, |(s, i)| states[s].marginal_utility[i]),
        policy: PolicySplines {
            coefficients: Array2::from_shape_fn(shape, |(s, i)| states[s].coefficients[i]),
            coh_endog: Array2::from_shape_fn(shape, |(s, i)| states[s].coh_endog[i]),
        },
    }
}

/// `E[c(coh)^(-1/eis)]` for `coh = certain + Y`, `log Y ~ N(mu, sigma^2)`.
///
/// Below the first knot of `consumption` the household is constrained and
/// `c = coh`; above it `c` is the spline.
#[must_use]
pub fn expected_marginal_utility(
    rule: &GaussLegendre,
    consumption: &CubicBSpline,
    certain: f64,
    mu: f64,
    sigma: f64,
    eis: f64,
) -> f64 {
    let exponent = -1.0 / eis;
    let threshold = consumption.min_x();

    let constrained = integrate_lognormal_interval(rule, certain, mu, sigma, 0.0, threshold)
        .integrate(|coh| coh.powf(exponent));

    let nodes = integrate_lognormal_interval(rule, certain, mu, sigma, threshold, f64::INFINITY);
    let c = consumption.values_monotonic(&nodes.points);
    let unconstrained: f64 = nodes
        .weights
        .iter()
        .zip(&c)
        .map(|(w, c)| w * c.powf(exponent))
        .sum();

    constrained + unconstrained
}

/// Initial guess: consume 5% of income plus assets.
#[must_use]
pub fn initial_marginal_utility(calibration: &Calibration) -> Array2<f64> {
    let exponent = -1.0 / calibration.eis;
    Array2::from_shape_fn(
        (calibration.n_states(), calibration.n_assets()),
        |(s, a)| (0.05 * (calibration.income[s] + calibration.asset_grid[a])).powf(exponent),
    )
}

/// Iterates [`backward_step`] to its fixed point.
///
/// The constant `config.marginal_utility_shock` is added to marginal utility
/// before every step. Convergence is declared once the endogenous
/// cash-on-hand grid moves less than `config.backward_tolerance` between two
/// steps, and the newest step is returned.
///
/// # Errors
///
/// Returns [`HouseholdError::ConvergenceFailed`] if that does not happen
/// within `config.backward_max_iterations` steps.
pub fn solve_policy(
    calibration: &Calibration,
    config: &SolverConfig,
    rule: &GaussLegendre,
) -> HouseholdResult<PolicySolution> {
    let cash_on_hand = CashOnHand::new(calibration);
    let mut va = initial_marginal_utility(calibration);
    let mut previous: Option<Array2<f64>> = None;
    let mut distance = f64::INFINITY;

    for iteration in 0..config.backward_max_iterations {
        let shocked = &va + config.marginal_utility_shock;
        let step = backward_step(calibration, &cash_on_hand, rule, config, shocked.view());

        if let Some(previous) = &previous {
            distance = sup_distance(step.policy.coh_endog.view(), previous.view());
            if !distance.is_finite() {
                warn!(iterations = iteration + 1, distance, "policy diverged");
                return Err(HouseholdError::convergence_failed(
                    IterationStage::Backward,
                    iteration + 1,
                    distance,
                ));
            }
            if distance < config.backward_tolerance {
                debug!(iterations = iteration + 1, distance, "policy converged");
                return Ok(PolicySolution {
                    marginal_utility: step.marginal_utility,
                    policy: step.policy,
                    iterations: iteration + 1,
                });
            }
        }
        if iteration % TRACE_EVERY == 0 {
            trace!(iteration, distance, "backward iteration");
        }

        va = step.marginal_utility;
        previous = Some(step.policy.coh_endog);
    }

    warn!(
        max_iterations = config.backward_max_iterations,
        distance, "policy did not converge"
    );
    Err(HouseholdError::convergence_failed(
        IterationStage::Backward,
        config.backward_max_iterations,
        distance,
    ))
}
