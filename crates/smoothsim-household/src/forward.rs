//! Forward iteration on the conditional asset CDF.
//!
//! `F[s, i]` is the probability that a household in income state `s` holds
//! at most `a_grid[i]`. Under the policy, end-of-period assets are at most
//! `a_grid[i]` exactly when cash-on-hand is at most `coh_endog[s, i]`, so
//! the CDF on assets is the CDF of cash-on-hand read off on the endogenous
//! grid. Cash-on-hand is `certain[s, a] + Y`; since `certain` is an affine
//! function of beginning-of-period assets, last period's CDF becomes a
//! spline in certain cash-on-hand with the same coefficients, and the new
//! CDF is its convolution with the lognormal `Y`.

use ndarray::{Array2, ArrayView1, ArrayView2};
use smoothsim_math::interpolation::{interp, CubicBSpline};
use smoothsim_math::quadrature::{integrate_lognormal_interval, GaussLegendre};
use tracing::{debug, trace, warn};

use crate::calibration::Calibration;
use crate::cash_on_hand::CashOnHand;
use crate::config::{SolverConfig, TailCorrection};
use crate::error::{HouseholdError, HouseholdResult, IterationStage};
use crate::markov::cdf_transition;
use crate::parallel::map_states;
use crate::policy::PolicySplines;
use crate::sup_distance;

const TRACE_EVERY: usize = 100;

/// Converged forward iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSolution {
    /// Conditional CDF on the asset grid, `S x N`.
    pub cdf: Array2<f64>,
    /// Forward steps taken.
    pub iterations: usize,
}

/// Weights rising smoothly from 0 at `M/2` to 1 at `M = grid[last]`.
///
/// Zero below `M/2`; above it `3t^2 - 2t^3` with `t = (x - M/2) / (M/2)`.
#[must_use]
pub fn smooth_weight(grid: &[f64]) -> Vec<f64> {
    let Some(&top) = grid.last() else {
        return Vec::new();
    };
    let half = top / 2.0;
    let mid = grid.partition_point(|&x| x < half);

    let mut weights = vec![0.0; grid.len()];
    for (w, &x) in weights[mid..].iter_mut().zip(&grid[mid..]) {
        let t = (x - half) / half;
        *w = 3.0 * t * t - 2.0 * t * t * t;
    }
    weights
}

impl TailCorrection {
    /// Blending weights on `grid`, or `None` if the correction is off.
    #[must_use]
    pub fn weights(&self, grid: &[f64]) -> Option<Vec<f64>> {
        match self {
            Self::SmoothStep => Some(smooth_weight(grid)),
            Self::Disabled => None,
        }
    }
}

/// New CDF on `coh_endog` for one state.
///
/// `cdf` is last period's CDF as a spline in certain cash-on-hand, whose
/// lowest point is `floor`. For each `coh` the result is
/// `E[F(coh - Y) 1{Y < coh - floor}]` with `log Y ~ N(mu, sigma^2)`; it is
/// zero below `floor`. Above the top of the spline's grid `F` is held at its
/// last value.
#[must_use]
pub fn propagate_cdf(
    rule: &GaussLegendre,
    cdf: &CubicBSpline,
    floor: f64,
    coh_endog: &[f64],
    mu: f64,
    sigma: f64,
) -> Vec<f64> {
    let top = cdf.max_x();
    coh_endog
        .iter()
        .map(|&coh| {
            if coh < floor {
                return 0.0;
            }
            // Points are `floor + y`; `coh - y` runs the other way.
            let nodes = integrate_lognormal_interval(rule, floor, mu, sigma, floor, coh);
            let queries: Vec<f64> = nodes
                .points
                .iter()
                .rev()
                .map(|x| (coh + floor - x).min(top))
                .collect();
            let values = cdf.values_monotonic(&queries);
            nodes
                .weights
                .iter()
                .zip(values.iter().rev())
                .map(|(w, f)| w * f)
                .sum()
        })
        .collect()
}

/// CDF on the asset grid after the policy and the transitory shock, before
/// the income state moves.
///
/// `tail_weights`, if given, blends the result towards one as
/// `(1 - w) F + w`. The result is then clipped to `[0, 1]`, which the
/// spline can leave near the top of a coarse grid.
#[must_use]
pub fn forward_policy(
    calibration: &Calibration,
    cash_on_hand: &CashOnHand,
    rule: &GaussLegendre,
    config: &SolverConfig,
    cdf: ArrayView2<'_, f64>,
    coh_endog: ArrayView2<'_, f64>,
    tail_weights: Option<&[f64]>,
) -> Array2<f64> {
    let n_states = calibration.n_states();
    let n_assets = calibration.n_assets();
    let sigma = calibration.income_log_std;
    let grid = calibration.asset_grid.to_vec();

    let states = map_states(n_states, config, |s| {
        let certain = cash_on_hand.certain.row(s).to_vec();
        let coefficients = interp(&grid, &cdf.row(s).to_vec());
        let spline = CubicBSpline::from_coefficients(&certain, coefficients);

        let mut next = propagate_cdf(
            rule,
            &spline,
            certain[0],
            &coh_endog.row(s).to_vec(),
            cash_on_hand.log_mean[s],
            sigma,
        );
        if let Some(weights) = tail_weights {
            for (f, w) in next.iter_mut().zip(weights) {
                *f = (1.0 - w) * *f + w;
            }
        }
        for f in &mut next {
            *f = f.clamp(0.0, 1.0);
        }
        next
    });

    Array2::from_shape_fn((n_states, n_assets), |(s, i)| states[s][i])
}

/// One forward step: [`forward_policy`], then the income transition
/// `pi_f` for conditional CDFs.
#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn forward_step(
    calibration: &Calibration,
    cash_on_hand: &CashOnHand,
    rule: &GaussLegendre,
    config: &SolverConfig,
    cdf: ArrayView2<'_, f64>,
    coh_endog: ArrayView2<'_, f64>,
    pi_f: ArrayView2<'_, f64>,
    tail_weights: Option<&[f64]>,
) -> Array2<f64> {
    let moved = forward_policy(
        calibration,
        cash_on_hand,
        rule,
        config,
        cdf,
        coh_endog,
        tail_weights,
    );
    pi_f.dot(&moved)
}

/// Iterates [`forward_step`] from everyone at the borrowing limit
/// (`F = 1`) until the CDF moves less than `config.forward_tolerance`.
///
/// `stationary` is the stationary distribution of the income chain. The
/// newest iterate is returned.
///
/// # Errors
///
/// Returns [`HouseholdError::ConvergenceFailed`] if the tolerance is not met
/// within `config.forward_max_iterations` steps.
pub fn solve_distribution(
    calibration: &Calibration,
    config: &SolverConfig,
    rule: &GaussLegendre,
    policy: &PolicySplines,
    stationary: ArrayView1<'_, f64>,
) -> HouseholdResult<DistributionSolution> {
    let cash_on_hand = CashOnHand::new(calibration);
    let pi_f = cdf_transition(calibration.transition.view(), stationary);
    let tail_weights = config
        .tail_correction
        .weights(&calibration.asset_grid.to_vec());

    let mut cdf = Array2::<f64>::ones((calibration.n_states(), calibration.n_assets()));
    let mut distance = f64::INFINITY;

    for iteration in 0..config.forward_max_iterations {
        let next = forward_step(
            calibration,
            &cash_on_hand,
            rule,
            config,
            cdf.view(),
            policy.coh_endog.view(),
            pi_f.view(),
            tail_weights.as_deref(),
        );

        if iteration > 0 {
            distance = sup_distance(next.view(), cdf.view());
            if !distance.is_finite() {
                warn!(iterations = iteration + 1, distance, "distribution diverged");
                return Err(HouseholdError::convergence_failed(
                    IterationStage::Forward,
                    iteration + 1,
                    distance,
                ));
            }
            if distance < config.forward_tolerance {
                debug!(iterations = iteration + 1, distance, "distribution converged");
                return Ok(DistributionSolution {
                    cdf: next,
                    iterations: iteration + 1,
                });
            }
        }
        if iteration % TRACE_EVERY == 0 {
            trace!(iteration, distance, "forward iteration");
        }
        cdf = next;
    }

    warn!(
        max_iterations = config.forward_max_iterations,
        distance, "distribution did not converge"
    );
    Err(HouseholdError::convergence_failed(
        IterationStage::Forward,
        config.forward_max_iterations,
        distance,
    ))
}
