//! Steady-state driver: policy, distribution and aggregates.

use ndarray::{Array1, Array2, ArrayView2};
use serde::Serialize;
use smoothsim_math::interpolation::CubicBSpline;
use smoothsim_math::quadrature::GaussLegendre;
use tracing::info;

use crate::backward::solve_policy;
use crate::calibration::Calibration;
use crate::config::SolverConfig;
use crate::error::HouseholdResult;
use crate::forward::solve_distribution;
use crate::markov::stationary_distribution;
use crate::policy::PolicySplines;

/// Steady state of the household problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SteadyState {
    /// Marginal utility of assets, `S x N`.
    pub marginal_utility: Array2<f64>,
    /// Consumption policy.
    pub policy: PolicySplines,
    /// Conditional asset CDF on the grid, `S x N`.
    pub cdf: Array2<f64>,
    /// Stationary distribution of the income chain.
    pub stationary: Array1<f64>,
    /// Mean assets conditional on each income state.
    pub assets_by_state: Array1<f64>,
    /// Mean consumption conditional on each income state, `r A[s] + y[s]`.
    pub consumption_by_state: Array1<f64>,
    /// Aggregate assets.
    pub aggregate_assets: f64,
    /// Aggregate consumption.
    pub aggregate_consumption: f64,
    /// Backward steps taken.
    pub backward_iterations: usize,
    /// Forward steps taken.
    pub forward_iterations: usize,
}

impl SteadyState {
    /// Number of income states.
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.stationary.len()
    }

    /// Share of households at the borrowing limit in each state, `F[s, 0]`.
    #[must_use]
    pub fn constrained_share_by_state(&self) -> Array1<f64> {
        self.cdf.column(0).to_owned()
    }

    /// Share of all households at the borrowing limit.
    #[must_use]
    pub fn constrained_share(&self) -> f64 {
        self.stationary.dot(&self.cdf.column(0))
    }
}

/// Mean assets in each state from the conditional CDF on `grid`.
///
/// `E[a] = a_0 + int_{a_0}^{a_N} (1 - F(a)) da`, with `1 - F` taken as a
/// not-a-knot cubic spline on the grid.
///
/// # Errors
///
/// Returns [`HouseholdError::Math`](crate::error::HouseholdError::Math) if
/// the grid cannot carry a spline or a row's length differs from the grid's.
pub fn aggregate_assets_by_state(
    cdf: ArrayView2<'_, f64>,
    grid: &[f64],
) -> HouseholdResult<Array1<f64>> {
    let floor = grid.first().copied().unwrap_or(0.0);
    cdf.rows()
        .into_iter()
        .map(|row| {
            let survival: Vec<f64> = row.iter().map(|f| 1.0 - f).collect();
            Ok(floor + CubicBSpline::new(grid, &survival)?.integral())
        })
        .collect()
}

/// Solves for the steady state.
///
/// Runs the backward iteration to a policy, the forward iteration to a
/// distribution under that policy, and aggregates. Both iterations share one
/// Gauss-Legendre rule.
///
/// # Errors
///
/// Returns an error if the calibration is invalid or any of the three
/// iterations fails to converge.
pub fn steady_state(calibration: &Calibration, config: &SolverConfig) -> HouseholdResult<SteadyState> {
    calibration.validate()?;
    let rule = GaussLegendre::standard();

    let policy = solve_policy(calibration, config, rule)?;
    let stationary = stationary_distribution(
        calibration.transition.view(),
        config.stationary_tolerance,
        config.stationary_max_iterations,
    )?;
    let distribution =
        solve_distribution(calibration, config, rule, &policy.policy, stationary.view())?;

    let grid = calibration.asset_grid.to_vec();
    let assets_by_state = aggregate_assets_by_state(distribution.cdf.view(), &grid)?;
    let consumption_by_state =
        &assets_by_state * calibration.interest_rate + &calibration.income;
    let aggregate_assets = stationary.dot(&assets_by_state);
    let aggregate_consumption = stationary.dot(&consumption_by_state);

    info!(
        aggregate_assets,
        aggregate_consumption,
        backward_iterations = policy.iterations,
        forward_iterations = distribution.iterations,
        "steady state solved"
    );

    Ok(SteadyState {
        marginal_utility: policy.marginal_utility,
        policy: policy.policy,
        cdf: distribution.cdf,
        stationary,
        assets_by_state,
        consumption_by_state,
        aggregate_assets,
        aggregate_consumption,
        backward_iterations: policy.iterations,
        forward_iterations: distribution.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HouseholdError;
    use crate::testing::small_calibration;
    use approx::assert_relative_eq;
    use ndarray::arr2;
    use smoothsim_math::MathError;

    #[test]
    fn test_aggregate_assets_of_point_masses() {
        let grid: Vec<f64> = (0..11).map(|i| i as f64).collect();

        // Everyone at the borrowing limit.
        let at_floor = Array2::<f64>::ones((1, 11));
        assert_relative_eq!(
            aggregate_assets_by_state(at_floor.view(), &grid).unwrap()[0],
            0.0,
            epsilon = 1e-14
        );

        // Uniform on [0, 10]: F(a) = a / 10, mean 5.
        let uniform = Array2::from_shape_fn((1, 11), |(_, i)| i as f64 / 10.0);
        assert_relative_eq!(
            aggregate_assets_by_state(uniform.view(), &grid).unwrap()[0],
            5.0,
            epsilon = 1e-12
        );

        // A shifted grid adds its first point.
        let shifted: Vec<f64> = grid.iter().map(|a| a - 2.0).collect();
        assert_relative_eq!(
            aggregate_assets_by_state(uniform.view(), &shifted).unwrap()[0],
            3.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_aggregate_assets_by_row() {
        let grid = [0.0, 1.0, 2.0, 3.0, 4.0];
        let cdf = arr2(&[[1.0; 5], [0.0, 0.25, 0.5, 0.75, 1.0]]);
        let by_state = aggregate_assets_by_state(cdf.view(), &grid).unwrap();
        assert_relative_eq!(by_state[0], 0.0, epsilon = 1e-14);
        assert_relative_eq!(by_state[1], 2.0, epsilon = 1e-13);
    }

    #[test]
    fn test_aggregate_assets_reports_bad_grids() {
        let cdf = Array2::<f64>::ones((2, 4));
        let err = aggregate_assets_by_state(cdf.view(), &[0.0, 1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            HouseholdError::Math(MathError::InsufficientData {
                required: 5,
                actual: 4
            })
        ));

        let cdf = Array2::<f64>::ones((2, 6));
        let err = aggregate_assets_by_state(cdf.view(), &[0.0, 1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(
            err,
            HouseholdError::Math(MathError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_steady_state_accounting() {
        let calibration = small_calibration();
        let ss = steady_state(&calibration, &SolverConfig::default()).unwrap();

        assert_eq!(ss.n_states(), calibration.n_states());
        assert!(ss.aggregate_assets > 0.0);
        assert_relative_eq!(
            ss.aggregate_consumption,
            calibration.interest_rate * ss.aggregate_assets
                + ss.stationary.dot(&calibration.income),
            max_relative = 1e-12
        );
        for s in 0..ss.n_states() {
            assert_relative_eq!(
                ss.consumption_by_state[s],
                calibration.interest_rate * ss.assets_by_state[s] + calibration.income[s],
                max_relative = 1e-14
            );
        }

        let share = ss.constrained_share();
        assert!((0.0..1.0).contains(&share));
        assert_relative_eq!(
            share,
            ss.stationary.dot(&ss.constrained_share_by_state()),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_invalid_calibration_is_rejected_before_solving() {
        let mut calibration = small_calibration();
        calibration.eis = 0.0;
        let err = steady_state(&calibration, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, HouseholdError::InvalidCalibration { .. }));
    }

    #[test]
    fn test_negative_borrowing_limit_is_rejected() {
        let mut calibration = small_calibration();
        calibration.asset_grid = crate::calibration::discretize_assets(-0.3, 200.0, 40);
        let err = steady_state(&calibration, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, HouseholdError::InvalidCalibration { .. }));
    }
}
