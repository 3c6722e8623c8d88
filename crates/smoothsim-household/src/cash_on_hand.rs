//! Decomposition of cash-on-hand into a certain and a lognormal part.

use ndarray::{Array1, Array2};

use crate::calibration::Calibration;

/// Cash-on-hand on the `(state, asset)` grid, split as
/// `coh = certain[s, a] + Y` with `log Y ~ N(log_mean[s], sigma^2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CashOnHand {
    /// `(1 + r) a + (1 - share) y[s]`.
    pub certain: Array2<f64>,
    /// `log(share y[s]) - sigma^2 / 2`, so that `E[Y] = share y[s]`.
    pub log_mean: Array1<f64>,
}

impl CashOnHand {
    /// Builds both components for `calibration`.
    #[must_use]
    pub fn new(calibration: &Calibration) -> Self {
        let r = calibration.interest_rate;
        let share = calibration.income_share;
        let sigma = calibration.income_log_std;

        let certain = Array2::from_shape_fn(
            (calibration.n_states(), calibration.n_assets()),
            |(s, a)| (1.0 + r) * calibration.asset_grid[a] + (1.0 - share) * calibration.income[s],
        );
        let log_mean = calibration
            .income
            .mapv(|y| -sigma * sigma / 2.0 + (share * y).ln());

        Self { certain, log_mean }
    }
}
