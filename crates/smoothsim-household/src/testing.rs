//! Shared fixtures for unit tests.

use crate::calibration::{discretize_assets, discretize_income, Calibration};

/// Three income states and a 40-point grid: solves in well under a second.
pub(crate) fn small_calibration() -> Calibration {
    let income = discretize_income(0.9, 0.5, 3).unwrap();
    Calibration::new(
        income.transition,
        discretize_assets(0.0, 200.0, 40),
        income.levels,
        0.01,
        0.95,
        0.5,
        0.2,
        0.5,
    )
    .unwrap()
}
