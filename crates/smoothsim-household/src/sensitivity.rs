//! Response of the steady state to a marginal-utility shock.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calibration::Calibration;
use crate::config::SolverConfig;
use crate::error::{HouseholdError, HouseholdResult};
use crate::steady_state::steady_state;

/// Central-difference derivatives of the aggregates with respect to a
/// uniform additive shock to marginal utility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShockSensitivity {
    /// Step `h` used for the differences.
    pub step: f64,
    /// `dA / d shock`.
    pub aggregate_assets: f64,
    /// `dC / d shock`.
    pub aggregate_consumption: f64,
}

/// Differentiates aggregate assets and consumption with respect to
/// `config.marginal_utility_shock`, solving the steady state at
/// `shock + step` and `shock - step`.
///
/// # Errors
///
/// Returns an error if `step` is not positive or either steady state fails.
pub fn shock_sensitivity(
    calibration: &Calibration,
    config: &SolverConfig,
    step: f64,
) -> HouseholdResult<ShockSensitivity> {
    if step.is_nan() || step <= 0.0 {
        return Err(HouseholdError::invalid_calibration(format!(
            "shock step must be positive, got {step}"
        )));
    }

    let base = config.marginal_utility_shock;
    let up = steady_state(
        calibration,
        &config.clone().with_marginal_utility_shock(base + step),
    )?;
    let down = steady_state(
        calibration,
        &config.clone().with_marginal_utility_shock(base - step),
    )?;

    let sensitivity = ShockSensitivity {
        step,
        aggregate_assets: (up.aggregate_assets - down.aggregate_assets) / (2.0 * step),
        aggregate_consumption: (up.aggregate_consumption - down.aggregate_consumption)
            / (2.0 * step),
    };
    debug!(
        step,
        d_assets = sensitivity.aggregate_assets,
        d_consumption = sensitivity.aggregate_consumption,
        "shock sensitivity"
    );
    Ok(sensitivity)
}
