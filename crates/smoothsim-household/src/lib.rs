//! # Smoothsim Household
//!
//! Steady state of an income-fluctuation savings problem in which income has
//! a persistent Markov component and a lognormal transitory component.
//!
//! This crate provides:
//!
//! - **Calibration**: validated model inputs and builders for asset grids,
//!   Rouwenhorst income processes and discount-factor types
//! - **Backward Iteration**: endogenous gridpoints with the transitory shock
//!   integrated by Gauss-Legendre quadrature
//! - **Forward Iteration**: the conditional asset CDF carried forward as a
//!   spline and convolved with the transitory shock
//! - **Steady State**: policy, distribution and aggregates in one call, plus
//!   finite-difference sensitivities to a marginal-utility shock
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smoothsim_household::prelude::*;
//!
//! let calibration = Calibration::benchmark().unwrap();
//! let ss = steady_state(&calibration, &SolverConfig::default()).unwrap();
//! println!("A = {:.6}, C = {:.6}", ss.aggregate_assets, ss.aggregate_consumption);
//!
//! let (consumption, savings) = policy_functions(&ss.policy);
//! println!("c(0, 1.5) = {}, a'(0, 1.5) = {}", consumption(0, 1.5), savings(0, 1.5));
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): per-state work of each iteration runs on the
//!   rayon pool once there are at least `SolverConfig::parallel_threshold`
//!   states. Results are identical to the sequential path.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::suboptimal_flops)]

pub mod backward;
pub mod calibration;
pub mod cash_on_hand;
pub mod config;
pub mod error;
pub mod forward;
pub mod markov;
pub mod parallel;
pub mod policy;
pub mod sensitivity;
pub mod steady_state;

#[cfg(test)]
mod testing;

use ndarray::{ArrayView, Dimension};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::calibration::{
        discount_factor_types, discretize_assets, discretize_income, Calibration, DiscountFactor,
        IncomeProcess,
    };
    pub use crate::config::{SolverConfig, TailCorrection};
    pub use crate::error::{HouseholdError, HouseholdResult, IterationStage};
    pub use crate::markov::{cdf_transition, kron, persistent_types, stationary_distribution};
    pub use crate::policy::{policy_functions, PolicySplines, StatePolicy};
    pub use crate::sensitivity::{shock_sensitivity, ShockSensitivity};
    pub use crate::steady_state::{aggregate_assets_by_state, steady_state, SteadyState};
}

pub use calibration::{Calibration, DiscountFactor};
pub use config::{SolverConfig, TailCorrection};
pub use error::{HouseholdError, HouseholdResult, IterationStage};
pub use policy::{policy_functions, PolicySplines, StatePolicy};
pub use steady_state::{steady_state, SteadyState};

/// Largest absolute elementwise difference; NaN if any difference is NaN.
pub(crate) fn sup_distance<D: Dimension>(
    a: ArrayView<'_, f64, D>,
    b: ArrayView<'_, f64, D>,
) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        // Once `m` is NaN no comparison succeeds, so it sticks.
        .fold(0.0_f64, |m, d| if d.is_nan() || d > m { d } else { m })
}
