//! Consumption and savings policies as splines on cash-on-hand.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smoothsim_math::interpolation::CubicBSpline;

/// Per-state consumption splines on the endogenous cash-on-hand grid.
///
/// Row `s` of `coefficients` holds the B-spline coefficients of unconstrained
/// consumption as a function of cash-on-hand, on the knots of row `s` of
/// `coh_endog`. Below `coh_endog[s, 0]` the household is at the borrowing
/// limit and consumes all of its cash-on-hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySplines {
    /// B-spline coefficients, `S x N`.
    pub coefficients: Array2<f64>,
    /// Endogenous cash-on-hand grid, `S x N`, increasing along each row.
    pub coh_endog: Array2<f64>,
}

impl PolicySplines {
    /// Number of income states.
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.coh_endog.nrows()
    }

    /// Cash-on-hand at or below which state `s` is borrowing constrained.
    #[must_use]
    pub fn constraint_threshold(&self, s: usize) -> f64 {
        self.coh_endog[[s, 0]]
    }

    /// Unconstrained consumption spline of state `s`.
    #[must_use]
    pub fn spline(&self, s: usize) -> CubicBSpline {
        let grid: Vec<f64> = self.coh_endog.row(s).to_vec();
        CubicBSpline::from_coefficients(&grid, self.coefficients.row(s).to_vec())
    }

    /// Splines of every state.
    #[must_use]
    pub fn splines(&self) -> Vec<CubicBSpline> {
        (0..self.n_states()).map(|s| self.spline(s)).collect()
    }

    /// Policy of state `s` with its spline built once, for repeated queries.
    #[must_use]
    pub fn state(&self, s: usize) -> StatePolicy {
        StatePolicy {
            spline: self.spline(s),
            threshold: self.constraint_threshold(s),
        }
    }

    /// Consumption in state `s` with cash-on-hand `coh`.
    ///
    /// Builds the spline on every call; use [`state`](Self::state) for
    /// more than one query.
    #[must_use]
    pub fn consumption(&self, s: usize, coh: f64) -> f64 {
        self.state(s).consumption(coh)
    }

    /// End-of-period assets in state `s` with cash-on-hand `coh`.
    #[must_use]
    pub fn savings(&self, s: usize, coh: f64) -> f64 {
        self.state(s).savings(coh)
    }

    /// Marginal propensity to consume out of cash-on-hand; one when constrained.
    #[must_use]
    pub fn mpc(&self, s: usize, coh: f64) -> f64 {
        self.state(s).mpc(coh)
    }

    /// Consumption in state `s` at ascending cash-on-hand values.
    #[must_use]
    pub fn consumption_schedule(&self, s: usize, coh: &[f64]) -> Vec<f64> {
        self.state(s).consumption_schedule(coh)
    }
}

/// Policy of a single income state.
#[derive(Debug, Clone, PartialEq)]
pub struct StatePolicy {
    spline: CubicBSpline,
    threshold: f64,
}

impl StatePolicy {
    /// Cash-on-hand at or below which the state is borrowing constrained.
    #[must_use]
    pub fn constraint_threshold(&self) -> f64 {
        self.threshold
    }

    /// Consumption with cash-on-hand `coh`.
    #[must_use]
    pub fn consumption(&self, coh: f64) -> f64 {
        if coh > self.threshold {
            self.spline.value(coh)
        } else {
            coh
        }
    }

    /// End-of-period assets with cash-on-hand `coh`.
    #[must_use]
    pub fn savings(&self, coh: f64) -> f64 {
        if coh > self.threshold {
            coh - self.spline.value(coh)
        } else {
            0.0
        }
    }

    /// Marginal propensity to consume; one when constrained.
    #[must_use]
    pub fn mpc(&self, coh: f64) -> f64 {
        if coh > self.threshold {
            self.spline.value_and_derivative(coh).1
        } else {
            1.0
        }
    }

    /// Consumption at ascending cash-on-hand values.
    #[must_use]
    pub fn consumption_schedule(&self, coh: &[f64]) -> Vec<f64> {
        let unconstrained = self.spline.values_monotonic(coh);
        coh.iter()
            .zip(unconstrained)
            .map(|(&x, c)| if x > self.threshold { c } else { x })
            .collect()
    }
}

/// Consumption and savings as functions of `(state, cash-on-hand)`.
///
/// The splines are built once and owned by the returned closures.
pub fn policy_functions(
    policy: &PolicySplines,
) -> (impl Fn(usize, f64) -> f64, impl Fn(usize, f64) -> f64) {
    let states: Vec<StatePolicy> = (0..policy.n_states()).map(|s| policy.state(s)).collect();
    let consumption = {
        let states = states.clone();
        move |s: usize, coh: f64| states[s].consumption(coh)
    };
    let savings = move |s: usize, coh: f64| states[s].savings(coh);
    (consumption, savings)
}
