//! Spline interpolation.
//!
//! The solver represents every function it iterates on (consumption
//! policies, conditional CDFs) as a cubic B-spline fitted on a grid with
//! not-a-knot end conditions. See [`bspline`] for the representation.
//!
//! Two layers are exposed:
//!
//! - raw kernels ([`interp`], [`locate`], [`val_scalar`], ...) working on
//!   plain knot and coefficient slices, with no validation;
//! - [`CubicBSpline`], which owns its knots and coefficients and adds batch
//!   evaluation, derivatives and integration.

pub mod bspline;

pub use bspline::{
    bspline_basis_known_i, interp, locate, make_knots, val_scalar, val_scalar_known_i,
    val_scalar_with_der, val_scalar_with_der_known_i, CubicBSpline, MIN_POINTS,
};
