//! # Smoothsim Math
//!
//! Numerical kernels for the smoothsim household solver.
//!
//! This crate provides:
//!
//! - **Interpolation**: cubic B-splines with not-a-knot end conditions
//!   (fit, scalar/batch/derivative evaluation, integration)
//! - **Quadrature**: a shared 40-point Gauss-Legendre rule mapped onto
//!   truncated normal and shifted-lognormal integrals
//! - **Linear Algebra**: the tridiagonal (Thomas) solve behind spline fitting
//!
//! ## Design Philosophy
//!
//! - **Hot loops stay unchecked**: the raw kernels trust their input; checked
//!   constructors sit on top for callers that want validation
//! - **No per-call setup**: the quadrature rule is computed once and shared
//! - **Empty means zero**: an integration window without mass yields no
//!   points rather than an error

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
#![allow(clippy::unreadable_literal)]
#![allow(clippy::suboptimal_flops)]

pub mod error;
pub mod interpolation;
pub mod linear_algebra;
pub mod quadrature;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::interpolation::CubicBSpline;
    pub use crate::linear_algebra::{solve_tridiagonal, solve_tridiagonal_in_place};
    pub use crate::quadrature::{
        integrate_lognormal_interval, integrate_normal_interval, GaussLegendre, QuadratureNodes,
    };
}

pub use error::{MathError, MathResult};
