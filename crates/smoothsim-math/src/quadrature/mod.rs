//! Gauss-Legendre quadrature against normal and lognormal densities.
//!
//! A single 40-point rule on [-1, 1] ([`GaussLegendre::standard`]) is built
//! once and affinely mapped onto each integration window. The functions in
//! [`normal`] fold the density into the weights, so every expectation in the
//! solver is one dot product `weights · f(points)`.
//!
//! # Example
//!
//! ```rust
//! use smoothsim_math::quadrature::{integrate_lognormal_interval, GaussLegendre};
//!
//! // E[X] for X = 1 + Y, log Y ~ N(0, 0.2^2)
//! let rule = GaussLegendre::standard();
//! let nodes = integrate_lognormal_interval(rule, 1.0, 0.0, 0.2, f64::NEG_INFINITY, f64::INFINITY);
//! let mean = nodes.integrate(|x| x);
//! assert!((mean - (1.0 + 0.02f64.exp())).abs() < 1e-12);
//! ```

mod gauss_legendre;
pub mod normal;

pub use gauss_legendre::{GaussLegendre, DEFAULT_ORDER};
pub use normal::{
    integrate_lognormal_interval, integrate_normal_interval, log_with_inf, normal_cdf, normal_pdf,
    QuadratureNodes, TRUNCATION_SDS,
};
