//! Linear algebra utilities.
//!
//! Only banded solvers live here: the spline coefficient solve reduces to a
//! tridiagonal system, which is solved in O(n) with the Thomas algorithm.

use crate::error::{MathError, MathResult};

/// Pivots smaller than this are treated as zero by [`solve_tridiagonal`].
const PIVOT_EPSILON: f64 = 1e-15;

/// Solves a tridiagonal system in place (Thomas algorithm).
///
/// Row `i` of the system reads
/// `lower[i] * x[i-1] + diag[i] * x[i] + upper[i] * x[i+1] = rhs[i]`,
/// so `lower[0]` and `upper[n-1]` are never read. All four slices have
/// length `n`.
///
/// On return `rhs` holds the solution and `diag` holds the pivots of the
/// elimination. No pivot check is made; use [`solve_tridiagonal`] when the
/// system may be singular.
pub fn solve_tridiagonal_in_place(lower: &[f64], diag: &mut [f64], upper: &[f64], rhs: &mut [f64]) {
    let n = rhs.len();
    if n == 0 {
        return;
    }

    // Forward elimination
    for i in 1..n {
        let w = lower[i] / diag[i - 1];
        diag[i] -= w * upper[i - 1];
        rhs[i] -= w * rhs[i - 1];
    }

    // Back substitution
    rhs[n - 1] /= diag[n - 1];
    for i in (0..n - 1).rev() {
        rhs[i] = (rhs[i] - upper[i] * rhs[i + 1]) / diag[i];
    }
}

/// Solves a tridiagonal system of equations.
///
/// The system has the form:
/// ```text
/// | b[0]  c[0]   0    ...   0      | | x[0]   |   | d[0]   |
/// | a[0]  b[1]  c[1]  ...   0      | | x[1]   |   | d[1]   |
/// |  0    a[1]  b[2]  ...   0      | | x[2]   | = | d[2]   |
/// | ...   ...   ...   ...  ...     | | ...    |   | ...    |
/// |  0     0     0   a[n-2] b[n-1] | | x[n-1] |   | d[n-1] |
/// ```
///
/// # Arguments
///
/// * `a` - Lower diagonal (length n-1)
/// * `b` - Main diagonal (length n)
/// * `c` - Upper diagonal (length n-1)
/// * `d` - Right-hand side (length n)
///
/// # Errors
///
/// Returns [`MathError::DimensionMismatch`] for inconsistent lengths and
/// [`MathError::SingularMatrix`] when elimination hits a zero pivot.
pub fn solve_tridiagonal(a: &[f64], b: &[f64], c: &[f64], d: &[f64]) -> MathResult<Vec<f64>> {
    let n = b.len();
    if n == 0 {
        return Ok(vec![]);
    }
    if d.len() != n {
        return Err(MathError::dimension_mismatch(n, d.len()));
    }
    if a.len() != n - 1 {
        return Err(MathError::dimension_mismatch(n - 1, a.len()));
    }
    if c.len() != n - 1 {
        return Err(MathError::dimension_mismatch(n - 1, c.len()));
    }

    let mut lower = Vec::with_capacity(n);
    lower.push(0.0);
    lower.extend_from_slice(a);
    let mut upper = c.to_vec();
    upper.push(0.0);

    let mut diag = b.to_vec();
    let mut x = d.to_vec();
    solve_tridiagonal_in_place(&lower, &mut diag, &upper, &mut x);

    if let Some(row) = diag.iter().position(|p| p.abs() < PIVOT_EPSILON) {
        return Err(MathError::SingularMatrix { row });
    }

    Ok(x)
}
