//! Cubic B-spline interpolation with not-a-knot end conditions.
//!
//! The spline through `n` points `(x[i], y[i])` is stored as `n` B-spline
//! coefficients `q` over the knot vector returned by [`make_knots`]:
//! four copies of each endpoint and the interior abscissas `x[2..n-2]`.
//! Dropping `x[1]` and `x[n-2]` from the knots is the not-a-knot condition;
//! those two points still constrain the fit.
//!
//! Coefficients are only meaningful next to knots built from the grid they
//! were fitted on, or from an affine image of that grid. The latter is how a
//! CDF fitted over assets is evaluated over cash-on-hand.

use crate::error::{MathError, MathResult};
use crate::linear_algebra::solve_tridiagonal_in_place;

/// Smallest grid a cubic not-a-knot spline can be fitted on.
pub const MIN_POINTS: usize = 5;

/// Builds the knot vector for a not-a-knot cubic spline on the sorted grid `x`.
///
/// The result has length `n + 4`.
#[must_use]
pub fn make_knots(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut t = Vec::with_capacity(n + 4);
    t.extend_from_slice(&[x[0]; 4]);
    t.extend_from_slice(&x[2..n - 2]);
    t.extend_from_slice(&[x[n - 1]; 4]);
    t
}

/// Returns the knot interval `i` with `t[i] < x <= t[i+1]`.
///
/// The index is clamped to `[3, t.len() - 5]`, so points outside the knot
/// range are evaluated with the polynomial piece of the nearest boundary
/// interval.
#[inline]
#[must_use]
pub fn locate(t: &[f64], x: f64) -> usize {
    t.partition_point(|&k| k < x)
        .saturating_sub(1)
        .clamp(3, t.len() - 5)
}

/// Evaluates the spline `(t, q)` at `x`.
#[inline]
#[must_use]
pub fn val_scalar(q: &[f64], t: &[f64], x: f64) -> f64 {
    val_scalar_known_i(q, t, locate(t, x), x)
}

/// Evaluates the spline `(t, q)` and its first derivative at `x`.
#[inline]
#[must_use]
pub fn val_scalar_with_der(q: &[f64], t: &[f64], x: f64) -> (f64, f64) {
    val_scalar_with_der_known_i(q, t, locate(t, x), x)
}

/// Evaluates the spline at `x` given the knot interval `i` from [`locate`].
///
/// Three rounds of linear blending (de Boor) over `q[i-3..=i]`.
#[inline]
#[must_use]
pub fn val_scalar_known_i(q: &[f64], t: &[f64], i: usize, x: f64) -> f64 {
    let alpha0 = (t[i + 1] - x) / (t[i + 1] - t[i - 2]);
    let alpha1 = (t[i + 2] - x) / (t[i + 2] - t[i - 1]);
    let alpha2 = (t[i + 3] - x) / (t[i + 3] - t[i]);
    let m0 = alpha0 * q[i - 3] + (1.0 - alpha0) * q[i - 2];
    let m1 = alpha1 * q[i - 2] + (1.0 - alpha1) * q[i - 1];
    let m2 = alpha2 * q[i - 1] + (1.0 - alpha2) * q[i];

    let beta0 = (t[i + 1] - x) / (t[i + 1] - t[i - 1]);
    let beta1 = (t[i + 2] - x) / (t[i + 2] - t[i]);
    let n0 = beta0 * m0 + (1.0 - beta0) * m1;
    let n1 = beta1 * m1 + (1.0 - beta1) * m2;

    let gamma = (t[i + 1] - x) / (t[i + 1] - t[i]);
    gamma * n0 + (1.0 - gamma) * n1
}

/// Same as [`val_scalar_known_i`], also returning the derivative at `x`.
#[must_use]
pub fn val_scalar_with_der_known_i(q: &[f64], t: &[f64], i: usize, x: f64) -> (f64, f64) {
    let alpha0 = (t[i + 1] - x) / (t[i + 1] - t[i - 2]);
    let alpha1 = (t[i + 2] - x) / (t[i + 2] - t[i - 1]);
    let alpha2 = (t[i + 3] - x) / (t[i + 3] - t[i]);
    let m0 = alpha0 * q[i - 3] + (1.0 - alpha0) * q[i - 2];
    let m1 = alpha1 * q[i - 2] + (1.0 - alpha1) * q[i - 1];
    let m2 = alpha2 * q[i - 1] + (1.0 - alpha2) * q[i];
    let dm0 = (q[i - 2] - q[i - 3]) / (t[i + 1] - t[i - 2]);
    let dm1 = (q[i - 1] - q[i - 2]) / (t[i + 2] - t[i - 1]);
    let dm2 = (q[i] - q[i - 1]) / (t[i + 3] - t[i]);

    let beta0 = (t[i + 1] - x) / (t[i + 1] - t[i - 1]);
    let beta1 = (t[i + 2] - x) / (t[i + 2] - t[i]);
    let n0 = beta0 * m0 + (1.0 - beta0) * m1;
    let n1 = beta1 * m1 + (1.0 - beta1) * m2;
    let dn0 = (m1 - m0) / (t[i + 1] - t[i - 1]) + beta0 * dm0 + (1.0 - beta0) * dm1;
    let dn1 = (m2 - m1) / (t[i + 2] - t[i]) + beta1 * dm1 + (1.0 - beta1) * dm2;

    let gamma = (t[i + 1] - x) / (t[i + 1] - t[i]);
    let value = gamma * n0 + (1.0 - gamma) * n1;
    let derivative = gamma * dn0 + (1.0 - gamma) * dn1 + (n1 - n0) / (t[i + 1] - t[i]);
    (value, derivative)
}

/// Values of the four cubic B-splines `i-3..=i` at `x`, for `x` in knot
/// interval `i`. All other B-splines vanish there.
///
/// This is the transpose of [`val_scalar_known_i`]; the four values sum to one.
#[must_use]
pub fn bspline_basis_known_i(t: &[f64], i: usize, x: f64) -> [f64; 4] {
    let gamma = (t[i + 1] - x) / (t[i + 1] - t[i]);
    let n0 = gamma;
    let n1 = 1.0 - gamma;

    let beta0 = (t[i + 1] - x) / (t[i + 1] - t[i - 1]);
    let beta1 = (t[i + 2] - x) / (t[i + 2] - t[i]);
    let m0 = beta0 * n0;
    let m1 = (1.0 - beta0) * n0 + beta1 * n1;
    let m2 = (1.0 - beta1) * n1;

    let alpha0 = (t[i + 1] - x) / (t[i + 1] - t[i - 2]);
    let alpha1 = (t[i + 2] - x) / (t[i + 2] - t[i - 1]);
    let alpha2 = (t[i + 3] - x) / (t[i + 3] - t[i]);
    [
        alpha0 * m0,
        (1.0 - alpha0) * m0 + alpha1 * m1,
        (1.0 - alpha1) * m1 + alpha2 * m2,
        (1.0 - alpha2) * m2,
    ]
}

/// Returns the B-spline coefficients of the not-a-knot cubic spline
/// interpolating `(x, y)`.
///
/// `x` must be strictly increasing with at least [`MIN_POINTS`] entries and
/// `y` must have the same length; neither is checked here.
#[must_use]
pub fn interp(x: &[f64], y: &[f64]) -> Vec<f64> {
    let t = make_knots(x);
    interp_with_knots(&t, x, y)
}

fn interp_with_knots(t: &[f64], x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let m = n - 4;
    let mut q = vec![0.0; n];

    // Endpoint coefficients are the endpoint data.
    q[0] = y[0];
    q[n - 1] = y[n - 1];

    // Rows for the interior knots t[4..n]: B-splines i-3..=i-1 are the only
    // ones alive at t[i].
    let mut lower = vec![0.0; m];
    let mut diag = vec![0.0; m];
    let mut upper = vec![0.0; m];
    for i in 4..n {
        let [b0, b1, b2, _] = bspline_basis_known_i(t, i, t[i]);
        lower[i - 4] = b0;
        diag[i - 4] = b1;
        upper[i - 4] = b2;
    }
    let mut rhs = y[2..n - 2].to_vec();

    // Rows for x[1] and x[n-2], minus the known endpoint terms.
    let [b0, b1, b2, b3] = bspline_basis_known_i(t, 3, x[1]);
    let [e0, e1, e2, e3] = bspline_basis_known_i(t, n - 1, x[n - 2]);
    let by = y[1] - b0 * y[0];
    let ey = y[n - 2] - e3 * y[n - 1];

    if m == 1 {
        // Five points: q[1], q[2], q[3] are coupled through all three rows.
        let [q1, q2, q3] = solve_3x3(
            [[b1, b2, b3], [lower[0], diag[0], upper[0]], [e0, e1, e2]],
            [by, rhs[0], ey],
        );
        q[1] = q1;
        q[2] = q2;
        q[3] = q3;
        return q;
    }

    // Eliminate q[1] from the first row and q[n-2] from the last.
    let bratio = lower[0] / b1;
    let eratio = upper[m - 1] / e2;
    diag[0] -= bratio * b2;
    upper[0] -= bratio * b3;
    rhs[0] -= bratio * by;
    lower[m - 1] -= eratio * e0;
    diag[m - 1] -= eratio * e1;
    rhs[m - 1] -= eratio * ey;

    solve_tridiagonal_in_place(&lower, &mut diag, &upper, &mut rhs);
    q[2..n - 2].copy_from_slice(&rhs);

    q[1] = (by - b2 * q[2] - b3 * q[3]) / b1;
    q[n - 2] = (ey - e0 * q[n - 4] - e1 * q[n - 3]) / e2;
    q
}

/// Cramer's rule for the 3x3 system of the five-point spline.
fn solve_3x3(a: [[f64; 3]; 3], r: [f64; 3]) -> [f64; 3] {
    let det = |m: [[f64; 3]; 3]| {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };
    let d = det(a);
    let mut out = [0.0; 3];
    for (col, slot) in out.iter_mut().enumerate() {
        let mut replaced = a;
        for row in 0..3 {
            replaced[row][col] = r[row];
        }
        *slot = det(replaced) / d;
    }
    out
}

/// A fitted cubic B-spline: knots plus coefficients.
///
/// # Example
///
/// ```rust
/// use smoothsim_math::interpolation::CubicBSpline;
///
/// let xs = [0.0, 0.5, 1.5, 2.0, 3.5, 4.0];
/// let ys: Vec<f64> = xs.iter().map(|x| x * x * x - x).collect();
///
/// let spline = CubicBSpline::new(&xs, &ys).unwrap();
/// assert!((spline.value(1.0) - 0.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CubicBSpline {
    knots: Vec<f64>,
    coefficients: Vec<f64>,
}

impl CubicBSpline {
    /// Fits the not-a-knot spline through `(xs, ys)`.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than [`MIN_POINTS`] points, the
    /// lengths differ, or `xs` is not strictly increasing.
    pub fn new(xs: &[f64], ys: &[f64]) -> MathResult<Self> {
        if xs.len() < MIN_POINTS {
            return Err(MathError::insufficient_data(MIN_POINTS, xs.len()));
        }
        if xs.len() != ys.len() {
            return Err(MathError::dimension_mismatch(xs.len(), ys.len()));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(MathError::invalid_input(
                "x values must be strictly increasing",
            ));
        }
        Ok(Self::fit(xs, ys))
    }

    /// Fits the spline without validating the input.
    #[must_use]
    pub fn fit(xs: &[f64], ys: &[f64]) -> Self {
        let knots = make_knots(xs);
        let coefficients = interp_with_knots(&knots, xs, ys);
        Self {
            knots,
            coefficients,
        }
    }

    /// Pairs coefficients with the knots of `grid`.
    ///
    /// `grid` must be the grid the coefficients were fitted on or an
    /// increasing affine image of it.
    #[must_use]
    pub fn from_coefficients(grid: &[f64], coefficients: Vec<f64>) -> Self {
        Self {
            knots: make_knots(grid),
            coefficients,
        }
    }

    /// Knot vector.
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// B-spline coefficients.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Consumes the spline, returning its coefficients.
    pub fn into_coefficients(self) -> Vec<f64> {
        self.coefficients
    }

    /// Left end of the fitted grid.
    pub fn min_x(&self) -> f64 {
        self.knots[0]
    }

    /// Right end of the fitted grid.
    pub fn max_x(&self) -> f64 {
        self.knots[self.knots.len() - 1]
    }

    /// Value at `x`. Points outside the grid extrapolate the boundary piece.
    #[inline]
    pub fn value(&self, x: f64) -> f64 {
        val_scalar(&self.coefficients, &self.knots, x)
    }

    /// Value and first derivative at `x`.
    pub fn value_and_derivative(&self, x: f64) -> (f64, f64) {
        val_scalar_with_der(&self.coefficients, &self.knots, x)
    }

    /// Values at arbitrary query points, each located by binary search.
    pub fn values(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.value(x)).collect()
    }

    /// Values at ascending query points.
    ///
    /// The knot interval only ever moves forward, so locating a point costs
    /// O(1) amortized when `xs` is about as dense as the grid. Gives the same
    /// results as [`values`](Self::values) for sorted input.
    pub fn values_monotonic(&self, xs: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; xs.len()];
        self.values_monotonic_into(xs, &mut out);
        out
    }

    /// [`values_monotonic`](Self::values_monotonic) writing into `out`.
    pub fn values_monotonic_into(&self, xs: &[f64], out: &mut [f64]) {
        let t = &self.knots;
        let last = t.len() - 5;
        let mut ti = 3;
        for (&x, slot) in xs.iter().zip(out.iter_mut()) {
            while ti < last && t[ti + 1] < x {
                ti += 1;
            }
            *slot = val_scalar_known_i(&self.coefficients, t, ti, x);
        }
    }

    /// Integral of the spline over the whole fitted grid.
    ///
    /// Each cubic B-spline integrates to `(t[i+4] - t[i]) / 4`.
    pub fn integral(&self) -> f64 {
        self.coefficients
            .iter()
            .enumerate()
            .map(|(i, q)| q * (self.knots[i + 4] - self.knots[i]))
            .sum::<f64>()
            / 4.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn cubic(x: f64) -> f64 {
        0.3 * x * x * x - 1.2 * x * x + 0.7 * x - 2.0
    }

    fn cubic_der(x: f64) -> f64 {
        0.9 * x * x - 2.4 * x + 0.7
    }

    fn uneven_grid() -> Vec<f64> {
        vec![0.0, 0.1, 0.35, 0.8, 1.4, 2.2, 3.1, 4.5, 6.0]
    }

    #[test]
    fn test_knot_layout() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let t = make_knots(&x);
        assert_eq!(
            t,
            vec![1.0, 1.0, 1.0, 1.0, 3.0, 4.0, 5.0, 7.0, 7.0, 7.0, 7.0]
        );
    }

    #[test]
    fn test_locate_is_clamped() {
        let t = make_knots(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(locate(&t, -10.0), 3);
        assert_eq!(locate(&t, 0.0), 3);
        assert_eq!(locate(&t, 2.5), 4);
        // Right edge of an interval belongs to that interval.
        assert_eq!(locate(&t, 3.0), 4);
        assert_eq!(locate(&t, 100.0), t.len() - 5);
    }

    #[test]
    fn test_basis_partition_of_unity() {
        let t = make_knots(&uneven_grid());
        for &x in &[0.05, 0.5, 1.0, 2.9, 5.5] {
            let basis = bspline_basis_known_i(&t, locate(&t, x), x);
            assert_relative_eq!(basis.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
            assert!(basis.iter().all(|&b| b >= 0.0));
        }
    }

    #[test]
    fn test_endpoint_coefficients_equal_data() {
        let xs = uneven_grid();
        let ys: Vec<f64> = xs.iter().map(|x| x.sin()).collect();
        let q = interp(&xs, &ys);
        assert_eq!(q[0], ys[0]);
        assert_eq!(q[q.len() - 1], ys[ys.len() - 1]);
    }

    #[test]
    fn test_reproduces_cubic() {
        let xs = uneven_grid();
        let ys: Vec<f64> = xs.iter().map(|&x| cubic(x)).collect();
        let spline = CubicBSpline::new(&xs, &ys).unwrap();

        for (&x, &y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(spline.value(x), y, epsilon = 1e-12);
        }
        for &x in &[0.05, 0.6, 1.77, 3.9, 5.99] {
            let (v, d) = spline.value_and_derivative(x);
            assert_relative_eq!(v, cubic(x), epsilon = 1e-12);
            assert_relative_eq!(d, cubic_der(x), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_extrapolates_boundary_piece() {
        let xs = uneven_grid();
        let ys: Vec<f64> = xs.iter().map(|&x| cubic(x)).collect();
        let spline = CubicBSpline::fit(&xs, &ys);

        // A cubic is a single polynomial piece, so extrapolation is exact.
        assert_relative_eq!(spline.value(-0.5), cubic(-0.5), epsilon = 1e-10);
        assert_relative_eq!(spline.value(7.0), cubic(7.0), epsilon = 1e-10);
    }

    #[test]
    fn test_short_grids_interpolate() {
        for xs in [
            vec![0.0, 1.0, 2.5, 3.0, 4.0],
            vec![0.0, 0.5, 1.0, 2.5, 3.0, 4.0],
        ] {
            let ys: Vec<f64> = xs.iter().map(|x| (0.7_f64 * x).cos()).collect();
            let spline = CubicBSpline::new(&xs, &ys).unwrap();
            for (&x, &y) in xs.iter().zip(ys.iter()) {
                assert_relative_eq!(spline.value(x), y, epsilon = 1e-12);
            }
            let ys: Vec<f64> = xs.iter().map(|&x| cubic(x)).collect();
            let spline = CubicBSpline::new(&xs, &ys).unwrap();
            assert_relative_eq!(spline.value(1.7), cubic(1.7), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_monotonic_matches_general() {
        let xs = uneven_grid();
        let ys: Vec<f64> = xs.iter().map(|x| (1.0_f64 + x).ln()).collect();
        let spline = CubicBSpline::fit(&xs, &ys);

        let queries: Vec<f64> = (0..200).map(|k| -0.5 + 0.035 * f64::from(k)).collect();
        let general = spline.values(&queries);
        let monotonic = spline.values_monotonic(&queries);
        assert_eq!(general, monotonic);
    }

    #[test]
    fn test_integral_of_cubic() {
        let xs = uneven_grid();
        let ys: Vec<f64> = xs.iter().map(|&x| cubic(x)).collect();
        let spline = CubicBSpline::fit(&xs, &ys);

        let antiderivative = |x: f64| 0.075 * x.powi(4) - 0.4 * x.powi(3) + 0.35 * x * x - 2.0 * x;
        let exact = antiderivative(6.0) - antiderivative(0.0);
        assert_relative_eq!(spline.integral(), exact, epsilon = 1e-11);
    }

    #[test]
    fn test_affine_regrid_preserves_values() {
        let xs = uneven_grid();
        let ys: Vec<f64> = xs.iter().map(|x| x.sqrt()).collect();
        let spline = CubicBSpline::fit(&xs, &ys);

        let shifted: Vec<f64> = xs.iter().map(|x| 1.02 * x + 0.4).collect();
        let moved = CubicBSpline::from_coefficients(&shifted, spline.coefficients().to_vec());
        for &x in &[0.2, 1.1, 4.0] {
            assert_relative_eq!(moved.value(1.02 * x + 0.4), spline.value(x), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            CubicBSpline::new(&[0.0, 1.0, 2.0, 3.0], &[0.0; 4]),
            Err(MathError::InsufficientData { .. })
        ));
        assert!(matches!(
            CubicBSpline::new(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0; 4]),
            Err(MathError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            CubicBSpline::new(&[0.0, 1.0, 1.0, 3.0, 4.0], &[0.0; 5]),
            Err(MathError::InvalidInput { .. })
        ));
    }

    fn increasing_grid() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0.05f64..2.0, 7..30).prop_map(|steps| {
            let mut x = -1.0;
            steps
                .into_iter()
                .map(|h| {
                    x += h;
                    x
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_cubic_reproduced(
            grid in increasing_grid(),
            c in prop::array::uniform4(-2.0f64..2.0),
            frac in 0.0f64..1.0,
        ) {
            let poly = |x: f64| c[0] + x * (c[1] + x * (c[2] + x * c[3]));
            let ys: Vec<f64> = grid.iter().map(|&x| poly(x)).collect();
            let spline = CubicBSpline::fit(&grid, &ys);
            let scale = ys.iter().fold(1.0f64, |acc, y| acc.max(y.abs()));

            for (&x, &y) in grid.iter().zip(ys.iter()) {
                prop_assert!((spline.value(x) - y).abs() <= 1e-9 * scale);
            }
            let x = grid[0] + frac * (grid[grid.len() - 1] - grid[0]);
            prop_assert!((spline.value(x) - poly(x)).abs() <= 1e-9 * scale);
        }
    }
}
