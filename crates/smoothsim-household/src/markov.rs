//! Finite Markov chains: Rouwenhorst discretization, stationary
//! distributions, Kronecker products and the CDF transition matrix.

use ndarray::{arr2, s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use tracing::{debug, warn};

use crate::error::{HouseholdError, HouseholdResult, IterationStage};
use crate::sup_distance;

/// Rouwenhorst transition matrix with `n` states and inner-switching
/// probability `p`.
///
/// Built up from the two-state chain `[[p, 1-p], [1-p, p]]`: each step pads
/// the previous matrix into the four corners of the next one and halves the
/// interior rows so every row still sums to one.
#[must_use]
pub fn rouwenhorst(n: usize, p: f64) -> Array2<f64> {
    if n <= 1 {
        return Array2::ones((1, 1));
    }

    let mut pi = arr2(&[[p, 1.0 - p], [1.0 - p, p]]);
    for m in 3..=n {
        let mut next = Array2::<f64>::zeros((m, m));
        let k = m - 1;
        next.slice_mut(s![..k, ..k]).scaled_add(p, &pi);
        next.slice_mut(s![..k, 1..]).scaled_add(1.0 - p, &pi);
        next.slice_mut(s![1.., ..k]).scaled_add(1.0 - p, &pi);
        next.slice_mut(s![1.., 1..]).scaled_add(p, &pi);
        next.slice_mut(s![1..k, ..]).mapv_inplace(|x| x / 2.0);
        pi = next;
    }
    pi
}

/// Stationary distribution of `transition` by power iteration.
///
/// Starts from the uniform distribution and applies `pi <- transition^T pi`
/// until successive iterates differ by less than `tolerance` in the sup norm;
/// the last iterate is returned.
///
/// # Errors
///
/// Returns [`HouseholdError::ConvergenceFailed`] if the tolerance is not met
/// within `max_iterations`.
pub fn stationary_distribution(
    transition: ArrayView2<'_, f64>,
    tolerance: f64,
    max_iterations: usize,
) -> HouseholdResult<Array1<f64>> {
    let n = transition.nrows();
    let mut pi = Array1::from_elem(n, 1.0 / n as f64);
    let mut distance = f64::INFINITY;

    for iteration in 0..max_iterations {
        let next = transition.t().dot(&pi);
        distance = sup_distance(next.view(), pi.view());
        pi = next;
        if !distance.is_finite() {
            warn!(iterations = iteration + 1, distance, "stationary distribution diverged");
            return Err(HouseholdError::convergence_failed(
                IterationStage::Stationary,
                iteration + 1,
                distance,
            ));
        }
        if distance < tolerance {
            debug!(iterations = iteration + 1, distance, "stationary distribution converged");
            return Ok(pi);
        }
    }

    warn!(max_iterations, distance, "stationary distribution did not converge");
    Err(HouseholdError::convergence_failed(
        IterationStage::Stationary,
        max_iterations,
        distance,
    ))
}

/// Transition matrix for CDFs conditional on the current state.
///
/// `result[i, j] = transition[j, i] * stationary[j] / stationary[i]`: the
/// probability that a household in state `i` today was in state `j` last
/// period. Rows sum to one when `stationary` is invariant.
#[must_use]
pub fn cdf_transition(
    transition: ArrayView2<'_, f64>,
    stationary: ArrayView1<'_, f64>,
) -> Array2<f64> {
    let mut pi_f = transition.t().to_owned();
    for ((i, j), value) in pi_f.indexed_iter_mut() {
        *value *= stationary[j] / stationary[i];
    }
    pi_f
}

/// Kronecker product `a ⊗ b`.
///
/// For two independent chains the product chain indexes the joint state as
/// `outer * b.nrows() + inner`.
#[must_use]
pub fn kron(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Array2<f64> {
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    let mut out = Array2::<f64>::zeros((ar * br, ac * bc));
    for ((i, j), &aij) in a.indexed_iter() {
        out.slice_mut(s![i * br..(i + 1) * br, j * bc..(j + 1) * bc])
            .assign(&b.mapv(|x| aij * x));
    }
    out
}

/// Kronecker product of two vectors, `outer ⊗ inner`.
#[must_use]
pub fn kron_vec(outer: ArrayView1<'_, f64>, inner: ArrayView1<'_, f64>) -> Array1<f64> {
    outer
        .iter()
        .flat_map(|&o| inner.iter().map(move |&x| o * x))
        .collect()
}

/// Chain over persistent types that redraws its type with probability `q`.
///
/// `(1 - q) I + q 1 w^T`: with probability `q` the next type is drawn from
/// `weights`, otherwise the type is kept. `weights` is also its stationary
/// distribution.
#[must_use]
pub fn persistent_types(q: f64, weights: ArrayView1<'_, f64>) -> Array2<f64> {
    let n = weights.len();
    let mut pi = Array2::<f64>::eye(n) * (1.0 - q);
    for mut row in pi.axis_iter_mut(Axis(0)) {
        row.scaled_add(q, &weights);
    }
    pi
}

/// Largest absolute deviation of a row sum from one.
#[must_use]
pub fn row_sum_error(transition: ArrayView2<'_, f64>) -> f64 {
    transition
        .sum_axis(Axis(1))
        .iter()
        .fold(0.0_f64, |m, s| m.max((s - 1.0).abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};
    use proptest::prelude::*;

    #[test]
    fn test_rouwenhorst_small_cases() {
        let pi = rouwenhorst(2, 0.9);
        assert_eq!(pi, arr2(&[[0.9, 1.0 - 0.9], [1.0 - 0.9, 0.9]]));

        // Three states: corner rows are binomial, middle row is averaged.
        let p = 0.8;
        let pi = rouwenhorst(3, p);
        assert_relative_eq!(pi[[0, 0]], p * p, epsilon = 1e-15);
        assert_relative_eq!(pi[[0, 1]], 2.0 * p * (1.0 - p), epsilon = 1e-15);
        assert_relative_eq!(pi[[0, 2]], (1.0 - p) * (1.0 - p), epsilon = 1e-15);
        assert_relative_eq!(pi[[1, 0]], p * (1.0 - p), epsilon = 1e-15);
        assert_relative_eq!(pi[[1, 1]], p * p + (1.0 - p) * (1.0 - p), epsilon = 1e-15);
        assert_relative_eq!(pi[[2, 2]], p * p, epsilon = 1e-15);

        assert_eq!(rouwenhorst(1, 0.5), arr2(&[[1.0]]));
    }

    #[test]
    fn test_rouwenhorst_rows_sum_to_one() {
        for n in [2, 5, 11, 20] {
            let pi = rouwenhorst(n, 0.96);
            assert_eq!(pi.dim(), (n, n));
            assert!(row_sum_error(pi.view()) < 1e-14);
            assert!(pi.iter().all(|&x| x >= 0.0));
        }
    }

    #[test]
    fn test_rouwenhorst_stationary_is_binomial() {
        // The stationary distribution of the symmetric Rouwenhorst chain is
        // Binomial(n - 1, 1/2).
        let n = 7;
        let pi = stationary_distribution(rouwenhorst(n, 0.9).view(), 1e-14, 10_000).unwrap();
        let mut binom = 1.0;
        for k in 0..n {
            assert_relative_eq!(pi[k], binom / 64.0, epsilon = 1e-12);
            binom = binom * (n - 1 - k) as f64 / (k + 1) as f64;
        }
    }

    #[test]
    fn test_stationary_two_state() {
        let transition = arr2(&[[0.9, 0.1], [0.3, 0.7]]);
        let pi = stationary_distribution(transition.view(), 1e-14, 10_000).unwrap();
        assert_relative_eq!(pi[0], 0.75, epsilon = 1e-12);
        assert_relative_eq!(pi[1], 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_stationary_reports_iteration_cap() {
        let transition = arr2(&[[1.0, 0.0], [0.5, 0.5]]);
        let err = stationary_distribution(transition.view(), 1e-14, 3).unwrap_err();
        assert!(matches!(
            err,
            HouseholdError::ConvergenceFailed {
                stage: IterationStage::Stationary,
                iterations: 3,
                ..
            }
        ));

        // Uniform is already invariant for a symmetric chain.
        let symmetric = arr2(&[[0.6, 0.4], [0.4, 0.6]]);
        assert!(stationary_distribution(symmetric.view(), 1e-14, 1).is_ok());
    }

    #[test]
    fn test_stationary_rejects_nan_transition() {
        let transition = arr2(&[[0.9, 0.1], [f64::NAN, 0.7]]);
        match stationary_distribution(transition.view(), 1e-14, 10_000) {
            Err(HouseholdError::ConvergenceFailed {
                stage: IterationStage::Stationary,
                iterations,
                distance,
            }) => {
                assert_eq!(iterations, 1);
                assert!(distance.is_nan());
            }
            other => panic!("expected a stationary failure, got {other:?}"),
        }
    }

    #[test]
    fn test_cdf_transition_rows_sum_to_one() {
        let transition = rouwenhorst(5, 0.85);
        let pi = stationary_distribution(transition.view(), 1e-14, 10_000).unwrap();
        let pi_f = cdf_transition(transition.view(), pi.view());
        assert!(row_sum_error(pi_f.view()) < 1e-12);

        let transition = arr2(&[[0.9, 0.1], [0.3, 0.7]]);
        let pi = arr1(&[0.75, 0.25]);
        let pi_f = cdf_transition(transition.view(), pi.view());
        assert_relative_eq!(pi_f[[0, 1]], 0.3 * 0.25 / 0.75, epsilon = 1e-15);
        assert_relative_eq!(pi_f[[1, 0]], 0.1 * 0.75 / 0.25, epsilon = 1e-15);
    }

    #[test]
    fn test_kron() {
        let a = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let b = arr2(&[[0.0, 5.0], [6.0, 7.0]]);
        let k = kron(a.view(), b.view());
        let expected = arr2(&[
            [0.0, 5.0, 0.0, 10.0],
            [6.0, 7.0, 12.0, 14.0],
            [0.0, 15.0, 0.0, 20.0],
            [18.0, 21.0, 24.0, 28.0],
        ]);
        assert_eq!(k, expected);

        let v = kron_vec(arr1(&[1.0, 2.0]).view(), arr1(&[3.0, 4.0, 5.0]).view());
        assert_eq!(v, arr1(&[3.0, 4.0, 5.0, 6.0, 8.0, 10.0]));
    }

    #[test]
    fn test_persistent_types() {
        let weights = arr1(&[0.25, 0.25, 0.25, 0.25]);
        let pi = persistent_types(0.01, weights.view());
        assert_relative_eq!(pi[[0, 0]], 0.99 + 0.0025, epsilon = 1e-15);
        assert_relative_eq!(pi[[0, 1]], 0.0025, epsilon = 1e-15);
        assert!(row_sum_error(pi.view()) < 1e-15);

        let stationary = stationary_distribution(pi.view(), 1e-14, 10_000).unwrap();
        for &p in &stationary {
            assert_relative_eq!(p, 0.25, epsilon = 1e-12);
        }
    }

    fn stochastic_matrix(n: usize) -> impl Strategy<Value = Array2<f64>> {
        prop::collection::vec(0.05f64..1.0, n * n).prop_map(move |raw| {
            let mut m = Array2::from_shape_vec((n, n), raw).unwrap();
            for mut row in m.axis_iter_mut(Axis(0)) {
                let total = row.sum();
                row.mapv_inplace(|x| x / total);
            }
            m
        })
    }

    proptest! {
        #[test]
        fn prop_stationary_is_invariant(m in (2usize..7).prop_flat_map(stochastic_matrix)) {
            let pi = stationary_distribution(m.view(), 1e-14, 10_000).unwrap();
            let image = m.t().dot(&pi);
            for (a, b) in image.iter().zip(pi.iter()) {
                prop_assert!((a - b).abs() < 1e-12);
            }
            prop_assert!((pi.sum() - 1.0).abs() < 1e-12);
        }
    }
}
