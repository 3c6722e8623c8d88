//! Gauss-Legendre rules on [-1, 1].

use std::f64::consts::PI;
use std::sync::OnceLock;

/// Order of the rule shared by the solver.
pub const DEFAULT_ORDER: usize = 40;

const NEWTON_TOLERANCE: f64 = 1e-15;
const NEWTON_MAX_ITERATIONS: usize = 100;

/// Static 40-point rule, built on first use.
static STANDARD_RULE: OnceLock<GaussLegendre> = OnceLock::new();

/// Nodes and weights of an `n`-point Gauss-Legendre rule on [-1, 1].
///
/// Exact for polynomials of degree up to `2n - 1`. Nodes are ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussLegendre {
    nodes: Vec<f64>,
    weights: Vec<f64>,
}

impl GaussLegendre {
    /// Builds the `order`-point rule.
    ///
    /// Each positive root of `P_n` is found by Newton's method from the
    /// Chebyshev-like guess `cos(pi (k + 3/4) / (n + 1/2))`; the rule is
    /// symmetric so the negative roots are mirrored.
    #[must_use]
    pub fn new(order: usize) -> Self {
        let n = order;
        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];

        for k in 0..n.div_ceil(2) {
            let mut z = (PI * (k as f64 + 0.75) / (n as f64 + 0.5)).cos();
            for _ in 0..NEWTON_MAX_ITERATIONS {
                let (p, dp) = legendre_with_derivative(n, z);
                let step = p / dp;
                z -= step;
                if step.abs() < NEWTON_TOLERANCE {
                    break;
                }
            }
            let (_, dp) = legendre_with_derivative(n, z);
            let w = 2.0 / ((1.0 - z * z) * dp * dp);

            nodes[k] = -z;
            nodes[n - 1 - k] = z;
            weights[k] = w;
            weights[n - 1 - k] = w;
        }

        log::debug!("built {n}-point Gauss-Legendre rule");
        Self { nodes, weights }
    }

    /// The shared [`DEFAULT_ORDER`]-point rule.
    pub fn standard() -> &'static Self {
        STANDARD_RULE.get_or_init(|| Self::new(DEFAULT_ORDER))
    }

    /// Number of nodes.
    pub fn order(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes on [-1, 1], ascending.
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    /// Weights matching [`nodes`](Self::nodes).
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Maps the rule onto `[a, b]`, returning `(weights, points)`.
    pub fn on_interval(&self, a: f64, b: f64) -> (Vec<f64>, Vec<f64>) {
        let half = (b - a) / 2.0;
        let points = self.nodes.iter().map(|z| half * (z + 1.0) + a).collect();
        let weights = self.weights.iter().map(|w| half * w).collect();
        (weights, points)
    }
}

/// `P_n(z)` and `P_n'(z)` by the three-term recurrence.
fn legendre_with_derivative(n: usize, z: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = 0.0;
    for j in 1..=n {
        let j = j as f64;
        let p2 = p1;
        p1 = p0;
        p0 = ((2.0 * j - 1.0) * z * p1 - (j - 1.0) * p2) / j;
    }
    let dp = n as f64 * (z * p0 - p1) / (z * z - 1.0);
    (p0, dp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_weights_sum_to_two() {
        for order in [1, 2, 5, 17, 40] {
            let rule = GaussLegendre::new(order);
            assert_relative_eq!(rule.weights().iter().sum::<f64>(), 2.0, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_known_small_rules() {
        let rule = GaussLegendre::new(2);
        let r = 1.0 / 3.0f64.sqrt();
        assert_relative_eq!(rule.nodes()[0], -r, epsilon = 1e-15);
        assert_relative_eq!(rule.nodes()[1], r, epsilon = 1e-15);
        assert_relative_eq!(rule.weights()[0], 1.0, epsilon = 1e-15);

        let rule = GaussLegendre::new(3);
        assert_relative_eq!(rule.nodes()[1], 0.0, epsilon = 1e-15);
        assert_relative_eq!(rule.weights()[1], 8.0 / 9.0, epsilon = 1e-14);
        assert_relative_eq!(rule.nodes()[2], 0.6f64.sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn test_nodes_ascending_and_symmetric() {
        let rule = GaussLegendre::standard();
        assert_eq!(rule.order(), DEFAULT_ORDER);
        assert!(rule.nodes().windows(2).all(|w| w[0] < w[1]));
        for k in 0..rule.order() {
            assert_eq!(rule.nodes()[k], -rule.nodes()[rule.order() - 1 - k]);
        }
    }

    #[test]
    fn test_exact_for_high_degree_polynomials() {
        let rule = GaussLegendre::standard();
        // int_{-1}^{1} x^78 dx = 2 / 79
        let sum: f64 = rule
            .nodes()
            .iter()
            .zip(rule.weights())
            .map(|(x, w)| w * x.powi(78))
            .sum();
        assert_relative_eq!(sum, 2.0 / 79.0, epsilon = 1e-13);
    }

    #[test]
    fn test_on_interval() {
        let rule = GaussLegendre::new(6);
        let (w, x) = rule.on_interval(1.0, 4.0);
        assert!(x.iter().all(|&p| p > 1.0 && p < 4.0));
        // int_1^4 x^3 dx = (256 - 1) / 4
        let sum: f64 = w.iter().zip(&x).map(|(w, x)| w * x.powi(3)).sum();
        assert_relative_eq!(sum, 63.75, epsilon = 1e-12);
    }
}
