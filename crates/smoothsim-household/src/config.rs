//! Solver tolerances, iteration caps and switches.

use serde::{Deserialize, Serialize};

/// Default sup-norm tolerance on the endogenous cash-on-hand grid.
pub const DEFAULT_BACKWARD_TOLERANCE: f64 = 1e-9;

/// Default sup-norm tolerance on the asset CDF.
pub const DEFAULT_FORWARD_TOLERANCE: f64 = 1e-11;

/// Default tolerance for the Markov chain's stationary distribution.
pub const DEFAULT_STATIONARY_TOLERANCE: f64 = 1e-14;

/// Default cap shared by all three iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Correction applied to the upper half of the asset CDF after each
/// forward step.
///
/// The spline representation lets mass leak past the top of the grid; the
/// smooth-step correction blends the CDF towards one over `[M/2, M]` so that
/// `F(M) = 1` exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailCorrection {
    /// `F <- (1 - w) F + w` with `w = 3t^2 - 2t^3` on the upper half.
    #[default]
    SmoothStep,
    /// Leave the CDF as the transition produced it.
    Disabled,
}

/// Configuration for [`steady_state`](crate::steady_state::steady_state).
///
/// Every field has a default, so partial TOML or JSON documents deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Stop the backward iteration once the endogenous grid moves less than this.
    pub backward_tolerance: f64,
    /// Iteration cap for the backward iteration.
    pub backward_max_iterations: usize,
    /// Stop the forward iteration once the CDF moves less than this.
    pub forward_tolerance: f64,
    /// Iteration cap for the forward iteration.
    pub forward_max_iterations: usize,
    /// Tolerance for the stationary distribution of the income chain.
    pub stationary_tolerance: f64,
    /// Iteration cap for the stationary distribution.
    pub stationary_max_iterations: usize,
    /// Constant added to next-period marginal utility before every backward step.
    pub marginal_utility_shock: f64,
    /// Tail treatment of the CDF in the forward iteration.
    pub tail_correction: TailCorrection,
    /// Solve the per-state problems in parallel (requires the `parallel` feature).
    pub parallel: bool,
    /// Minimum number of income states before going parallel.
    pub parallel_threshold: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backward_tolerance: DEFAULT_BACKWARD_TOLERANCE,
            backward_max_iterations: DEFAULT_MAX_ITERATIONS,
            forward_tolerance: DEFAULT_FORWARD_TOLERANCE,
            forward_max_iterations: DEFAULT_MAX_ITERATIONS,
            stationary_tolerance: DEFAULT_STATIONARY_TOLERANCE,
            stationary_max_iterations: DEFAULT_MAX_ITERATIONS,
            marginal_utility_shock: 0.0,
            tail_correction: TailCorrection::SmoothStep,
            parallel: true,
            parallel_threshold: 4,
        }
    }
}

impl SolverConfig {
    /// Creates a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config that never uses the thread pool.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Sets the backward tolerance.
    #[must_use]
    pub fn with_backward_tolerance(mut self, tolerance: f64) -> Self {
        self.backward_tolerance = tolerance;
        self
    }

    /// Sets the backward iteration cap.
    #[must_use]
    pub fn with_backward_max_iterations(mut self, max_iterations: usize) -> Self {
        self.backward_max_iterations = max_iterations;
        self
    }

    /// Sets the forward tolerance.
    #[must_use]
    pub fn with_forward_tolerance(mut self, tolerance: f64) -> Self {
        self.forward_tolerance = tolerance;
        self
    }

    /// Sets the forward iteration cap.
    #[must_use]
    pub fn with_forward_max_iterations(mut self, max_iterations: usize) -> Self {
        self.forward_max_iterations = max_iterations;
        self
    }

    /// Sets the stationary-distribution tolerance.
    #[must_use]
    pub fn with_stationary_tolerance(mut self, tolerance: f64) -> Self {
        self.stationary_tolerance = tolerance;
        self
    }

    /// Sets the stationary-distribution iteration cap.
    #[must_use]
    pub fn with_stationary_max_iterations(mut self, max_iterations: usize) -> Self {
        self.stationary_max_iterations = max_iterations;
        self
    }

    /// Sets the marginal utility shock.
    #[must_use]
    pub fn with_marginal_utility_shock(mut self, shock: f64) -> Self {
        self.marginal_utility_shock = shock;
        self
    }

    /// Sets the tail correction.
    #[must_use]
    pub fn with_tail_correction(mut self, correction: TailCorrection) -> Self {
        self.tail_correction = correction;
        self
    }

    /// Sets whether to use parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Sets the state-count threshold for parallel processing.
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Returns true if `n_states` per-state problems should run in parallel.
    #[must_use]
    pub fn should_parallelize(&self, n_states: usize) -> bool {
        cfg!(feature = "parallel") && self.parallel && n_states >= self.parallel_threshold
    }
}
