//! Per-state fan-out, on the rayon pool when enabled.

use crate::config::SolverConfig;

/// Maps `f` over the income states `0..n_states`, in parallel when the
/// `parallel` feature is on and the config asks for it.
///
/// Results come back in state order either way.
#[allow(unused_variables)]
pub fn map_states<U, F>(n_states: usize, config: &SolverConfig, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if config.should_parallelize(n_states) {
            return (0..n_states).into_par_iter().map(f).collect();
        }
    }

    (0..n_states).map(f).collect()
}
