//! Step dispatch: in order on the calling thread, or fanned out over a
//! dedicated Rayon pool.
//!
//! Parallel results are collected back into step order, so downstream
//! policy decisions see the same sequence either way.

use lookback_core::types::{LookbackError, Result};
use rayon::prelude::*;

/// How the scanner dispatches steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Execution {
    /// One step after another on the calling thread.
    Sequential,
    /// All steps on a Rayon pool with the given number of threads.
    Parallel {
        /// Pool size.
        threads: usize,
    },
}

impl Execution {
    /// Parallel execution sized to the machine.
    pub fn parallel_default() -> Self {
        Execution::Parallel {
            threads: num_cpus::get().max(1),
        }
    }

    /// Returns true for [`Execution::Parallel`].
    #[inline]
    pub fn is_parallel(&self) -> bool {
        matches!(self, Execution::Parallel { .. })
    }
}

/// Evaluates `mapper` for every step in `0..steps` on a dedicated pool,
/// returning results in step order.
///
/// # Errors
///
/// Returns `InvalidConfig` if the pool cannot be built.
pub fn parallel_map_steps<R, F>(steps: usize, threads: usize, mapper: F) -> Result<Vec<R>>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|e| LookbackError::invalid_config(format!("thread pool: {}", e)))?;

    Ok(pool.install(|| (0..steps).into_par_iter().map(&mapper).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_keep_step_order() {
        let squares = parallel_map_steps(100, 4, |step| step * step).unwrap();
        assert_eq!(squares.len(), 100);
        assert!(squares.iter().enumerate().all(|(i, &v)| v == i * i));
    }

    #[test]
    fn test_single_thread_pool() {
        let values = parallel_map_steps(5, 1, |step| step + 1).unwrap();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_default_parallelism() {
        assert!(Execution::parallel_default().is_parallel());
        assert!(!Execution::Sequential.is_parallel());
    }
}
