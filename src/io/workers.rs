//! Bounded worker pools for the embarrassingly parallel stages

use crate::io::error::{Result, invalid_parameter};

/// Build a rayon pool with exactly `workers` threads
///
/// # Errors
///
/// Returns `InvalidParameter` if `workers` is zero or the pool cannot start
pub fn worker_pool(workers: usize) -> Result<rayon::ThreadPool> {
    if workers == 0 {
        return Err(invalid_parameter(
            "workers",
            &workers,
            &"worker pool needs at least one thread",
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|index| format!("cardmosaic-worker-{index}"))
        .build()
        .map_err(|e| invalid_parameter("workers", &workers, &e))
}
