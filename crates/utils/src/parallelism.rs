//! Worker-count resolution for multi-sample runs

/// Resolve a requested core count, where 0 means every logical CPU
pub fn resolve_n_cores(requested: usize) -> usize {
    if requested == 0 {
        num_cpus::get().max(1)
    } else {
        requested
    }
}

/// Split `n_samples` into `n_cores` chunks of equal length
///
/// Returns `(n_cores, samples_per_core)`. The product may exceed
/// `n_samples` by less than one chunk; callers drop the surplus.
pub fn plan_chunks(n_samples: usize, n_cores: usize) -> (usize, usize) {
    let n_samples = n_samples.max(1);
    let n_cores = n_cores.clamp(1, n_samples);
    let per_core = n_samples.div_ceil(n_cores);
    (n_samples.div_ceil(per_core), per_core)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_means_all_cpus() {
        assert!(resolve_n_cores(0) >= 1);
        assert_eq!(resolve_n_cores(3), 3);
    }

    #[test]
    fn test_plan_chunks_covers_all_samples() {
        for n_samples in 1..50 {
            for n_cores in 1..9 {
                let (cores, per_core) = plan_chunks(n_samples, n_cores);
                assert!(cores * per_core >= n_samples);
                assert!(cores <= n_samples);
                assert!((cores - 1) * per_core < n_samples);
            }
        }
    }
}
