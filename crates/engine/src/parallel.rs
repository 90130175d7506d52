//! Multi-core driver for closed-form EPA sampling

use crate::epa::{sample, EpaParameters};
use crate::likelihood::Allocation;
use crate::seed::{rng_from_seed_words, split_seed};
use caviar_core::{Error, Result};
use caviar_utils::parallelism::{plan_chunks, resolve_n_cores};
use rand::Rng;
use tracing::debug;

/// Partition draws stored sample-major: sample `s`, item `i` at `s * n_items + i`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draws {
    pub n_samples: usize,
    pub n_items: usize,
    /// Canonical zero-based labels
    pub labels: Vec<i32>,
    /// Number of clusters in each sample
    pub n_clusters: Vec<i32>,
}

impl Draws {
    pub fn sample(&self, s: usize) -> &[i32] {
        &self.labels[s * self.n_items..(s + 1) * self.n_items]
    }
}

/// Draw `n_samples` partitions from the EPA prior on `n_cores` scoped threads
///
/// Each worker gets its own RNG seeded from `rng`, so the output is a
/// deterministic function of the incoming stream and the core count. Host
/// callbacks cannot run on worker threads, so only the closed-form prior
/// is supported here.
pub fn sample_many<R: Rng + ?Sized>(
    parameters: &EpaParameters,
    n_samples: usize,
    n_cores: usize,
    randomize_permutation: bool,
    rng: &mut R,
) -> Result<Draws> {
    let n_items = parameters.n_items();
    if n_samples == 0 || n_items == 0 {
        return Ok(Draws {
            n_samples,
            n_items,
            labels: vec![0; n_samples * n_items],
            n_clusters: vec![0; n_samples],
        });
    }

    let (n_cores, per_core) = plan_chunks(n_samples, resolve_n_cores(n_cores));
    debug!(n_samples, n_items, n_cores, per_core, "planned sampling chunks");

    let mut labels = vec![0i32; n_cores * per_core * n_items];
    let mut n_clusters = vec![0i32; n_cores * per_core];
    let seeds: Vec<_> = (0..n_cores).map(|_| split_seed(rng)).collect();

    let outcome = crossbeam::scope(|scope| {
        let handles: Vec<_> = labels
            .chunks_mut(per_core * n_items)
            .zip(n_clusters.chunks_mut(per_core))
            .zip(&seeds)
            .map(|((labels, counts), seed)| {
                scope.spawn(move |_| -> Result<()> {
                    let mut rng = rng_from_seed_words(seed)?;
                    let mut permutation = parameters.permutation().clone();
                    for (slot, count) in labels.chunks_mut(n_items).zip(counts.iter_mut()) {
                        if randomize_permutation {
                            permutation.shuffle(&mut rng);
                        }
                        let clustering =
                            sample(parameters, &permutation, &mut rng, &mut Allocation::Prior)?;
                        clustering.relabel_into_slice(0, slot);
                        *count = i32::try_from(clustering.n_clusters())?;
                    }
                    Ok(())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(Error::ffi("sample_many", "sampling worker panicked")))
            })
            .collect::<Result<Vec<()>>>()
    });
    outcome.map_err(|_| Error::ffi("sample_many", "sampling scope panicked"))??;

    labels.truncate(n_samples * n_items);
    n_clusters.truncate(n_samples);
    Ok(Draws {
        n_samples,
        n_items,
        labels,
        n_clusters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutation::Permutation;
    use crate::similarity::SimilarityMatrix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn parameters(n_items: usize) -> EpaParameters {
        EpaParameters::new(
            SimilarityMatrix::ones(n_items),
            Permutation::natural(n_items),
            1.0,
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn test_shape_and_truncation() {
        let params = parameters(5);
        let mut rng = StdRng::seed_from_u64(1);
        let draws = sample_many(&params, 7, 3, true, &mut rng).unwrap();
        assert_eq!(draws.labels.len(), 35);
        assert_eq!(draws.n_clusters.len(), 7);
        for s in 0..7 {
            let max = *draws.sample(s).iter().max().unwrap();
            assert_eq!(max + 1, draws.n_clusters[s]);
        }
    }

    #[test]
    fn test_deterministic_for_seed_and_cores() {
        let params = parameters(6);
        let a = sample_many(&params, 10, 2, true, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = sample_many(&params, 10, 2, true, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_samples() {
        let params = parameters(4);
        let draws = sample_many(&params, 0, 2, false, &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(draws.labels.is_empty());
    }
}
