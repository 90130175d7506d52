use crate::similarity::Similarity;
use caviar_core::Result;
use caviar_engine::seed_words_from_u64;
use caviar_ffi_bridge::{
    sample_epa, sample_partitions, FlatBufferView, LocalHost, LocalToken, PriorHandle, PriorKind,
    SampleRequest,
};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub n_samples: usize,
    pub mass: f64,
    pub discount: f64,
    pub n_cores: usize,
    pub seed: u64,
    pub randomize_permutation: bool,
}

/// Draws as printed: one row of one-based labels per sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleOutput {
    pub seed: u64,
    pub n_items: usize,
    pub labels: Vec<Vec<i32>>,
    pub n_clusters: Vec<i32>,
}

pub fn execute(similarity: &Similarity, options: &SampleOptions) -> Result<SampleOutput> {
    let host = LocalHost::new();
    let n_items = similarity.n_items();
    let prior = PriorHandle::construct(
        n_items,
        FlatBufferView::from_slice(similarity.column_major()),
        None,
        true,
        options.mass,
        options.discount,
    )?;
    let seed = seed_words_from_u64(options.seed);
    let seed_view = FlatBufferView::from_slice(&seed);

    let matrix = if options.randomize_permutation {
        let draws = sample_epa(&host, &prior, options.n_samples, options.n_cores, seed_view)?;
        matrix_of(&host, draws.labels)
    } else {
        let request = SampleRequest {
            n_partitions: options.n_samples,
            n_items,
            seed: seed_view,
            randomize_permutation: false,
        };
        let token = sample_partitions(&host, &request, &prior, PriorKind::Epa, None)?;
        let mut matrix = matrix_of(&host, token);
        matrix.iter_mut().flatten().for_each(|label| *label += 1);
        matrix
    };
    if let Err((_, e)) = prior.destroy() {
        return Err(e);
    }

    let n_clusters = matrix
        .iter()
        .map(|row| row.iter().copied().max().unwrap_or(0))
        .collect::<Vec<_>>();
    info!(
        n_samples = options.n_samples,
        n_items,
        seed = options.seed,
        "drew partitions"
    );
    Ok(SampleOutput {
        seed: options.seed,
        n_items,
        labels: matrix,
        n_clusters,
    })
}

fn matrix_of(host: &LocalHost, token: LocalToken) -> Vec<Vec<i32>> {
    host.matrix(token)
        .map(|m| (0..m.nrow()).map(|row| m.row(row)).collect())
        .unwrap_or_default()
}
