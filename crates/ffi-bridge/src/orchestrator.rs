//! The sampling entry point composing views, handles and callbacks
//!
//! Output layout: an `n_partitions × n_items` column-major integer matrix,
//! so the label of item `i` in sample `j` sits at `i * n_partitions + j`.
//! All samples for item 0 are written before item 1. Labels are
//! canonicalised to `0..k` by first appearance in item order.

use crate::buffer::FlatBufferView;
use crate::guard::SamplingScope;
use crate::handle::PriorHandle;
use crate::managed::{HostAllocator, ManagedVector};
use caviar_core::{Error, Result, Validate, SEED_WORDS};
use caviar_engine::{rng_from_seed_words, sample, sample_many, Allocation, EpaParameters, Likelihood};
use caviar_utils::tracing::sampling_span;
use tracing::{debug, info};

/// Which prior a sampling call draws from
///
/// The discriminants are the values the host passes across the C ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum PriorKind {
    /// Closed-form EPA prior
    Epa = 0,
    /// EPA weights tilted by host subset log-likelihoods
    EpaSubsetLikelihood = 1,
    /// EPA weights tilted by host item log-likelihoods
    EpaItemLikelihood = 2,
}

impl PriorKind {
    pub const fn requires_likelihood(self) -> bool {
        !matches!(self, PriorKind::Epa)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PriorKind::Epa => "epa",
            PriorKind::EpaSubsetLikelihood => "epa_subset_likelihood",
            PriorKind::EpaItemLikelihood => "epa_item_likelihood",
        }
    }
}

impl TryFrom<i32> for PriorKind {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(PriorKind::Epa),
            1 => Ok(PriorKind::EpaSubsetLikelihood),
            2 => Ok(PriorKind::EpaItemLikelihood),
            other => Err(Error::invalid_argument(
                "prior_kind",
                format!("unknown prior discriminator {other}"),
            )),
        }
    }
}

impl std::fmt::Display for PriorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape and stream of one sampling call
#[derive(Debug, Clone, Copy)]
pub struct SampleRequest<'a> {
    pub n_partitions: usize,
    pub n_items: usize,
    pub seed: FlatBufferView<'a, i32>,
    pub randomize_permutation: bool,
}

impl SampleRequest<'_> {
    /// Checked before any output is allocated
    pub fn validate(&self, prior: &EpaParameters) -> Result<()> {
        Validate::len(self.n_items, prior.n_items(), "n_items")?;
        Validate::len(self.seed.len(), SEED_WORDS, "seed")?;
        self.n_partitions
            .checked_mul(self.n_items)
            .ok_or_else(|| Error::invalid_argument("n_partitions", "label matrix size overflows"))?;
        Ok(())
    }

    pub fn output_len(&self) -> usize {
        self.n_partitions * self.n_items
    }
}

fn allocation_for<'l>(
    kind: PriorKind,
    likelihood: Option<&'l mut dyn Likelihood>,
) -> Result<Allocation<'l>> {
    match (kind, likelihood) {
        (PriorKind::Epa, _) => Ok(Allocation::Prior),
        (PriorKind::EpaSubsetLikelihood, Some(l)) => Ok(Allocation::Subset(l)),
        (PriorKind::EpaItemLikelihood, Some(l)) => Ok(Allocation::Item(l)),
        (kind, None) => Err(Error::invalid_argument(
            "likelihood",
            format!("prior kind {kind} needs host likelihood callbacks"),
        )),
    }
}

/// Fill caller-provided storage with `n_partitions` draws
///
/// `labels` must hold exactly `n_partitions * n_items` elements. On error
/// its contents are unspecified and must be discarded.
pub fn sample_into(
    labels: &mut [i32],
    request: &SampleRequest<'_>,
    prior: &EpaParameters,
    kind: PriorKind,
    likelihood: Option<&mut dyn Likelihood>,
) -> Result<()> {
    request.validate(prior)?;
    Validate::len(labels.len(), request.output_len(), "labels")?;
    let mut allocation = allocation_for(kind, likelihood)?;

    let span = sampling_span(request.n_partitions, request.n_items, kind.as_str());
    let _entered = span.enter();
    let _scope = SamplingScope::enter();

    let mut rng = rng_from_seed_words(request.seed.as_slice())?;
    let mut permutation = prior.permutation().clone();
    let mut row = vec![0i32; request.n_items];
    let mut total_clusters = 0usize;

    for j in 0..request.n_partitions {
        if request.randomize_permutation {
            permutation.shuffle(&mut rng);
        }
        let clustering = sample(prior, &permutation, &mut rng, &mut allocation)?;
        clustering.relabel_into_slice(0, &mut row);
        for (i, label) in row.iter().enumerate() {
            labels[i * request.n_partitions + j] = *label;
        }
        total_clusters += clustering.n_clusters();
    }

    info!(
        n_partitions = request.n_partitions,
        n_items = request.n_items,
        prior_kind = %kind,
        mean_clusters = total_clusters as f64 / request.n_partitions.max(1) as f64,
        "sampling call finished"
    );
    Ok(())
}

/// Draw partitions into a freshly allocated host matrix
///
/// Everything is validated before the host is asked for memory. The output
/// is pinned only while the engine writes to it and is returned solely on
/// success; any failure leaves the prior handle usable.
pub fn sample_partitions<H: HostAllocator>(
    host: &H,
    request: &SampleRequest<'_>,
    prior: &PriorHandle,
    kind: PriorKind,
    likelihood: Option<&mut dyn Likelihood>,
) -> Result<H::Token> {
    request.validate(prior.parameters())?;
    let mut output = ManagedVector::allocate_matrix(host, request.n_partitions, request.n_items)?;
    if request.n_partitions == 0 {
        debug!(n_items = request.n_items, "no partitions requested");
        return Ok(output.release());
    }
    sample_into(output.as_mut_slice(), request, prior.parameters(), kind, likelihood)?;
    Ok(output.release())
}

/// Multi-core draws from the closed-form prior
#[derive(Debug)]
pub struct EpaDraws<T> {
    /// `n_samples × n_items` column-major matrix of one-based labels
    pub labels: T,
    /// Number of clusters in each sample
    pub n_clusters: Vec<i32>,
}

/// Draw `n_samples` partitions over `n_cores` threads, shuffling the
/// visitation order for every sample
///
/// Labels are one-based for consumers that index from one.
pub fn sample_epa<H: HostAllocator>(
    host: &H,
    prior: &PriorHandle,
    n_samples: usize,
    n_cores: usize,
    seed: FlatBufferView<'_, i32>,
) -> Result<EpaDraws<H::Token>> {
    let n_items = prior.n_items();
    let mut rng = rng_from_seed_words(seed.expect_len(SEED_WORDS, "seed")?.as_slice())?;
    n_samples
        .checked_mul(n_items)
        .ok_or_else(|| Error::invalid_argument("n_samples", "label matrix size overflows"))?;

    let draws = {
        let _scope = SamplingScope::enter();
        sample_many(prior.parameters(), n_samples, n_cores, true, &mut rng)?
    };

    let mut output = ManagedVector::allocate_matrix(host, n_samples, n_items)?;
    let labels = output.as_mut_slice();
    for s in 0..n_samples {
        for (i, label) in draws.sample(s).iter().enumerate() {
            labels[i * n_samples + s] = label + 1;
        }
    }
    Ok(EpaDraws {
        labels: output.release(),
        n_clusters: draws.n_clusters,
    })
}
