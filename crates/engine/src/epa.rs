//! Ewens-Pitman attraction partition distribution

use crate::clustering::Clustering;
use crate::likelihood::Allocation;
use crate::permutation::Permutation;
use crate::similarity::SimilarityMatrix;
use caviar_core::{Error, Result, Validate};
use rand::Rng;

/// Parameters of an EPA prior
///
/// Owns its similarity matrix, so it never borrows host memory past the
/// call that built it.
#[derive(Debug, Clone)]
pub struct EpaParameters {
    similarity: SimilarityMatrix,
    permutation: Permutation,
    mass: f64,
    discount: f64,
}

impl EpaParameters {
    /// Validates `mass > 0`, `0 <= discount < 1` and matching dimensions
    pub fn new(
        similarity: SimilarityMatrix,
        permutation: Permutation,
        mass: f64,
        discount: f64,
    ) -> Result<Self> {
        if similarity.n_items() != permutation.n_items() {
            return Err(Error::dimension(
                "permutation",
                similarity.n_items(),
                permutation.n_items(),
            ));
        }
        Validate::positive(mass, "mass")?;
        Validate::in_range(discount, 0.0, 1.0, "discount")?;
        Ok(Self {
            similarity,
            permutation,
            mass,
            discount,
        })
    }

    pub fn n_items(&self) -> usize {
        self.similarity.n_items()
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    /// The visitation order fixed at construction
    pub fn permutation(&self) -> &Permutation {
        &self.permutation
    }

    pub fn shuffle_permutation<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.permutation.shuffle(rng);
    }
}

/// Draw one partition, visiting items in `permutation` order
///
/// At step `t` the visited item joins a new cluster with weight
/// `mass + discount * q` or an existing cluster `c` with weight
/// `(t - discount * q) * Σ_{j∈c} λ(i, j) / Σ_{s<t} λ(i, σ(s))`, where `q` is
/// the current number of clusters. When the item has zero attraction to
/// everything already placed, existing clusters are weighted by size.
pub fn sample<R: Rng + ?Sized>(
    parameters: &EpaParameters,
    permutation: &Permutation,
    rng: &mut R,
    allocation: &mut Allocation<'_>,
) -> Result<Clustering> {
    let n_items = parameters.n_items();
    Validate::len(permutation.n_items(), n_items, "permutation")?;
    let similarity = &parameters.similarity;
    let mass = parameters.mass;
    let discount = parameters.discount;

    let mut clustering = Clustering::unallocated(n_items);
    let mut subset_log_likelihoods: Vec<f64> = Vec::new();
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut scratch: Vec<usize> = Vec::new();

    for t in 0..n_items {
        let item = permutation.get(t);
        let q = clustering.n_clusters() as f64;
        let total_attraction = similarity.sum_of_row_subset(item, permutation.slice_until(t));
        let existing_mass = t as f64 - discount * q;

        candidates.clear();
        for label in clustering.available_labels() {
            let members = clustering.items_of(label);
            let is_new = members.is_empty();
            let prior_weight = if is_new {
                mass + discount * q
            } else if total_attraction > 0.0 {
                existing_mass * similarity.sum_of_row_subset(item, members) / total_attraction
            } else {
                existing_mass * members.len() as f64 / t as f64
            };

            let mut log_weight = prior_weight.ln();
            let mut subset_value = 0.0;
            match allocation {
                Allocation::Prior => {}
                Allocation::Subset(likelihood) => {
                    scratch.clear();
                    scratch.extend_from_slice(members);
                    scratch.push(item);
                    subset_value = checked(
                        "subset likelihood",
                        likelihood.subset_log_likelihood(&scratch)?,
                    )?;
                    let current = if is_new {
                        0.0
                    } else {
                        subset_log_likelihoods[label]
                    };
                    log_weight += subset_value - current;
                }
                Allocation::Item(likelihood) => {
                    log_weight += checked(
                        "item likelihood",
                        likelihood.item_log_likelihood(item, label, is_new)?,
                    )?;
                }
            }
            candidates.push(Candidate {
                label,
                log_weight,
                subset_value,
            });
        }

        let chosen = select(&candidates, rng)?;
        clustering.allocate(item, chosen.label);
        if let Allocation::Subset(_) = allocation {
            if chosen.label >= subset_log_likelihoods.len() {
                subset_log_likelihoods.resize(chosen.label + 1, 0.0);
            }
            subset_log_likelihoods[chosen.label] = chosen.subset_value;
        }
    }

    Ok(clustering)
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    label: usize,
    log_weight: f64,
    subset_value: f64,
}

fn checked(callback: &str, value: f64) -> Result<f64> {
    if value.is_nan() || value == f64::INFINITY {
        Err(Error::callback(
            callback,
            format!("returned {value}, which is not a usable log-likelihood"),
        ))
    } else {
        Ok(value)
    }
}

/// Pick a candidate with probability proportional to `exp(log_weight)`
fn select<'c, R: Rng + ?Sized>(candidates: &'c [Candidate], rng: &mut R) -> Result<&'c Candidate> {
    let max = candidates
        .iter()
        .map(|c| c.log_weight)
        .fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return Err(Error::invalid_argument(
            "weights",
            "every candidate cluster has zero probability",
        ));
    }
    let weights: Vec<f64> = candidates
        .iter()
        .map(|c| (c.log_weight - max).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    let mut target = rng.gen::<f64>() * total;
    let mut fallback = None;
    for (candidate, weight) in candidates.iter().zip(&weights) {
        if *weight > 0.0 {
            fallback = Some(candidate);
            if target < *weight {
                return Ok(candidate);
            }
            target -= weight;
        }
    }
    // rounding can leave `target` a hair above the last positive weight
    fallback.ok_or_else(|| Error::invalid_argument("weights", "no candidate has positive weight"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likelihood::Likelihood;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn parameters(n_items: usize, mass: f64, discount: f64) -> EpaParameters {
        EpaParameters::new(
            SimilarityMatrix::ones(n_items),
            Permutation::natural(n_items),
            mass,
            discount,
        )
        .unwrap()
    }

    #[test]
    fn test_new_validates_hyperparameters() {
        let similarity = SimilarityMatrix::ones(3);
        let perm = Permutation::natural(3);
        assert!(EpaParameters::new(similarity.clone(), perm.clone(), 0.0, 0.0).is_err());
        assert!(EpaParameters::new(similarity.clone(), perm.clone(), 1.0, 1.0).is_err());
        assert!(EpaParameters::new(similarity.clone(), Permutation::natural(2), 1.0, 0.0).is_err());
        assert!(EpaParameters::new(similarity, perm, 1.0, 0.5).is_ok());
    }

    #[test]
    fn test_sample_allocates_every_item() {
        let params = parameters(10, 1.0, 0.2);
        let mut rng = StdRng::seed_from_u64(11);
        let clustering = sample(&params, params.permutation(), &mut rng, &mut Allocation::Prior).unwrap();
        assert!(clustering.is_complete());
        assert!(clustering.n_clusters() >= 1);
    }

    #[test]
    fn test_tiny_mass_gives_one_cluster() {
        let params = parameters(8, 1e-12, 0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let clustering = sample(&params, params.permutation(), &mut rng, &mut Allocation::Prior).unwrap();
        assert_eq!(clustering.labels(), vec![0; 8]);
    }

    /// Item 1 must open its own cluster and item 2 must join an existing one
    struct SteerThirdItem;

    impl Likelihood for SteerThirdItem {
        fn subset_log_likelihood(&mut self, _items: &[usize]) -> Result<f64> {
            Ok(0.0)
        }

        fn item_log_likelihood(&mut self, item: usize, _label: usize, is_new: bool) -> Result<f64> {
            Ok(match (item, is_new) {
                (1, false) | (2, true) => f64::NEG_INFINITY,
                _ => 0.0,
            })
        }
    }

    #[test]
    fn test_attraction_steers_allocation() {
        // item 2 is attracted 100:1 towards item 0 over item 1
        let mut data = vec![1.0; 9];
        data[2] = 100.0; // (2, 0)
        data[5] = 1.0; // (2, 1)
        let params = EpaParameters::new(
            SimilarityMatrix::from_slice(&data, 3).unwrap(),
            Permutation::natural(3),
            1.0,
            0.0,
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut hook = SteerThirdItem;
        let mut with_item_zero = 0;
        for _ in 0..200 {
            let labels = sample(
                &params,
                params.permutation(),
                &mut rng,
                &mut Allocation::Item(&mut hook),
            )
            .unwrap()
            .labels();
            assert_ne!(labels[0], labels[1]);
            if labels[2] == labels[0] {
                with_item_zero += 1;
            }
        }
        assert!(with_item_zero > 180, "joined item 0 {with_item_zero} times");
    }

    struct ForceSingletons;

    impl Likelihood for ForceSingletons {
        fn subset_log_likelihood(&mut self, items: &[usize]) -> Result<f64> {
            Ok(if items.len() == 1 { 0.0 } else { f64::NEG_INFINITY })
        }

        fn item_log_likelihood(&mut self, _item: usize, _label: usize, is_new: bool) -> Result<f64> {
            Ok(if is_new { 0.0 } else { f64::NEG_INFINITY })
        }
    }

    #[test]
    fn test_likelihood_can_force_singletons() {
        let params = parameters(6, 1.0, 0.0);
        let mut rng = StdRng::seed_from_u64(9);
        let mut hook = ForceSingletons;
        let clustering = sample(
            &params,
            params.permutation(),
            &mut rng,
            &mut Allocation::Subset(&mut hook),
        )
        .unwrap();
        assert_eq!(clustering.n_clusters(), 6);

        let mut hook = ForceSingletons;
        let clustering = sample(
            &params,
            params.permutation(),
            &mut rng,
            &mut Allocation::Item(&mut hook),
        )
        .unwrap();
        assert_eq!(clustering.n_clusters(), 6);
    }

    struct NanLikelihood;

    impl Likelihood for NanLikelihood {
        fn subset_log_likelihood(&mut self, _items: &[usize]) -> Result<f64> {
            Ok(f64::NAN)
        }

        fn item_log_likelihood(&mut self, _item: usize, _label: usize, _is_new: bool) -> Result<f64> {
            Ok(f64::NAN)
        }
    }

    #[test]
    fn test_nan_log_likelihood_is_callback_error() {
        let params = parameters(3, 1.0, 0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut hook = NanLikelihood;
        let result = sample(
            &params,
            params.permutation(),
            &mut rng,
            &mut Allocation::Item(&mut hook),
        );
        assert!(matches!(result, Err(Error::Callback { .. })));
    }
}
