//! Ewens-Pitman attraction (EPA) partition sampling engine
//!
//! This crate is the native side of the caviar bridge. The host never sees
//! its types directly: [`EpaParameters`] travels across the boundary as an
//! opaque handle and draws come back as flat label buffers.
//!
//! - [`epa::sample`] draws one partition by sequential allocation, optionally
//!   consulting a [`Likelihood`] hook per candidate cluster.
//! - [`parallel::sample_many`] spreads closed-form draws over scoped threads.
//! - [`mass`] relates the mass parameter to the expected cluster count.

pub mod clustering;
pub mod epa;
pub mod likelihood;
pub mod mass;
pub mod parallel;
pub mod permutation;
pub mod seed;
pub mod similarity;

pub use clustering::Clustering;
pub use epa::{sample, EpaParameters};
pub use likelihood::{Allocation, Likelihood};
pub use mass::{expected_number_of_clusters, find_mass};
pub use parallel::{sample_many, Draws};
pub use permutation::Permutation;
pub use seed::{rng_from_seed_words, seed_words_from_u64};
pub use similarity::SimilarityMatrix;
