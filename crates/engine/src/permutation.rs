//! Item visitation orders

use caviar_core::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// An ordering of the items `0..n_items`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation(Vec<usize>);

impl Permutation {
    /// The identity ordering `[0, 1, ..., n_items - 1]`
    pub fn natural(n_items: usize) -> Self {
        Self((0..n_items).collect())
    }

    /// Build from an explicit ordering, which must visit every item exactly once
    pub fn from_vec(order: Vec<usize>) -> Result<Self> {
        let n_items = order.len();
        let mut seen = vec![false; n_items];
        for &item in &order {
            if item >= n_items {
                return Err(Error::invalid_argument(
                    "permutation",
                    format!("item {item} is out of range for {n_items} items"),
                ));
            }
            if std::mem::replace(&mut seen[item], true) {
                return Err(Error::invalid_argument(
                    "permutation",
                    format!("item {item} appears more than once"),
                ));
            }
        }
        Ok(Self(order))
    }

    pub fn n_items(&self) -> usize {
        self.0.len()
    }

    /// The item visited at step `t`
    pub fn get(&self, t: usize) -> usize {
        self.0[t]
    }

    /// Items visited before step `t`
    pub fn slice_until(&self, t: usize) -> &[usize] {
        &self.0[..t]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn is_natural(&self) -> bool {
        self.0.iter().enumerate().all(|(i, &item)| i == item)
    }

    /// Replace the ordering with a uniformly random one
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.0.shuffle(rng);
    }
}
