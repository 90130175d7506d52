//! Pairwise attraction weights

use caviar_core::{Error, Result, Validate};

/// An engine-owned `n_items × n_items` matrix of attraction weights
///
/// Storage is column-major: entry `(i, j)` lives at `n_items * j + i`.
/// Symmetry is expected but not enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    data: Vec<f64>,
    n_items: usize,
}

impl SimilarityMatrix {
    /// Copy a caller-owned column-major matrix into engine storage
    pub fn from_slice(data: &[f64], n_items: usize) -> Result<Self> {
        let expected = n_items
            .checked_mul(n_items)
            .ok_or_else(|| Error::invalid_argument("n_items", "matrix size overflows"))?;
        Validate::len(data.len(), expected, "similarity matrix")?;
        if let Some((index, value)) = data
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(Error::invalid_argument(
                "similarity",
                format!(
                    "entry ({}, {}) is {value}; weights must be finite and non-negative",
                    index % n_items,
                    index / n_items
                ),
            ));
        }
        Ok(Self {
            data: data.to_vec(),
            n_items,
        })
    }

    /// Every pair equally attracted
    pub fn ones(n_items: usize) -> Self {
        Self {
            data: vec![1.0; n_items * n_items],
            n_items,
        }
    }

    pub fn n_items(&self) -> usize {
        self.n_items
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.n_items * j + i]
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Sum of `(row, j)` over the given columns
    pub fn sum_of_row_subset(&self, row: usize, columns: &[usize]) -> f64 {
        columns.iter().map(|&j| self.get(row, j)).sum()
    }
}
