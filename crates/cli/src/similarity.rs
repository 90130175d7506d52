//! Similarity matrices read from JSON

use caviar_core::{Error, Result};
use std::path::Path;

/// A square similarity matrix stored column-major
#[derive(Debug, Clone, PartialEq)]
pub struct Similarity {
    n_items: usize,
    data: Vec<f64>,
}

impl Similarity {
    /// Build from rows; every row must be as long as there are rows
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_items = rows.len();
        let mut data = vec![0.0; n_items * n_items];
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_items {
                return Err(Error::dimension(format!("similarity row {i}"), n_items, row.len()));
            }
            for (j, value) in row.iter().enumerate() {
                data[n_items * j + i] = *value;
            }
        }
        Ok(Self { n_items, data })
    }

    pub fn n_items(&self) -> usize {
        self.n_items
    }

    pub fn column_major(&self) -> &[f64] {
        &self.data
    }
}

/// Read a JSON array of rows, e.g. `[[1.0, 0.5], [0.5, 1.0]]`
pub fn read_similarity(path: &Path) -> Result<Similarity> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| Error::file_system(path, "read", e))?;
    let rows: Vec<Vec<f64>> = serde_json::from_str(&contents).map_err(|e| Error::Json {
        message: format!("invalid similarity matrix '{}'", path.display()),
        source: e,
    })?;
    Similarity::from_rows(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_become_column_major() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let similarity = Similarity::from_rows(&rows).unwrap();
        // entry (i, j) at n * j + i
        assert_eq!(similarity.column_major(), &[1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(
            Similarity::from_rows(&rows),
            Err(Error::Dimension { .. })
        ));
    }
}
