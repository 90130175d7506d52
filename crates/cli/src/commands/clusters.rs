use caviar_core::Result;
use caviar_engine::{expected_number_of_clusters, find_mass};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterCount {
    pub mass: f64,
    pub discount: f64,
    pub n_items: usize,
    pub expected_clusters: f64,
}

pub fn expected_clusters(mass: f64, discount: f64, n_items: usize) -> Result<ClusterCount> {
    let expected_clusters = expected_number_of_clusters(mass, discount, n_items)?;
    Ok(ClusterCount {
        mass,
        discount,
        n_items,
        expected_clusters,
    })
}

pub fn mass(expected: f64, discount: f64, n_items: usize) -> Result<ClusterCount> {
    let mass = find_mass(expected, discount, n_items)?;
    tracing::debug!(expected, discount, n_items, mass, "calibrated mass");
    Ok(ClusterCount {
        mass,
        discount,
        n_items,
        expected_clusters: expected_number_of_clusters(mass, discount, n_items)?,
    })
}
