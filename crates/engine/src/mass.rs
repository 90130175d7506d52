//! Relating the mass parameter to the expected number of clusters

use caviar_core::{Error, Result, Validate};

/// Expected number of clusters among `n_items` under the EPA prior
///
/// Attraction weights only redistribute probability among existing
/// clusters, so the count depends on `mass` and `discount` alone:
/// `E[K_{t+1}] = E[K_t] + (mass + discount * E[K_t]) / (mass + t)`.
pub fn expected_number_of_clusters(mass: f64, discount: f64, n_items: usize) -> Result<f64> {
    Validate::positive(mass, "mass")?;
    Validate::in_range(discount, 0.0, 1.0, "discount")?;
    Ok((0..n_items).fold(0.0, |expected, t| {
        expected + (mass + discount * expected) / (mass + t as f64)
    }))
}

const MAX_ITERATIONS: usize = 200;
const TOLERANCE: f64 = 1e-10;

/// The mass giving `expected` clusters among `n_items`, found by bisection
pub fn find_mass(expected: f64, discount: f64, n_items: usize) -> Result<f64> {
    Validate::in_range(discount, 0.0, 1.0, "discount")?;
    let n = n_items as f64;
    if !(expected > 1.0 && expected < n) {
        return Err(Error::invalid_argument(
            "expected_number_of_clusters",
            format!("{expected} must lie strictly between 1 and {n_items}"),
        ));
    }
    let f = |mass: f64| expected_number_of_clusters(mass, discount, n_items).map(|e| e - expected);

    let mut lower = f64::EPSILON;
    let mut upper = expected.max(1.0);
    let mut doublings = 0;
    while f(upper)? < 0.0 {
        upper *= 2.0;
        doublings += 1;
        if doublings > 64 {
            return Err(Error::invalid_argument(
                "expected_number_of_clusters",
                "no finite mass reaches the requested cluster count",
            ));
        }
    }

    for _ in 0..MAX_ITERATIONS {
        let mid = 0.5 * (lower + upper);
        if f(mid)? < 0.0 {
            lower = mid;
        } else {
            upper = mid;
        }
        if upper - lower <= TOLERANCE * upper {
            break;
        }
    }
    Ok(0.5 * (lower + upper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_single_item_has_one_cluster() {
        assert_eq!(expected_number_of_clusters(3.0, 0.0, 1).unwrap(), 1.0);
    }

    #[test]
    fn test_ewens_closed_form() {
        // without discount the sum is Σ mass / (mass + t)
        let mass = 2.5;
        let direct: f64 = (0..30).map(|t| mass / (mass + t as f64)).sum();
        let recurrence = expected_number_of_clusters(mass, 0.0, 30).unwrap();
        assert!((direct - recurrence).abs() < 1e-12);
    }

    #[test]
    fn test_discount_increases_clusters() {
        let without = expected_number_of_clusters(1.0, 0.0, 50).unwrap();
        let with = expected_number_of_clusters(1.0, 0.5, 50).unwrap();
        assert!(with > without);
    }

    #[rstest]
    #[case(0.5, 0.0, 100)]
    #[case(4.0, 0.0, 100)]
    #[case(1.0, 0.3, 40)]
    #[case(10.0, 0.1, 500)]
    fn test_find_mass_inverts_expectation(
        #[case] mass: f64,
        #[case] discount: f64,
        #[case] n_items: usize,
    ) {
        let expected = expected_number_of_clusters(mass, discount, n_items).unwrap();
        let recovered = find_mass(expected, discount, n_items).unwrap();
        assert!(
            (recovered - mass).abs() / mass < 1e-6,
            "recovered {recovered} for {mass}"
        );
    }

    #[test]
    fn test_find_mass_rejects_unreachable_targets() {
        assert!(find_mass(1.0, 0.0, 10).is_err());
        assert!(find_mass(10.0, 0.0, 10).is_err());
    }
}
