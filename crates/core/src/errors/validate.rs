//! Argument validation shared by the engine and the bridge

use super::types::{Error, Result};
use std::fmt;

/// Validation helpers returning `Error::InvalidArgument`
pub struct Validate;

impl Validate {
    /// Validate that a float is finite
    pub fn finite(value: f64, name: &str) -> Result<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Error::invalid_argument(
                name,
                format!("value {value} is not finite"),
            ))
        }
    }

    /// Validate that a float is finite and strictly positive
    pub fn positive(value: f64, name: &str) -> Result<f64> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(Error::invalid_argument(
                name,
                format!("value {value} must be finite and greater than zero"),
            ))
        }
    }

    /// Validate that a number lies in the half-open range `[min, max)`
    pub fn in_range<T>(value: T, min: T, max: T, name: &str) -> Result<T>
    where
        T: PartialOrd + fmt::Display + Copy,
    {
        if value >= min && value < max {
            Ok(value)
        } else {
            Err(Error::invalid_argument(
                name,
                format!("value {value} is not in range [{min}, {max})"),
            ))
        }
    }

    /// Convert a host-side signed count into a `usize`, rejecting negatives
    pub fn count(value: i32, name: &str) -> Result<usize> {
        usize::try_from(value).map_err(|_| {
            Error::invalid_argument(name, format!("count {value} must not be negative"))
        })
    }

    /// Validate that `actual` elements were supplied for `what`
    pub fn len(actual: usize, expected: usize, what: &str) -> Result<()> {
        if actual == expected {
            Ok(())
        } else {
            Err(Error::dimension(what, expected, actual))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(Validate::positive(1.5, "mass").is_ok());
        assert!(Validate::positive(0.0, "mass").is_err());
        assert!(Validate::positive(f64::NAN, "mass").is_err());
        assert!(Validate::positive(f64::INFINITY, "mass").is_err());
    }

    #[test]
    fn test_validate_in_range_is_half_open() {
        assert!(Validate::in_range(0.0, 0.0, 1.0, "discount").is_ok());
        assert!(Validate::in_range(0.99, 0.0, 1.0, "discount").is_ok());
        assert!(Validate::in_range(1.0, 0.0, 1.0, "discount").is_err());
        assert!(Validate::in_range(-0.1, 0.0, 1.0, "discount").is_err());
    }

    #[test]
    fn test_validate_count() {
        assert_eq!(Validate::count(7, "n_items").unwrap(), 7);
        assert!(matches!(
            Validate::count(-1, "n_items"),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_validate_len() {
        assert!(Validate::len(9, 9, "similarity").is_ok());
        assert!(matches!(
            Validate::len(8, 9, "similarity"),
            Err(Error::Dimension {
                expected: 9,
                actual: 8,
                ..
            })
        ));
    }
}
