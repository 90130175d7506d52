//! Owned EPA prior parameters behind an opaque pointer

use crate::buffer::FlatBufferView;
use crate::guard::ensure_idle;
use caviar_core::{Error, Result};
use caviar_engine::{EpaParameters, Permutation, SimilarityMatrix};
use tracing::debug;

/// A constructed prior, owned by the native side
///
/// Move-only: [`PriorHandle::destroy`] consumes it, so a destroyed handle
/// cannot be named again from Rust. Across the C ABI it travels as the
/// pointer produced by [`PriorHandle::into_raw`].
#[derive(Debug)]
pub struct PriorHandle {
    parameters: Box<EpaParameters>,
}

impl PriorHandle {
    /// Build a prior from caller-owned storage
    ///
    /// `similarity` must hold `n_items * n_items` entries in column-major
    /// order. With `use_natural_permutation` the `permutation` argument is
    /// ignored entirely, including its length and contents.
    pub fn construct(
        n_items: usize,
        similarity: FlatBufferView<'_, f64>,
        permutation: Option<FlatBufferView<'_, i32>>,
        use_natural_permutation: bool,
        mass: f64,
        discount: f64,
    ) -> Result<Self> {
        ensure_idle("construct")?;
        let n_squared = n_items
            .checked_mul(n_items)
            .ok_or_else(|| Error::invalid_argument("n_items", "n_items squared overflows"))?;
        let similarity = similarity.expect_len(n_squared, "similarity")?;

        let permutation = if use_natural_permutation {
            Permutation::natural(n_items)
        } else {
            let view = permutation
                .ok_or_else(|| {
                    Error::invalid_argument(
                        "permutation",
                        "required unless the natural permutation is requested",
                    )
                })?
                .expect_len(n_items, "permutation")?;
            Permutation::from_vec(view.to_indices(n_items, "permutation")?)?
        };

        let similarity = SimilarityMatrix::from_slice(similarity.as_slice(), n_items)?;
        let parameters = EpaParameters::new(similarity, permutation, mass, discount)?;
        debug!(
            n_items,
            mass, discount, use_natural_permutation, "constructed EPA parameters"
        );
        Ok(Self {
            parameters: Box::new(parameters),
        })
    }

    pub fn parameters(&self) -> &EpaParameters {
        &self.parameters
    }

    pub fn n_items(&self) -> usize {
        self.parameters.n_items()
    }

    /// Free the parameters
    ///
    /// Refused while a sampling call is in flight on this thread; the
    /// handle is then given back untouched.
    pub fn destroy(self) -> std::result::Result<(), (Self, Error)> {
        if let Err(e) = ensure_idle("destroy") {
            return Err((self, e));
        }
        debug!(n_items = self.n_items(), "destroyed EPA parameters");
        drop(self);
        Ok(())
    }

    /// Leak the parameters as an opaque pointer for foreign ownership
    pub fn into_raw(self) -> *mut EpaParameters {
        Box::into_raw(self.parameters)
    }

    /// Reclaim ownership of a pointer made by [`PriorHandle::into_raw`]
    ///
    /// # Safety
    /// `ptr` must come from `into_raw` and must not have been reclaimed
    /// already. Null is reported as [`Error::InvalidHandle`].
    pub unsafe fn from_raw(ptr: *mut EpaParameters, operation: &str) -> Result<Self> {
        if ptr.is_null() {
            return Err(Error::invalid_handle(operation, "null prior handle"));
        }
        // SAFETY: the caller guarantees `ptr` is a live, unclaimed `into_raw` result
        let parameters = unsafe { Box::from_raw(ptr) };
        Ok(Self { parameters })
    }

    /// Borrow the parameters behind a foreign-held pointer
    ///
    /// # Safety
    /// `ptr` must come from `into_raw` and stay live for `'a`.
    pub unsafe fn borrow_raw<'a>(
        ptr: *const EpaParameters,
        operation: &str,
    ) -> Result<&'a EpaParameters> {
        // SAFETY: non-null pointers are live `into_raw` results per the contract
        unsafe { ptr.as_ref() }
            .ok_or_else(|| Error::invalid_handle(operation, "null prior handle"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::SamplingScope;

    fn ones(n: usize) -> Vec<f64> {
        vec![1.0; n * n]
    }

    #[test]
    fn test_construct_with_explicit_permutation() {
        let similarity = ones(3);
        let order = [2, 0, 1];
        let handle = PriorHandle::construct(
            3,
            FlatBufferView::from_slice(&similarity),
            Some(FlatBufferView::from_slice(&order)),
            false,
            1.0,
            0.0,
        )
        .unwrap();
        assert_eq!(handle.parameters().permutation().as_slice(), &[2, 0, 1]);
        handle.destroy().unwrap();
    }

    #[test]
    fn test_natural_flag_ignores_malformed_permutation() {
        let similarity = ones(3);
        let garbage = [7, 7];
        let handle = PriorHandle::construct(
            3,
            FlatBufferView::from_slice(&similarity),
            Some(FlatBufferView::from_slice(&garbage)),
            true,
            1.0,
            0.0,
        )
        .unwrap();
        assert!(handle.parameters().permutation().is_natural());
    }

    #[test]
    fn test_similarity_dimension_mismatch() {
        let similarity = ones(2);
        let result = PriorHandle::construct(
            3,
            FlatBufferView::from_slice(&similarity),
            None,
            true,
            1.0,
            0.0,
        );
        assert!(matches!(
            result,
            Err(Error::Dimension {
                expected: 9,
                actual: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_permutation_rejected() {
        let similarity = ones(2);
        let result = PriorHandle::construct(
            2,
            FlatBufferView::from_slice(&similarity),
            None,
            false,
            1.0,
            0.0,
        );
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_invalid_mass_rejected() {
        let similarity = ones(2);
        let result = PriorHandle::construct(
            2,
            FlatBufferView::from_slice(&similarity),
            None,
            true,
            0.0,
            0.0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_raw_round_trip() {
        let similarity = ones(2);
        let handle =
            PriorHandle::construct(2, FlatBufferView::from_slice(&similarity), None, true, 2.0, 0.1)
                .unwrap();
        let raw = handle.into_raw();
        let borrowed = unsafe { PriorHandle::borrow_raw(raw, "sample") }.unwrap();
        assert_eq!(borrowed.mass(), 2.0);
        let reclaimed = unsafe { PriorHandle::from_raw(raw, "free") }.unwrap();
        reclaimed.destroy().unwrap();
        assert!(unsafe { PriorHandle::from_raw(std::ptr::null_mut(), "free") }.is_err());
    }

    #[test]
    fn test_destroy_refused_while_sampling() {
        let similarity = ones(2);
        let handle =
            PriorHandle::construct(2, FlatBufferView::from_slice(&similarity), None, true, 1.0, 0.0)
                .unwrap();
        let scope = SamplingScope::enter();
        let (handle, error) = handle.destroy().unwrap_err();
        assert!(matches!(error, Error::Reentrancy { .. }));
        assert!(PriorHandle::construct(
            2,
            FlatBufferView::from_slice(&similarity),
            None,
            true,
            1.0,
            0.0
        )
        .is_err());
        drop(scope);
        handle.destroy().unwrap();
    }
}
