//! Host-owned output buffers pinned for the duration of native access

use caviar_core::{Error, Result};
use std::mem::ManuallyDrop;
use std::ptr::NonNull;

/// The host runtime's allocator as seen by the bridge
///
/// Implementations hand out storage already pinned against collection
/// and relocation. The returned pointer must stay valid and unmoved until
/// [`HostAllocator::unpin`] is called with the matching token.
pub trait HostAllocator {
    /// Opaque host-side storage handle
    type Token;

    /// Allocate and pin an `nrow × ncol` integer matrix in the host's
    /// column-major layout
    fn allocate_integer_matrix(&self, nrow: usize, ncol: usize) -> Result<(Self::Token, *mut i32)>;

    /// Return the storage to normal host ownership
    fn unpin(&self, token: &Self::Token);
}

/// RAII guard over one pinned host buffer
///
/// The buffer is unpinned exactly once: by [`ManagedVector::release`] on
/// success, or on drop when an error or panic abandons it.
pub struct ManagedVector<'h, H: HostAllocator> {
    host: &'h H,
    token: H::Token,
    data: NonNull<i32>,
    nrow: usize,
    ncol: usize,
}

impl<'h, H: HostAllocator> ManagedVector<'h, H> {
    /// Allocate and pin an `nrow × ncol` matrix
    pub fn allocate_matrix(host: &'h H, nrow: usize, ncol: usize) -> Result<Self> {
        let len = nrow
            .checked_mul(ncol)
            .ok_or_else(|| Error::allocation("label matrix", "element count overflows"))?;
        let (token, ptr) = host.allocate_integer_matrix(nrow, ncol)?;
        let data = match NonNull::new(ptr) {
            Some(data) => data,
            None if len == 0 => NonNull::dangling(),
            None => {
                host.unpin(&token);
                return Err(Error::allocation(
                    "label matrix",
                    format!("host returned a null pointer for {len} elements"),
                ));
            }
        };
        tracing::debug!(nrow, ncol, "pinned host output buffer");
        Ok(Self {
            host,
            token,
            data,
            nrow,
            ncol,
        })
    }

    pub fn len(&self) -> usize {
        self.nrow * self.ncol
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.nrow, self.ncol)
    }

    /// Stable for as long as the guard lives
    pub fn as_mut_ptr(&mut self) -> *mut i32 {
        self.data.as_ptr()
    }

    pub fn as_slice(&self) -> &[i32] {
        // SAFETY: pinned by the host until `unpin`, which only runs once the guard is gone
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        // SAFETY: as for `as_slice`; `&mut self` makes the borrow exclusive
        unsafe { std::slice::from_raw_parts_mut(self.data.as_ptr(), self.len()) }
    }

    /// Unpin and hand the filled buffer back to the host
    pub fn release(self) -> H::Token {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the token is moved out exactly once
        let token = unsafe { std::ptr::read(&this.token) };
        this.host.unpin(&token);
        token
    }
}

impl<H: HostAllocator> Drop for ManagedVector<'_, H> {
    fn drop(&mut self) {
        tracing::debug!(
            nrow = self.nrow,
            ncol = self.ncol,
            "unpinning abandoned output buffer"
        );
        self.host.unpin(&self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LocalHost;

    #[test]
    fn test_release_unpins_once() {
        let host = LocalHost::new();
        let mut vector = ManagedVector::allocate_matrix(&host, 2, 3).unwrap();
        assert_eq!(host.pinned_count(), 1);
        vector.as_mut_slice().copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        let token = vector.release();
        assert_eq!(host.pinned_count(), 0);
        assert_eq!(host.matrix(token).unwrap().data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_drop_unpins_on_error_path() {
        let host = LocalHost::new();
        let outcome: Result<()> = (|| {
            let _vector = ManagedVector::allocate_matrix(&host, 4, 4)?;
            Err(Error::callback("item likelihood", "boom"))
        })();
        assert!(outcome.is_err());
        assert_eq!(host.pinned_count(), 0);
    }

    #[test]
    fn test_pointer_is_stable_while_pinned() {
        let host = LocalHost::new();
        let mut vector = ManagedVector::allocate_matrix(&host, 3, 3).unwrap();
        let before = vector.as_mut_ptr();
        let _other = ManagedVector::allocate_matrix(&host, 100, 100).unwrap();
        assert_eq!(vector.as_mut_ptr(), before);
    }

    #[test]
    fn test_allocation_failure_propagates() {
        let host = LocalHost::with_allocation_limit(10);
        let result = ManagedVector::allocate_matrix(&host, 4, 4);
        assert!(matches!(result, Err(Error::Allocation { .. })));
        assert_eq!(host.pinned_count(), 0);
    }

    #[test]
    fn test_empty_matrix() {
        let host = LocalHost::new();
        let vector = ManagedVector::allocate_matrix(&host, 0, 5).unwrap();
        assert!(vector.is_empty());
        assert_eq!(vector.dims(), (0, 5));
        let token = vector.release();
        assert_eq!(host.matrix(token).unwrap().nrow(), 0);
    }
}
