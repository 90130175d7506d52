//! An in-process host runtime
//!
//! Stands in for the statistical environment's managed heap when the
//! bridge is driven from Rust: the CLI and the test-suite use it. It keeps
//! a pin count so that unbalanced pin/unpin pairs are observable.

use crate::managed::HostAllocator;
use caviar_core::{Error, Result};
use std::cell::{Cell, RefCell};

/// Storage handle for a [`LocalHost`] vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalToken(usize);

/// A column-major integer matrix owned by a [`LocalHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMatrix {
    data: Box<[i32]>,
    nrow: usize,
    ncol: usize,
}

impl LocalMatrix {
    pub fn nrow(&self) -> usize {
        self.nrow
    }

    pub fn ncol(&self) -> usize {
        self.ncol
    }

    pub fn data(&self) -> &[i32] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.data[col * self.nrow + row]
    }

    /// One row gathered across columns
    pub fn row(&self, row: usize) -> Vec<i32> {
        (0..self.ncol).map(|col| self.get(row, col)).collect()
    }
}

#[derive(Debug)]
struct Slot {
    matrix: LocalMatrix,
    pinned: bool,
}

/// A [`HostAllocator`] over boxed slices
///
/// Boxed storage never moves when the slot table grows, which is what makes
/// the handed-out pointers stable.
#[derive(Debug, Default)]
pub struct LocalHost {
    slots: RefCell<Vec<Slot>>,
    pinned: Cell<usize>,
    allocation_limit: Option<usize>,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that fails any single allocation above `max_elements`
    pub fn with_allocation_limit(max_elements: usize) -> Self {
        Self {
            allocation_limit: Some(max_elements),
            ..Self::default()
        }
    }

    /// Buffers currently pinned
    pub fn pinned_count(&self) -> usize {
        self.pinned.get()
    }

    /// Buffers ever allocated
    pub fn allocation_count(&self) -> usize {
        self.slots.borrow().len()
    }

    /// A copy of an unpinned matrix
    pub fn matrix(&self, token: LocalToken) -> Option<LocalMatrix> {
        let slots = self.slots.borrow();
        let slot = slots.get(token.0)?;
        (!slot.pinned).then(|| slot.matrix.clone())
    }
}

impl HostAllocator for LocalHost {
    type Token = LocalToken;

    fn allocate_integer_matrix(&self, nrow: usize, ncol: usize) -> Result<(LocalToken, *mut i32)> {
        let len = nrow
            .checked_mul(ncol)
            .ok_or_else(|| Error::allocation("integer matrix", "element count overflows"))?;
        if let Some(limit) = self.allocation_limit {
            if len > limit {
                return Err(Error::allocation(
                    "integer matrix",
                    format!("cannot allocate vector of {len} elements (limit {limit})"),
                ));
            }
        }
        let mut data = vec![0i32; len].into_boxed_slice();
        let ptr = data.as_mut_ptr();
        let mut slots = self.slots.borrow_mut();
        slots.push(Slot {
            matrix: LocalMatrix { data, nrow, ncol },
            pinned: true,
        });
        self.pinned.set(self.pinned.get() + 1);
        Ok((LocalToken(slots.len() - 1), ptr))
    }

    fn unpin(&self, token: &LocalToken) {
        let mut slots = self.slots.borrow_mut();
        let slot = &mut slots[token.0];
        assert!(slot.pinned, "buffer {} unpinned twice", token.0);
        slot.pinned = false;
        self.pinned.set(self.pinned.get() - 1);
    }
}
