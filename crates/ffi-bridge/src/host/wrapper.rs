//! Host entry points over the C ABI
//!
//! Each wrapper coerces host values into the flat shapes the ABI expects,
//! rejects bad handles and dimensions before crossing, and turns a failing
//! status back into the recorded [`Error`].

use super::external_ptr::ExternalPtr;
use crate::abi::{self, CAVIAR_OK};
use crate::callback::CallbackTable;
use crate::managed::{HostAllocator, ManagedVector};
use caviar_core::{Error, Result, Validate, EPA_PARAMETERS_TAG, SEED_WORDS};
use caviar_engine::EpaParameters;
use libc::{c_int, c_void};

/// Host callbacks and the context they evaluate against
#[derive(Debug, Clone, Copy)]
pub struct HostCallbacks<'a> {
    pub table: &'a CallbackTable,
    pub context: *const c_void,
}

fn failure(operation: &str, status: c_int) -> Error {
    abi::take_last_error()
        .unwrap_or_else(|| Error::ffi(operation, format!("failed with status {status}")))
}

fn to_c_int(value: usize, name: &str) -> Result<c_int> {
    c_int::try_from(value)
        .map_err(|_| Error::invalid_argument(name, format!("{value} does not fit a C int")))
}

/// Construct a prior from an `n_items × n_items` column-major similarity
/// matrix
///
/// `permutation` is only read when `use_natural_permutation` is false.
pub fn new_epa_parameters(
    similarity: &[f64],
    n_items: usize,
    permutation: &[i32],
    use_natural_permutation: bool,
    mass: f64,
    discount: f64,
) -> Result<ExternalPtr> {
    let n_squared = n_items
        .checked_mul(n_items)
        .ok_or_else(|| Error::invalid_argument("n_items", "n_items squared overflows"))?;
    Validate::len(similarity.len(), n_squared, "similarity")?;
    if !use_natural_permutation {
        Validate::len(permutation.len(), n_items, "permutation")?;
    }
    let n_items = to_c_int(n_items, "n_items")?;

    // SAFETY: lengths were checked above
    let raw = unsafe {
        abi::caviar__epaparameters_new(
            n_items,
            similarity.as_ptr(),
            permutation.as_ptr(),
            c_int::from(use_natural_permutation),
            mass,
            discount,
        )
    };
    if raw.is_null() {
        return Err(failure("new_epa_parameters", abi::CAVIAR_ERR_OTHER));
    }
    Ok(ExternalPtr::new(raw.cast(), EPA_PARAMETERS_TAG))
}

/// Free a prior and clear the host reference
///
/// A second call on the same reference fails here without reaching native
/// code. The reference is only cleared once the native side accepted the
/// free.
pub fn free_epa_parameters(prior: &ExternalPtr) -> Result<()> {
    let addr = prior.checked(EPA_PARAMETERS_TAG, "free_epa_parameters")?;
    // SAFETY: the tag matched and the pointer has not been cleared
    let status = unsafe { abi::caviar__epaparameters_free(addr.cast::<EpaParameters>()) };
    if status != CAVIAR_OK {
        return Err(failure("free_epa_parameters", status));
    }
    prior.clear();
    Ok(())
}

/// Draw `n_samples` partitions from the closed-form prior
///
/// Returns an `n_samples × n_items` column-major label matrix.
pub fn sample_partition<H: HostAllocator>(
    host: &H,
    n_samples: i32,
    n_items: i32,
    seed: &[i32],
    prior_kind: i32,
    prior: &ExternalPtr,
    randomize_permutation: bool,
) -> Result<H::Token> {
    sample_with(host, n_samples, n_items, seed, prior_kind, prior, randomize_permutation, None)
}

/// Draw partitions consulting host likelihood callbacks
#[allow(clippy::too_many_arguments)]
pub fn sample_partition_with_callbacks<H: HostAllocator>(
    host: &H,
    n_samples: i32,
    n_items: i32,
    seed: &[i32],
    prior_kind: i32,
    prior: &ExternalPtr,
    randomize_permutation: bool,
    callbacks: HostCallbacks<'_>,
) -> Result<H::Token> {
    sample_with(
        host,
        n_samples,
        n_items,
        seed,
        prior_kind,
        prior,
        randomize_permutation,
        Some(callbacks),
    )
}

#[allow(clippy::too_many_arguments)]
fn sample_with<H: HostAllocator>(
    host: &H,
    n_samples: i32,
    n_items: i32,
    seed: &[i32],
    prior_kind: i32,
    prior: &ExternalPtr,
    randomize_permutation: bool,
    callbacks: Option<HostCallbacks<'_>>,
) -> Result<H::Token> {
    let addr = prior.checked(EPA_PARAMETERS_TAG, "sample_partition")?;
    let nrow = Validate::count(n_samples, "n_samples")?;
    let ncol = Validate::count(n_items, "n_items")?;
    Validate::len(seed.len(), SEED_WORDS, "seed")?;

    let mut output = ManagedVector::allocate_matrix(host, nrow, ncol)?;
    let labels = output.as_mut_ptr();
    let prior = addr.cast_const().cast::<EpaParameters>();
    let randomize = c_int::from(randomize_permutation);
    // SAFETY: the output holds nrow * ncol pinned ints, the seed was length
    // checked and the prior pointer is live
    let status = unsafe {
        match callbacks {
            None => abi::caviar__sample_partition(
                n_samples, n_items, labels, seed.as_ptr(), prior_kind, prior, randomize,
            ),
            Some(callbacks) => abi::caviar__sample_partition_with_callbacks(
                n_samples,
                n_items,
                labels,
                seed.as_ptr(),
                prior_kind,
                prior,
                randomize,
                callbacks.table,
                callbacks.context,
            ),
        }
    };
    if status != CAVIAR_OK {
        return Err(failure("sample_partition", status));
    }
    Ok(output.release())
}
