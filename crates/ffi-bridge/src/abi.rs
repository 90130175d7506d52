//! C ABI entry points
//!
//! No function here unwinds into the caller. Failures are reported as a
//! negative status (or a null handle) and the error itself is parked in a
//! thread-local slot, readable through [`caviar__last_error_message`] from C
//! or [`take_last_error`] from Rust.

use crate::buffer::FlatBufferView;
use crate::callback::{CallbackTable, ForeignLikelihood};
use crate::guard::ensure_idle;
use crate::handle::PriorHandle;
use crate::orchestrator::{sample_into, PriorKind, SampleRequest};
use caviar_core::{Error, Result, Validate, SEED_WORDS};
use caviar_engine::{expected_number_of_clusters, EpaParameters, Likelihood};
use libc::{c_char, c_double, c_int, c_void};
use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, warn};

pub const CAVIAR_OK: c_int = 0;
pub const CAVIAR_ERR_DIMENSION: c_int = -1;
pub const CAVIAR_ERR_ARGUMENT: c_int = -2;
pub const CAVIAR_ERR_HANDLE: c_int = -3;
pub const CAVIAR_ERR_CALLBACK: c_int = -4;
pub const CAVIAR_ERR_ALLOCATION: c_int = -5;
pub const CAVIAR_ERR_REENTRANCY: c_int = -6;
pub const CAVIAR_ERR_OTHER: c_int = -7;
pub const CAVIAR_ERR_PANIC: c_int = -99;

thread_local! {
    static LAST_ERROR: RefCell<Option<Error>> = const { RefCell::new(None) };
}

/// Status code reported for an error class
pub fn status_of(error: &Error) -> c_int {
    match error {
        Error::Dimension { .. } => CAVIAR_ERR_DIMENSION,
        Error::InvalidArgument { .. } => CAVIAR_ERR_ARGUMENT,
        Error::InvalidHandle { .. } => CAVIAR_ERR_HANDLE,
        Error::Callback { .. } => CAVIAR_ERR_CALLBACK,
        Error::Allocation { .. } => CAVIAR_ERR_ALLOCATION,
        Error::Reentrancy { .. } => CAVIAR_ERR_REENTRANCY,
        _ => CAVIAR_ERR_OTHER,
    }
}

/// Remove and return the error recorded by the last failing call on this thread
pub fn take_last_error() -> Option<Error> {
    LAST_ERROR.with(|slot| slot.borrow_mut().take())
}

fn record(error: Error) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(error));
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run `body` at the boundary, converting errors and panics into a status
fn run<T>(operation: &str, body: impl FnOnce() -> Result<T>) -> std::result::Result<T, c_int> {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            let status = status_of(&e);
            if e.is_callback() {
                error!(operation, error = %e, "sampling aborted by host callback");
            } else {
                warn!(operation, error = %e, "call rejected");
            }
            record(e);
            Err(status)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(operation, panic = %message, "caught panic at the C boundary");
            record(Error::ffi(operation, format!("panicked: {message}")));
            Err(CAVIAR_ERR_PANIC)
        }
    }
}

fn flag(value: c_int) -> bool {
    value != 0
}

/// Construct EPA prior parameters
///
/// Returns null on failure.
///
/// # Safety
/// `similarity` must point to `n_items * n_items` doubles. Unless
/// `use_natural_permutation` is nonzero, `permutation` must point to
/// `n_items` ints.
#[no_mangle]
pub unsafe extern "C" fn caviar__epaparameters_new(
    n_items: c_int,
    similarity: *const c_double,
    permutation: *const c_int,
    use_natural_permutation: c_int,
    mass: c_double,
    discount: c_double,
) -> *mut EpaParameters {
    run("epaparameters_new", || {
        let n_items = Validate::count(n_items, "n_items")?;
        let n_squared = n_items
            .checked_mul(n_items)
            .ok_or_else(|| Error::invalid_argument("n_items", "n_items squared overflows"))?;
        // SAFETY: the caller vouches for the similarity length
        let similarity = unsafe { FlatBufferView::from_raw_parts(similarity, n_squared, "similarity") }?;
        let use_natural_permutation = flag(use_natural_permutation);
        let permutation = if use_natural_permutation {
            None
        } else {
            // SAFETY: the caller vouches for the permutation length
            Some(unsafe { FlatBufferView::from_raw_parts(permutation, n_items, "permutation") }?)
        };
        let handle = PriorHandle::construct(
            n_items,
            similarity,
            permutation,
            use_natural_permutation,
            mass,
            discount,
        )?;
        Ok(handle.into_raw())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Destroy parameters made by [`caviar__epaparameters_new`]
///
/// Refused with `CAVIAR_ERR_REENTRANCY` from inside a likelihood callback,
/// in which case the handle stays valid.
///
/// # Safety
/// `handle` must be null or a live handle from `caviar__epaparameters_new`
/// that has not been freed.
#[no_mangle]
pub unsafe extern "C" fn caviar__epaparameters_free(handle: *mut EpaParameters) -> c_int {
    let outcome = run("epaparameters_free", || {
        // checked before ownership is reclaimed: an in-flight call still borrows it
        ensure_idle("epaparameters_free")?;
        // SAFETY: per the function contract
        let prior = unsafe { PriorHandle::from_raw(handle, "epaparameters_free") }?;
        match prior.destroy() {
            Ok(()) => Ok(()),
            Err((prior, e)) => {
                // hand ownership back to the foreign side at the same address
                let _ = prior.into_raw();
                Err(e)
            }
        }
    });
    match outcome {
        Ok(()) => CAVIAR_OK,
        Err(status) => status,
    }
}

/// Shared body of the two sampling entry points
///
/// # Safety
/// Pointer arguments as documented on [`caviar__sample_partition`].
#[allow(clippy::too_many_arguments)]
unsafe fn sample_partition_raw(
    n_partitions: c_int,
    n_items: c_int,
    labels: *mut c_int,
    seed: *const c_int,
    prior_kind: c_int,
    prior: *const EpaParameters,
    randomize_permutation: c_int,
    likelihood: Option<&mut dyn Likelihood>,
) -> Result<()> {
    let kind = PriorKind::try_from(prior_kind)?;
    let n_partitions = Validate::count(n_partitions, "n_partitions")?;
    let n_items = Validate::count(n_items, "n_items")?;
    // SAFETY: a non-null prior is a live handle per the function contract
    let prior = unsafe { PriorHandle::borrow_raw(prior, "sample_partition") }?;
    // SAFETY: the caller supplies SEED_WORDS ints
    let seed = unsafe { FlatBufferView::from_raw_parts(seed, SEED_WORDS, "seed") }?;
    let request = SampleRequest {
        n_partitions,
        n_items,
        seed,
        randomize_permutation: flag(randomize_permutation),
    };
    request.validate(prior)?;

    let len = request.output_len();
    if len == 0 {
        return Ok(());
    }
    if labels.is_null() {
        return Err(Error::invalid_argument(
            "labels",
            format!("null output pointer for {len} elements"),
        ));
    }
    // SAFETY: non-null and the caller supplies `n_partitions * n_items` writable ints
    let labels = unsafe { std::slice::from_raw_parts_mut(labels, len) };
    sample_into(labels, &request, prior, kind, likelihood)
}

/// Draw `n_partitions` partitions from the closed-form prior into `labels`
///
/// `labels` receives an `n_partitions × n_items` column-major matrix.
/// Callback-driven prior kinds are rejected here; use
/// [`caviar__sample_partition_with_callbacks`].
///
/// # Safety
/// `labels` must point to `n_partitions * n_items` writable ints, `seed`
/// to 8 ints, and `prior` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn caviar__sample_partition(
    n_partitions: c_int,
    n_items: c_int,
    labels: *mut c_int,
    seed: *const c_int,
    prior_kind: c_int,
    prior: *const EpaParameters,
    randomize_permutation: c_int,
) -> c_int {
    let outcome = run("sample_partition", || unsafe {
        sample_partition_raw(
            n_partitions,
            n_items,
            labels,
            seed,
            prior_kind,
            prior,
            randomize_permutation,
            None,
        )
    });
    match outcome {
        Ok(()) => CAVIAR_OK,
        Err(status) => status,
    }
}

/// As [`caviar__sample_partition`], consulting host likelihood callbacks
///
/// `context` is passed unchanged to every callback and is not retained
/// once this function returns.
///
/// # Safety
/// As for [`caviar__sample_partition`]; additionally `callbacks` must be
/// null or point to a valid table whose functions accept `context`.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn caviar__sample_partition_with_callbacks(
    n_partitions: c_int,
    n_items: c_int,
    labels: *mut c_int,
    seed: *const c_int,
    prior_kind: c_int,
    prior: *const EpaParameters,
    randomize_permutation: c_int,
    callbacks: *const CallbackTable,
    context: *const c_void,
) -> c_int {
    let outcome = run("sample_partition_with_callbacks", || {
        // SAFETY: null or a valid table per the function contract
        let table = unsafe { callbacks.as_ref() }
            .ok_or_else(|| Error::invalid_argument("callbacks", "null callback table"))?;
        // SAFETY: the caller vouches that the table accepts `context`
        let mut foreign = unsafe { ForeignLikelihood::new(table, context) };
        // SAFETY: remaining pointers per the function contract
        unsafe {
            sample_partition_raw(
                n_partitions,
                n_items,
                labels,
                seed,
                prior_kind,
                prior,
                randomize_permutation,
                Some(&mut foreign),
            )
        }
    });
    match outcome {
        Ok(()) => CAVIAR_OK,
        Err(status) => status,
    }
}

/// Expected number of clusters under the prior for `n_items` items
///
/// # Safety
/// `out` must point to a writable double.
#[no_mangle]
pub unsafe extern "C" fn caviar__expected_number_of_clusters(
    mass: c_double,
    discount: c_double,
    n_items: c_int,
    out: *mut c_double,
) -> c_int {
    let outcome = run("expected_number_of_clusters", || {
        let n_items = Validate::count(n_items, "n_items")?;
        let value = expected_number_of_clusters(mass, discount, n_items)?;
        // SAFETY: null or writable per the function contract
        let out = unsafe { out.as_mut() }
            .ok_or_else(|| Error::invalid_argument("out", "null output pointer"))?;
        *out = value;
        Ok(())
    });
    match outcome {
        Ok(()) => CAVIAR_OK,
        Err(status) => status,
    }
}

/// Copy the last error message on this thread into `buffer`
///
/// Writes at most `capacity - 1` bytes plus a NUL terminator and returns
/// the full message length, or 0 when there is no recorded error. The
/// error stays recorded.
///
/// # Safety
/// `buffer` must be null or point to `capacity` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn caviar__last_error_message(buffer: *mut c_char, capacity: usize) -> usize {
    let message = LAST_ERROR.with(|slot| slot.borrow().as_ref().map(ToString::to_string));
    let Some(message) = message else {
        return 0;
    };
    if !buffer.is_null() && capacity > 0 {
        let n = message.len().min(capacity - 1);
        // SAFETY: `n + 1 <= capacity` bytes fit in the caller's buffer
        unsafe {
            std::ptr::copy_nonoverlapping(message.as_ptr().cast::<c_char>(), buffer, n);
            *buffer.add(n) = 0;
        }
    }
    message.len()
}
