//! Foreign likelihood callbacks
//!
//! The host registers plain C function pointers plus one context pointer.
//! [`ForeignLikelihood`] adapts them to the engine's [`Likelihood`] hook for
//! the duration of a single sampling call.

use crate::buffer::FlatBufferView;
use caviar_core::{Error, Result};
use caviar_engine::Likelihood;
use libc::{c_int, c_void};
use tracing::error;

/// `status = f(items, n_items, context, &out)`; zero status means success
pub type SubsetLikelihoodFn = unsafe extern "C" fn(
    items: *const i32,
    n_items: c_int,
    context: *const c_void,
    out: *mut f64,
) -> c_int;

/// `status = f(item, label, is_new, context, &out)`; zero status means success
pub type ItemLikelihoodFn = unsafe extern "C" fn(
    item: c_int,
    label: c_int,
    is_new: c_int,
    context: *const c_void,
    out: *mut f64,
) -> c_int;

/// The pair of host callbacks, laid out for C
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct CallbackTable {
    pub subset_log_likelihood: Option<SubsetLikelihoodFn>,
    pub item_log_likelihood: Option<ItemLikelihoodFn>,
}

/// Host callbacks bound to one evaluation context
///
/// The context pointer is handed back verbatim on every invocation and is
/// never dereferenced here.
pub struct ForeignLikelihood<'a> {
    table: &'a CallbackTable,
    context: *const c_void,
}

impl<'a> ForeignLikelihood<'a> {
    /// # Safety
    /// Every function in `table` must be safe to call with `context` for as
    /// long as this value lives.
    pub unsafe fn new(table: &'a CallbackTable, context: *const c_void) -> Self {
        Self { table, context }
    }

    fn finish(name: &str, status: c_int, value: f64) -> Result<f64> {
        if status != 0 {
            error!(callback = name, status, "host likelihood callback failed");
            return Err(Error::callback(
                name,
                format!("host reported failure status {status}"),
            ));
        }
        Ok(value)
    }
}

fn to_c_int(value: usize, what: &str) -> Result<c_int> {
    c_int::try_from(value)
        .map_err(|_| Error::callback(what, format!("{value} does not fit a C int")))
}

impl Likelihood for ForeignLikelihood<'_> {
    fn subset_log_likelihood(&mut self, items: &[usize]) -> Result<f64> {
        let f = self.table.subset_log_likelihood.ok_or_else(|| {
            Error::callback("subset likelihood", "no subset callback registered")
        })?;
        let indices = items
            .iter()
            .map(|&item| to_c_int(item, "subset likelihood"))
            .collect::<Result<Vec<i32>>>()?;
        let view = FlatBufferView::from_slice(&indices);
        let n_items = to_c_int(view.len(), "subset likelihood")?;
        let mut out = f64::NAN;
        // SAFETY: the view outlives the call and the constructor vouched for `f` with this context
        let status = unsafe { f(view.as_ptr(), n_items, self.context, &mut out) };
        Self::finish("subset likelihood", status, out)
    }

    fn item_log_likelihood(&mut self, item: usize, label: usize, is_new: bool) -> Result<f64> {
        let f = self
            .table
            .item_log_likelihood
            .ok_or_else(|| Error::callback("item likelihood", "no item callback registered"))?;
        let item = to_c_int(item, "item likelihood")?;
        let label = to_c_int(label, "item likelihood")?;
        let mut out = f64::NAN;
        // SAFETY: as above
        let status = unsafe { f(item, label, c_int::from(is_new), self.context, &mut out) };
        Self::finish("item likelihood", status, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        seen: Vec<Vec<i32>>,
    }

    unsafe extern "C" fn record_subset(
        items: *const i32,
        n_items: c_int,
        context: *const c_void,
        out: *mut f64,
    ) -> c_int {
        let recorder = unsafe { &mut *(context as *mut Recorder) };
        let items = unsafe { std::slice::from_raw_parts(items, n_items as usize) };
        recorder.seen.push(items.to_vec());
        unsafe { *out = -(n_items as f64) };
        0
    }

    unsafe extern "C" fn failing_item(
        _item: c_int,
        _label: c_int,
        _is_new: c_int,
        _context: *const c_void,
        _out: *mut f64,
    ) -> c_int {
        3
    }

    #[test]
    fn test_subset_callback_receives_items_and_context() {
        let mut recorder = Recorder { seen: Vec::new() };
        let table = CallbackTable {
            subset_log_likelihood: Some(record_subset),
            item_log_likelihood: None,
        };
        let context = &mut recorder as *mut Recorder as *const c_void;
        let mut likelihood = unsafe { ForeignLikelihood::new(&table, context) };
        let value = likelihood.subset_log_likelihood(&[4, 1, 2]).unwrap();
        assert_eq!(value, -3.0);
        drop(likelihood);
        assert_eq!(recorder.seen, vec![vec![4, 1, 2]]);
    }

    #[test]
    fn test_nonzero_status_is_callback_error() {
        let table = CallbackTable {
            subset_log_likelihood: None,
            item_log_likelihood: Some(failing_item),
        };
        let mut likelihood = unsafe { ForeignLikelihood::new(&table, std::ptr::null()) };
        let error = likelihood.item_log_likelihood(0, 0, true).unwrap_err();
        assert!(error.is_callback());
    }

    #[test]
    fn test_missing_callback_is_callback_error() {
        let table = CallbackTable::default();
        let mut likelihood = unsafe { ForeignLikelihood::new(&table, std::ptr::null()) };
        assert!(likelihood.subset_log_likelihood(&[0]).unwrap_err().is_callback());
    }
}
