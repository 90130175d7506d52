//! Tagged, clearable references to native objects

use caviar_core::{Error, Result};
use libc::c_void;
use std::cell::Cell;

/// The host's reference to a native object
///
/// Mirrors a host runtime's external-pointer value: it carries an address
/// and a type tag, and it can be cleared in place so that every copy of
/// the reference sees the object as gone.
#[derive(Debug)]
pub struct ExternalPtr {
    addr: Cell<*mut c_void>,
    tag: &'static str,
}

impl ExternalPtr {
    pub fn new(addr: *mut c_void, tag: &'static str) -> Self {
        Self {
            addr: Cell::new(addr),
            tag,
        }
    }

    pub fn addr(&self) -> *mut c_void {
        self.addr.get()
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn is_cleared(&self) -> bool {
        self.addr.get().is_null()
    }

    pub fn clear(&self) {
        self.addr.set(std::ptr::null_mut());
    }

    /// The address, provided the tag matches and the pointer is live
    pub fn checked(&self, tag: &str, operation: &str) -> Result<*mut c_void> {
        if self.tag != tag {
            return Err(Error::invalid_handle(
                operation,
                format!("expected a '{tag}' pointer, got '{}'", self.tag),
            ));
        }
        if self.is_cleared() {
            return Err(Error::invalid_handle(
                operation,
                format!("the '{tag}' pointer has already been freed"),
            ));
        }
        Ok(self.addr.get())
    }
}

impl Drop for ExternalPtr {
    fn drop(&mut self) {
        if !self.is_cleared() {
            tracing::debug!(tag = self.tag, "external pointer dropped without being freed");
        }
    }
}
