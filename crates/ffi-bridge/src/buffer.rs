//! Non-owning views over caller-supplied numeric storage

use caviar_core::{Error, Result, Validate};

mod sealed {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for f64 {}
}

/// Element kinds that may cross the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Int32,
    Float64,
}

impl ElementKind {
    /// The C type name, for diagnostics
    pub const fn c_type_name(self) -> &'static str {
        match self {
            ElementKind::Int32 => "int32_t",
            ElementKind::Float64 => "double",
        }
    }
}

/// Numeric types a [`FlatBufferView`] can describe
pub trait Element: sealed::Sealed + Copy + 'static {
    const KIND: ElementKind;
}

impl Element for i32 {
    const KIND: ElementKind = ElementKind::Int32;
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::Float64;
}

/// A read-only `(pointer, length, kind)` description of caller storage
///
/// The view borrows; it never copies or frees, and its lifetime ties it to
/// the call that created it.
#[derive(Debug, Clone, Copy)]
pub struct FlatBufferView<'a, T: Element> {
    data: &'a [T],
}

impl<'a, T: Element> FlatBufferView<'a, T> {
    pub fn from_slice(data: &'a [T]) -> Self {
        Self { data }
    }

    /// Wrap a raw region handed over by foreign code
    ///
    /// A null pointer is accepted only when `len == 0`.
    ///
    /// # Safety
    /// When `len > 0`, `ptr` must point to `len` initialised elements that
    /// stay valid and unmodified for `'a`.
    pub unsafe fn from_raw_parts(ptr: *const T, len: usize, what: &str) -> Result<Self> {
        if len == 0 {
            return Ok(Self { data: &[] });
        }
        if ptr.is_null() {
            return Err(Error::invalid_argument(
                what,
                format!("null {} pointer for {len} elements", T::KIND.c_type_name()),
            ));
        }
        // SAFETY: non-null and the caller vouches for `len` live elements
        let data = unsafe { std::slice::from_raw_parts(ptr, len) };
        Ok(Self { data })
    }

    /// Reject the view unless it holds exactly `expected` elements
    pub fn expect_len(self, expected: usize, what: &str) -> Result<Self> {
        Validate::len(self.data.len(), expected, what)?;
        Ok(self)
    }

    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn kind(&self) -> ElementKind {
        T::KIND
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }
}

impl FlatBufferView<'_, i32> {
    /// Interpret the elements as zero-based indices below `bound`
    pub fn to_indices(&self, bound: usize, what: &str) -> Result<Vec<usize>> {
        self.data
            .iter()
            .map(|&value| match usize::try_from(value) {
                Ok(index) if index < bound => Ok(index),
                _ => Err(Error::invalid_argument(
                    what,
                    format!("index {value} is outside [0, {bound})"),
                )),
            })
            .collect()
    }
}
