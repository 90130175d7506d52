//! Builder methods for creating errors with context

use super::types::Error;
use std::path::PathBuf;

impl Error {
    /// Create an allocation failure error
    #[must_use]
    pub fn allocation(what: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Allocation {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Create an invalid handle error
    #[must_use]
    pub fn invalid_handle(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidHandle {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a callback failure error
    #[must_use]
    pub fn callback(callback: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Callback {
            callback: callback.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a callback failure error with a source error
    #[must_use]
    pub fn callback_with_source(
        callback: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Callback {
            callback: callback.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a malformed dimension error
    #[must_use]
    pub fn dimension(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Error::Dimension {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a reentrancy error
    #[must_use]
    pub fn reentrancy(operation: impl Into<String>) -> Self {
        Error::Reentrancy {
            operation: operation.into(),
        }
    }

    /// Create an FFI error
    #[must_use]
    pub fn ffi(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Ffi {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Whether the error was raised by host code rather than the bridge
    pub fn is_callback(&self) -> bool {
        matches!(self, Error::Callback { .. })
    }
}
