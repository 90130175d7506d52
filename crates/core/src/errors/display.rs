//! Display implementations for error types

use super::types::Error;
use std::fmt;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Allocation { what, message } => {
                write!(f, "failed to allocate {what}: {message}")
            }
            Error::InvalidHandle { operation, message } => {
                write!(f, "invalid handle passed to '{operation}': {message}")
            }
            Error::Callback {
                callback, message, ..
            } => {
                write!(f, "{callback} callback failed: {message}")
            }
            Error::Dimension {
                what,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "malformed dimensions for {what}: expected {expected} elements, got {actual}"
                )
            }
            Error::InvalidArgument { name, message } => {
                write!(f, "invalid argument '{name}': {message}")
            }
            Error::Reentrancy { operation } => {
                write!(
                    f,
                    "'{operation}' called while a sampling call is in progress on this thread"
                )
            }
            Error::Ffi { operation, message } => {
                write!(f, "FFI operation '{operation}' failed: {message}")
            }
            Error::Configuration { message } => {
                write!(f, "configuration error: {message}")
            }
            Error::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "file system {} operation failed for '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            Error::Json { message, .. } => {
                write!(f, "JSON error: {message}")
            }
        }
    }
}
