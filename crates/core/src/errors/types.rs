//! Core error type definitions

use std::path::PathBuf;

/// Result type alias for caviar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for caviar operations using thiserror
///
/// Every variant that can be produced while crossing the host/engine
/// boundary is fatal to the call that produced it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A host-side buffer or an engine-side object could not be allocated
    Allocation { what: String, message: String },

    /// A destroyed, cleared or foreign handle was used
    InvalidHandle { operation: String, message: String },

    /// A host likelihood callback failed mid-sample
    Callback {
        callback: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Declared dimensions disagree with the supplied storage
    Dimension {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// An argument is outside the domain the engine accepts
    InvalidArgument { name: String, message: String },

    /// Construction or destruction attempted while a sampling call is in flight
    Reentrancy { operation: String },

    /// Status codes and panics crossing the C ABI
    Ffi { operation: String, message: String },

    /// Configuration errors
    Configuration { message: String },

    /// File system operations
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}
