//! Conversion implementations for error types

use super::types::Error;
use std::path::PathBuf;

// Kept as manual impls: they carry more context than thiserror's #[from]
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(error: std::num::TryFromIntError) -> Self {
        Error::InvalidArgument {
            name: "integer".to_string(),
            message: error.to_string(),
        }
    }
}
