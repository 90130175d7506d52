//! Shared utilities for caviar
//!
//! Tracing initialisation and worker-count planning used by the engine
//! driver, the FFI bridge and the CLI.

pub mod parallelism;
pub mod tracing;

pub use parallelism::*;
