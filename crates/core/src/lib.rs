//! Core errors, constants, and configuration for caviar.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum and `Result` alias shared by the engine,
//!   the FFI bridge and the CLI, plus `Validate` argument checks.
//! - **`constants`**: environment variable names, seed width and handle tags.
//! - **`config`**: `SamplerConfig`, layered from defaults, a JSON file and
//!   the environment.

pub mod config;
pub mod constants;
pub mod errors;

pub use self::{
    config::SamplerConfig,
    constants::*,
    errors::{Error, Result, Validate},
};
