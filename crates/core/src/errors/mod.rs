//! Error types and argument validation for caviar operations

mod builders;
mod conversions;
mod display;
mod types;
mod validate;

pub use types::{Error, Result};
pub use validate::Validate;
