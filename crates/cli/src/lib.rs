// Re-export command modules
pub mod commands;
pub mod similarity;

// Re-export commonly used types
pub use commands::Commands;
pub use similarity::read_similarity;
