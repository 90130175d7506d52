/// Constants used throughout the caviar codebase
// Environment variable names
pub const CAVIAR_LOG_VAR: &str = "CAVIAR_LOG";
pub const CAVIAR_N_CORES_VAR: &str = "CAVIAR_N_CORES";
pub const CAVIAR_MASS_VAR: &str = "CAVIAR_MASS";
pub const CAVIAR_DISCOUNT_VAR: &str = "CAVIAR_DISCOUNT";

// Default log filter when neither CAVIAR_LOG nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "info";

// Number of 32-bit words making up a sampling seed (32 bytes)
pub const SEED_WORDS: usize = 8;

// External pointer tag for EPA prior handles
pub const EPA_PARAMETERS_TAG: &str = "epa_parameters";
