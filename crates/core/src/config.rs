//! Sampler configuration
//!
//! Settings are layered: built-in defaults, then an optional JSON file,
//! then `CAVIAR_*` environment variables.

use crate::constants::{
    CAVIAR_DISCOUNT_VAR, CAVIAR_LOG_VAR, CAVIAR_MASS_VAR, CAVIAR_N_CORES_VAR, DEFAULT_LOG_FILTER,
};
use crate::errors::{Error, Result, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime settings for sampling calls that are not supplied per call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerConfig {
    /// Worker threads for multi-sample runs (0 = all logical CPUs)
    pub n_cores: usize,

    /// Tracing filter directive
    pub log_filter: String,

    /// Mass used when a caller does not supply one
    pub default_mass: f64,

    /// Discount used when a caller does not supply one
    pub default_discount: f64,

    /// Draw a fresh visitation order per sample
    pub randomize_permutation: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            n_cores: 0,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            default_mass: 1.0,
            default_discount: 0.0,
            randomize_permutation: true,
        }
    }
}

impl SamplerConfig {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load a JSON file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        tracing::debug!(?config, "loaded sampler configuration");
        Ok(config)
    }

    /// Read a JSON configuration file without environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read", e))?;
        serde_json::from_str(&contents).map_err(|e| Error::Json {
            message: format!("invalid configuration file '{}'", path.display()),
            source: e,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(value) = read_var(CAVIAR_N_CORES_VAR) {
            self.n_cores = value.parse().map_err(|_| {
                Error::configuration(format!(
                    "{CAVIAR_N_CORES_VAR} must be a non-negative integer, got '{value}'"
                ))
            })?;
        }
        if let Some(value) = read_var(CAVIAR_LOG_VAR) {
            self.log_filter = value;
        }
        if let Some(value) = read_var(CAVIAR_MASS_VAR) {
            self.default_mass = parse_f64(CAVIAR_MASS_VAR, &value)?;
        }
        if let Some(value) = read_var(CAVIAR_DISCOUNT_VAR) {
            self.default_discount = parse_f64(CAVIAR_DISCOUNT_VAR, &value)?;
        }
        Ok(())
    }

    /// Reject settings the engine would refuse later
    pub fn validate(&self) -> Result<()> {
        Validate::positive(self.default_mass, "default_mass")
            .and_then(|_| Validate::in_range(self.default_discount, 0.0, 1.0, "default_discount"))
            .map(|_| ())
            .map_err(|e| Error::configuration(e.to_string()))
    }
}

fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_f64(name: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::configuration(format!("{name} must be a number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for var in [
            CAVIAR_N_CORES_VAR,
            CAVIAR_LOG_VAR,
            CAVIAR_MASS_VAR,
            CAVIAR_DISCOUNT_VAR,
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_are_valid() {
        clear_env();
        let config = SamplerConfig::load(None).unwrap();
        assert_eq!(config, SamplerConfig::default());
    }

    #[test]
    #[serial]
    fn test_file_then_env_layering() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"n_cores": 2, "default_mass": 3.5}}"#).unwrap();

        std::env::set_var(CAVIAR_N_CORES_VAR, "4");
        let config = SamplerConfig::load(Some(file.path())).unwrap();
        clear_env();

        assert_eq!(config.n_cores, 4);
        assert_eq!(config.default_mass, 3.5);
        assert_eq!(config.default_discount, 0.0);
    }

    #[test]
    #[serial]
    fn test_malformed_env_is_configuration_error() {
        clear_env();
        std::env::set_var(CAVIAR_MASS_VAR, "lots");
        let result = SamplerConfig::from_env();
        clear_env();
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    #[serial]
    fn test_invalid_discount_rejected() {
        clear_env();
        std::env::set_var(CAVIAR_DISCOUNT_VAR, "1.0");
        let result = SamplerConfig::load(None);
        clear_env();
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"cores": 2}}"#).unwrap();
        assert!(matches!(
            SamplerConfig::from_file(file.path()),
            Err(Error::Json { .. })
        ));
    }
}
