// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # matsim Configuration System
//!
//! Type-safe configuration for neuron simulations with support for:
//! - TOML file parsing
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use matsim_config::{load_config, validate_config};
//!
//! // Load configuration with automatic file discovery and overrides
//! let config = load_config(None, None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid configuration");
//!
//! println!("dt: {} s", config.simulation.dt);
//! println!("duration: {} s", config.simulation.duration);
//! ```
//!
//! ## Example file
//!
//! ```toml
//! [simulation]
//! model = "lif"
//! dt = 0.0001
//! duration = 1.0
//! seed = 7
//!
//! [lif]
//! resting_potential = -70.0
//! membrane_resistance = 1.0
//! membrane_capacitance = 0.01
//!
//! [[thresholds]]
//! alpha1 = 15.0
//! alpha2 = 3.0
//! tau1 = 0.01
//! tau2 = 0.2
//! omega = -55.0
//! refractory_period = 0.002
//!
//! [[conductances]]
//! kind = "ornstein_uhlenbeck"
//! rate = 2000.0
//! g_peak = 0.05
//! decay = 0.005
//! reversal = 0.0
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "std")]
pub mod loader;

pub mod types;
pub mod validation;

#[cfg(feature = "std")]
pub use loader::{apply_cli_overrides, apply_environment_overrides, find_config_file, load_config};

pub use types::*;
pub use validation::{collect_errors, validate_config, ConfigValidationError};

/// Re-export for convenience
pub use serde;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[cfg(feature = "std")]
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[cfg(feature = "std")]
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "std")]
    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[cfg(feature = "std")]
impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_types_compile() {
        // Smoke test to ensure types are properly defined
        let _config = MatsimConfig::default();
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_crate_doc_example_parses() {
        let text = r#"
[simulation]
model = "lif"
dt = 0.0001
duration = 1.0
seed = 7

[lif]
resting_potential = -70.0
membrane_resistance = 1.0
membrane_capacitance = 0.01

[[thresholds]]
alpha1 = 15.0
alpha2 = 3.0
tau1 = 0.01
tau2 = 0.2
omega = -55.0
refractory_period = 0.002

[[conductances]]
kind = "ornstein_uhlenbeck"
rate = 2000.0
g_peak = 0.05
decay = 0.005
reversal = 0.0
"#;
        let config: MatsimConfig = toml::from_str(text).unwrap();
        assert_eq!(config.simulation.model, ModelKind::Lif);
        assert_eq!(config.thresholds.len(), 1);
        assert!(!config.thresholds[0].resetting);
        assert_eq!(config.conductances.len(), 1);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_missing_section_reported_as_validation_error() {
        // A LIF run without MAT units
        let config = MatsimConfig::default();
        match validate_config(&config) {
            Err(ConfigError::ValidationError(message)) => {
                assert!(message.contains("thresholds"), "{}", message);
            }
            other => panic!("expected a validation error, got {:?}", other),
        }
    }
}
