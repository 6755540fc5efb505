// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, MatsimConfig, ModelKind};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "matsim.toml";

/// Find the matsim configuration file
///
/// Search order:
/// 1. `MATSIM_CONFIG_PATH` environment variable
/// 2. Current working directory: `./matsim.toml`
/// 3. Parent directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    // 1. Check environment variable first
    if let Ok(env_path) = env::var("MATSIM_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by MATSIM_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    // 2. Search in common locations
    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Configuration file '{}' not found in any of these locations:\n{}\n\nSet MATSIM_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, or an
/// override value cannot be parsed. Call [`validate_config`](crate::validate_config)
/// afterwards to check physical plausibility.
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<MatsimConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: MatsimConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config)?;

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `MATSIM_DT` -> `simulation.dt`
/// - `MATSIM_DURATION` -> `simulation.duration`
/// - `MATSIM_TRIALS` -> `simulation.trials`
/// - `MATSIM_SEED` -> `simulation.seed`
/// - `MATSIM_MODEL` -> `simulation.model`
/// - `MATSIM_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut MatsimConfig) -> ConfigResult<()> {
    let mut overrides = HashMap::new();
    for (var, key) in [
        ("MATSIM_DT", "dt"),
        ("MATSIM_DURATION", "duration"),
        ("MATSIM_TRIALS", "trials"),
        ("MATSIM_SEED", "seed"),
        ("MATSIM_MODEL", "model"),
        ("MATSIM_LOG_LEVEL", "log_level"),
    ] {
        if let Ok(value) = env::var(var) {
            overrides.insert(key.to_string(), value);
        }
    }
    apply_cli_overrides(config, &overrides)
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"dt": "0.0001", "seed": "42"}`)
///
/// Unknown keys are ignored; known keys with unparsable values are errors.
pub fn apply_cli_overrides(
    config: &mut MatsimConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    if let Some(value) = cli_args.get("dt") {
        config.simulation.dt = parse_value("dt", value)?;
    }
    if let Some(value) = cli_args.get("duration") {
        config.simulation.duration = parse_value("duration", value)?;
    }
    if let Some(value) = cli_args.get("trials") {
        config.simulation.trials = parse_value("trials", value)?;
    }
    if let Some(value) = cli_args.get("seed") {
        config.simulation.seed = parse_value("seed", value)?;
    }
    if let Some(value) = cli_args.get("model") {
        config.simulation.model = ModelKind::parse(value)
            .ok_or_else(|| ConfigError::InvalidValue(format!("model = {}", value)))?;
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("record_trace") {
        config.simulation.record_trace =
            value.to_lowercase() == "true" || value == "1" || value.to_lowercase() == "yes";
    }
    Ok(())
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("MATSIM_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("MATSIM_CONFIG_PATH");

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("MATSIM_CONFIG_PATH", "/nonexistent/matsim.toml");
        let result = find_config_file();
        env::remove_var("MATSIM_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "dt = 0.00005").unwrap();
        writeln!(file, "trials = 3").unwrap();
        writeln!(file, "[[conductances]]").unwrap();
        writeln!(file, "kind = \"exponential\"").unwrap();
        writeln!(file, "g_peak = 0.5").unwrap();
        writeln!(file, "decay = 2.0").unwrap();
        writeln!(file, "reversal = 0.0").unwrap();
        writeln!(file, "activation_times = [0.0, 1.0]").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.simulation.dt, 0.00005);
        assert_eq!(config.simulation.trials, 3);
        assert_eq!(config.conductances.len(), 1);
        assert_eq!(config.lif.resting_potential, -70.0);
    }

    #[test]
    fn test_invalid_toml() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[simulation\ndt = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = MatsimConfig::default();

        env::set_var("MATSIM_SEED", "99");
        env::set_var("MATSIM_MODEL", "hodgkin_huxley");

        let result = apply_environment_overrides(&mut config);

        env::remove_var("MATSIM_SEED");
        env::remove_var("MATSIM_MODEL");

        assert!(result.is_ok());
        assert_eq!(config.simulation.seed, 99);
        assert_eq!(config.simulation.model, ModelKind::HodgkinHuxley);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = MatsimConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("dt".to_string(), "0.001".to_string());
        cli_args.insert("duration".to_string(), "2.5".to_string());
        cli_args.insert("record_trace".to_string(), "yes".to_string());

        apply_cli_overrides(&mut config, &cli_args).unwrap();

        assert_eq!(config.simulation.dt, 0.001);
        assert_eq!(config.simulation.duration, 2.5);
        assert!(config.simulation.record_trace);
    }

    #[test]
    fn test_cli_override_bad_value() {
        let mut config = MatsimConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("trials".to_string(), "many".to_string());

        let result = apply_cli_overrides(&mut config, &cli_args);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        // CLI overrides take precedence over environment variables
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "seed = 1").unwrap();
        writeln!(file, "duration = 0.5").unwrap();

        env::set_var("MATSIM_SEED", "2");
        env::set_var("MATSIM_DURATION", "0.75");

        let mut cli_args = HashMap::new();
        cli_args.insert("seed".to_string(), "3".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args));

        env::remove_var("MATSIM_SEED");
        env::remove_var("MATSIM_DURATION");

        let config = config.unwrap();
        // CLI wins for seed, env wins for duration (no CLI override)
        assert_eq!(config.simulation.seed, 3);
        assert_eq!(config.simulation.duration, 0.75);
    }
}
