// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Rejects non-physical parameters before a simulation starts: non-finite
//! values, non-positive time constants, negative rates and peaks, and steps
//! too coarse for forward Euler.

use crate::{ConductanceConfig, ConfigError, ConfigResult, MatsimConfig, ModelKind};

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::{format, string::String, string::ToString, vec::Vec};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    NotFinite { field: String },
    NotPositive { field: String, value: f64 },
    Negative { field: String, value: f64 },
    MissingRequired { field: String },
    StepTooLarge { dt: f64, fastest: f64 },
}

impl core::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFinite { field } => write!(f, "{} must be finite", field),
            Self::NotPositive { field, value } => {
                write!(f, "{} = {} must be > 0", field, value)
            }
            Self::Negative { field, value } => {
                write!(f, "{} = {} must be >= 0", field, value)
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::StepTooLarge { dt, fastest } => write!(
                f,
                "dt = {} is not smaller than the fastest time constant {}",
                dt, fastest
            ),
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Run control (dt, duration, trials)
/// - Membrane parameters of the selected model
/// - Threshold and conductance parameters
/// - dt against the fastest time constant
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &MatsimConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

/// Every validation problem in `config`, in section order
pub fn collect_errors(config: &MatsimConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    validate_simulation(config, &mut errors);

    match config.simulation.model {
        ModelKind::Lif => validate_lif(config, &mut errors),
        ModelKind::HodgkinHuxley => validate_hodgkin_huxley(config, &mut errors),
    }

    validate_conductances(config, &mut errors);
    validate_step_size(config, &mut errors);

    errors
}

fn check_finite(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) -> bool {
    if value.is_finite() {
        return true;
    }
    errors.push(ConfigValidationError::NotFinite {
        field: field.to_string(),
    });
    false
}

fn check_positive(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if check_finite(field, value, errors) && value <= 0.0 {
        errors.push(ConfigValidationError::NotPositive {
            field: field.to_string(),
            value,
        });
    }
}

fn check_non_negative(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if check_finite(field, value, errors) && value < 0.0 {
        errors.push(ConfigValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }
}

fn validate_simulation(config: &MatsimConfig, errors: &mut Vec<ConfigValidationError>) {
    let sim = &config.simulation;
    check_positive("simulation.dt", sim.dt, errors);
    check_positive("simulation.duration", sim.duration, errors);
    check_non_negative("simulation.merge_tolerance", sim.merge_tolerance, errors);
    check_finite(
        "simulation.spike_detection_threshold",
        sim.spike_detection_threshold,
        errors,
    );
    if sim.trials == 0 {
        errors.push(ConfigValidationError::NotPositive {
            field: "simulation.trials".to_string(),
            value: 0.0,
        });
    }
    if sim.record_trace && sim.trace_stride == 0 {
        errors.push(ConfigValidationError::NotPositive {
            field: "simulation.trace_stride".to_string(),
            value: 0.0,
        });
    }
}

fn validate_lif(config: &MatsimConfig, errors: &mut Vec<ConfigValidationError>) {
    let lif = &config.lif;
    check_finite("lif.resting_potential", lif.resting_potential, errors);
    check_positive("lif.membrane_resistance", lif.membrane_resistance, errors);
    check_positive("lif.membrane_capacitance", lif.membrane_capacitance, errors);

    if config.thresholds.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "thresholds (a LIF neuron needs at least one MAT unit)".to_string(),
        });
    }

    for (i, mat) in config.thresholds.iter().enumerate() {
        check_finite(&format!("thresholds[{}].alpha1", i), mat.alpha1, errors);
        check_finite(&format!("thresholds[{}].alpha2", i), mat.alpha2, errors);
        check_positive(&format!("thresholds[{}].tau1", i), mat.tau1, errors);
        check_positive(&format!("thresholds[{}].tau2", i), mat.tau2, errors);
        check_finite(&format!("thresholds[{}].omega", i), mat.omega, errors);
        check_non_negative(
            &format!("thresholds[{}].refractory_period", i),
            mat.refractory_period,
            errors,
        );
    }
}

fn validate_hodgkin_huxley(config: &MatsimConfig, errors: &mut Vec<ConfigValidationError>) {
    let hh = &config.hodgkin_huxley;
    check_non_negative("hodgkin_huxley.g_l", hh.g_l, errors);
    check_non_negative("hodgkin_huxley.g_na", hh.g_na, errors);
    check_non_negative("hodgkin_huxley.g_k", hh.g_k, errors);
    check_positive("hodgkin_huxley.c_m", hh.c_m, errors);
    check_finite("hodgkin_huxley.e_l", hh.e_l, errors);
    check_finite("hodgkin_huxley.e_na", hh.e_na, errors);
    check_finite("hodgkin_huxley.e_k", hh.e_k, errors);
    check_finite("hodgkin_huxley.v_rest", hh.v_rest, errors);
}

fn validate_conductances(config: &MatsimConfig, errors: &mut Vec<ConfigValidationError>) {
    for (i, conductance) in config.conductances.iter().enumerate() {
        check_non_negative(&format!("conductances[{}].g_peak", i), conductance.g_peak(), errors);
        check_positive(&format!("conductances[{}].decay", i), conductance.decay(), errors);
        check_finite(&format!("conductances[{}].reversal", i), conductance.reversal(), errors);
        if let Some(rate) = conductance.rate() {
            check_non_negative(&format!("conductances[{}].rate", i), rate, errors);
        }
        if let ConductanceConfig::Exponential {
            activation_times, ..
        } = conductance
        {
            for (j, t) in activation_times.iter().enumerate() {
                check_non_negative(
                    &format!("conductances[{}].activation_times[{}]", i, j),
                    *t,
                    errors,
                );
            }
        }
    }
}

fn validate_step_size(config: &MatsimConfig, errors: &mut Vec<ConfigValidationError>) {
    let dt = config.simulation.dt;
    if !(dt.is_finite() && dt > 0.0) {
        return;
    }
    if let Some(fastest) = config.fastest_time_constant() {
        if dt >= fastest {
            errors.push(ConfigValidationError::StepTooLarge { dt, fastest });
        }
    }
}
