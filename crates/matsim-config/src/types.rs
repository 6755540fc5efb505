// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `matsim.toml`. Times are in seconds.

use matsim_neural::models::fastest_gate_time_constant;
use serde::{Deserialize, Serialize};

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::string::{String, ToString};
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MatsimConfig {
    pub simulation: SimulationConfig,
    pub lif: LifConfig,
    pub hodgkin_huxley: HodgkinHuxleyConfig,
    pub thresholds: Vec<MatThresholdConfig>,
    pub conductances: Vec<ConductanceConfig>,
    pub logging: LoggingConfig,
}

/// Which neuron model a run simulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    Lif,
    HodgkinHuxley,
}

impl ModelKind {
    /// Parse the names accepted in TOML and on the command line
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "lif" => Some(ModelKind::Lif),
            "hodgkin_huxley" | "hodgkin-huxley" | "hh" => Some(ModelKind::HodgkinHuxley),
            _ => None,
        }
    }
}

/// How per-threshold spike trains combine into one train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicyConfig {
    #[default]
    Union,
    Consensus,
}

/// Run control
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub model: ModelKind,
    /// Integration step (s)
    pub dt: f64,
    /// Simulated time per trial (s)
    pub duration: f64,
    /// Independent repetitions, each with its own derived seeds
    pub trials: usize,
    /// Root seed for every stochastic conductance
    pub seed: u64,
    pub merge_policy: MergePolicyConfig,
    /// Spikes closer than this (s) are the same event when merging
    pub merge_tolerance: f64,
    /// Upward crossing level (mV) used to detect HH spikes
    pub spike_detection_threshold: f64,
    /// Keep the voltage of every `trace_stride`-th step in the report
    pub record_trace: bool,
    pub trace_stride: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Lif,
            dt: 1e-4,
            duration: 1.0,
            trials: 1,
            seed: 0,
            merge_policy: MergePolicyConfig::Union,
            merge_tolerance: 1e-9,
            spike_detection_threshold: 0.0,
            record_trace: false,
            trace_stride: 10,
        }
    }
}

/// Leaky integrate-and-fire membrane
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifConfig {
    pub resting_potential: f64,
    pub membrane_resistance: f64,
    pub membrane_capacitance: f64,
}

impl Default for LifConfig {
    fn default() -> Self {
        Self {
            resting_potential: -70.0,
            membrane_resistance: 1.0,
            membrane_capacitance: 0.01,
        }
    }
}

/// Hodgkin-Huxley membrane (mV, mS/cm², µF/cm²)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HodgkinHuxleyConfig {
    pub g_l: f64,
    pub e_l: f64,
    pub c_m: f64,
    pub g_na: f64,
    pub e_na: f64,
    pub g_k: f64,
    pub e_k: f64,
    pub v_rest: f64,
}

impl Default for HodgkinHuxleyConfig {
    fn default() -> Self {
        Self {
            g_l: 0.3,
            e_l: -54.387,
            c_m: 1.0,
            g_na: 120.0,
            e_na: 50.0,
            g_k: 36.0,
            e_k: -77.0,
            v_rest: -65.0,
        }
    }
}

/// One MAT threshold unit
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MatThresholdConfig {
    pub alpha1: f64,
    pub alpha2: f64,
    pub tau1: f64,
    pub tau2: f64,
    pub omega: f64,
    pub refractory_period: f64,
    /// Start refractory at t = 0
    pub resetting: bool,
}

impl Default for MatThresholdConfig {
    fn default() -> Self {
        Self {
            alpha1: 15.0,
            alpha2: 3.0,
            tau1: 0.01,
            tau2: 0.2,
            omega: -55.0,
            refractory_period: 0.002,
            resetting: false,
        }
    }
}

/// One synaptic conductance
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConductanceConfig {
    Exponential {
        g_peak: f64,
        decay: f64,
        reversal: f64,
        /// Presynaptic spike times (s)
        #[serde(default)]
        activation_times: Vec<f64>,
    },
    ShotNoise {
        rate: f64,
        g_peak: f64,
        decay: f64,
        reversal: f64,
    },
    OrnsteinUhlenbeck {
        rate: f64,
        g_peak: f64,
        decay: f64,
        reversal: f64,
    },
}

impl ConductanceConfig {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConductanceConfig::Exponential { .. } => "exponential",
            ConductanceConfig::ShotNoise { .. } => "shot_noise",
            ConductanceConfig::OrnsteinUhlenbeck { .. } => "ornstein_uhlenbeck",
        }
    }

    pub fn decay(&self) -> f64 {
        match self {
            ConductanceConfig::Exponential { decay, .. }
            | ConductanceConfig::ShotNoise { decay, .. }
            | ConductanceConfig::OrnsteinUhlenbeck { decay, .. } => *decay,
        }
    }

    pub fn g_peak(&self) -> f64 {
        match self {
            ConductanceConfig::Exponential { g_peak, .. }
            | ConductanceConfig::ShotNoise { g_peak, .. }
            | ConductanceConfig::OrnsteinUhlenbeck { g_peak, .. } => *g_peak,
        }
    }

    pub fn reversal(&self) -> f64 {
        match self {
            ConductanceConfig::Exponential { reversal, .. }
            | ConductanceConfig::ShotNoise { reversal, .. }
            | ConductanceConfig::OrnsteinUhlenbeck { reversal, .. } => *reversal,
        }
    }

    /// Driving rate (Hz) of stochastic conductances
    pub fn rate(&self) -> Option<f64> {
        match self {
            ConductanceConfig::Exponential { .. } => None,
            ConductanceConfig::ShotNoise { rate, .. }
            | ConductanceConfig::OrnsteinUhlenbeck { rate, .. } => Some(*rate),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON lines instead of text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl MatsimConfig {
    /// Fastest time constant among the configured components (s)
    ///
    /// For Hodgkin-Huxley this includes the gate relaxation times at `v_rest`.
    pub fn fastest_time_constant(&self) -> Option<f64> {
        let mut constants: Vec<f64> = Vec::new();
        match self.simulation.model {
            ModelKind::Lif => {
                constants.push(self.lif.membrane_resistance * self.lif.membrane_capacitance);
                for mat in &self.thresholds {
                    constants.push(mat.tau1);
                    constants.push(mat.tau2);
                }
            }
            ModelKind::HodgkinHuxley => {
                // Gate kinetics run in ms
                let tau_ms = fastest_gate_time_constant(self.hodgkin_huxley.v_rest);
                constants.push(tau_ms / 1000.0);
            }
        }
        for conductance in &self.conductances {
            constants.push(conductance.decay());
        }
        constants
            .into_iter()
            .filter(|c| c.is_finite() && *c > 0.0)
            .reduce(f64::min)
    }
}
