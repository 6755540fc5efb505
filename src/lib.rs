// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # matsim - single-neuron simulation core
//!
//! Conductance-driven leaky integrate-and-fire neurons with multi-timescale
//! adaptive thresholds (MAT), and a Hodgkin-Huxley reference model, both fed
//! by deterministic or stochastic synaptic conductances.
//!
//! ## Crates
//!
//! - [`neural`] (`matsim-neural`): conductances, MAT thresholds, LIF and HH
//! - [`config`] (`matsim-config`): TOML configuration with env and CLI overrides
//! - [`observability`] (`matsim-observability`): logging setup and debug flags
//!
//! ## Usage
//!
//! Driving a model by hand:
//!
//! ```rust
//! use matsim::prelude::*;
//!
//! let mat = MatThreshold::new(15.0, 3.0, 0.01, 0.2, -55.0, 0.002, false)?;
//! let mut neuron = LifNeuron::new(-70.0, 1.0, 0.01, vec![mat])?;
//! let input = neuron.append_conductance(Conductance::exponential(5.0, 0.005, 0.0)?);
//!
//! neuron.conductance_mut(input)?.activate();
//! for _ in 0..1_000 {
//!     neuron.timestep(1e-4);
//! }
//! assert!(neuron.time() > 0.099);
//! # Ok::<(), matsim::neural::NeuralError>(())
//! ```
//!
//! Running a configured experiment:
//!
//! ```rust
//! use matsim::config::{ConductanceConfig, MatThresholdConfig, MatsimConfig};
//! use matsim::runner;
//!
//! let mut config = MatsimConfig::default();
//! config.simulation.duration = 0.2;
//! config.thresholds.push(MatThresholdConfig::default());
//! config.conductances.push(ConductanceConfig::OrnsteinUhlenbeck {
//!     rate: 2000.0,
//!     g_peak: 0.05,
//!     decay: 0.005,
//!     reversal: 0.0,
//! });
//!
//! let report = runner::run(&config)?;
//! assert_eq!(report.trials.len(), 1);
//! # Ok::<(), matsim::runner::RunnerError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`file-logging`**: JSON log files in timestamped run folders

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export member crates
pub use matsim_config as config;
pub use matsim_neural as neural;
pub use matsim_observability as observability;

pub mod runner;

/// Commonly used types
pub mod prelude {
    pub use matsim_neural::{
        merge_spike_trains, Conductance, ConductanceKind, HhNeuron, HhParameters, LifNeuron,
        LifParameters, MatThreshold, ModelParameters, NeuralError, NeuronModel, SpikeMergePolicy,
        ThresholdCrossingDetector, ThresholdState,
    };

    pub use matsim_config::{load_config, validate_config, MatsimConfig, ModelKind};

    pub use crate::runner::{run, RunReport, RunnerError, TrialReport};
}
