// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Single-Compartment Neuron Simulation Core
//!
//! ALL numerical integration in one place:
//! - **Conductance**: synaptic drive (exponential, shot noise, Ornstein-Uhlenbeck)
//! - **Threshold**: multi-timescale adaptive threshold (MAT) units
//! - **Models**: LIF with MAT thresholds, Hodgkin-Huxley
//! - **Spike trains**: merging per-unit records, threshold-crossing detection
//!
//! ## Driving a neuron
//!
//! ```
//! use matsim_neural::{Conductance, LifNeuron, MatThreshold, NeuronModel};
//!
//! let mat = MatThreshold::new(15.0, 3.0, 0.01, 0.2, -55.0, 0.002, false)?;
//! let mut neuron = LifNeuron::new(-70.0, 1.0, 0.01, vec![mat])?;
//! neuron.append_conductance(Conductance::ornstein_uhlenbeck(2000.0, 0.05, 0.005, 0.0, 7)?);
//!
//! for _ in 0..10_000 {
//!     neuron.timestep(1e-4);
//! }
//! let spikes = neuron.thresholds()[0].get_spike_times();
//! assert!(!spikes.is_empty());
//! assert!(spikes.windows(2).all(|w| w[1] - w[0] >= 0.002));
//! # Ok::<(), matsim_neural::NeuralError>(())
//! ```
//!
//! ## Concurrency
//!
//! Everything is synchronous and single-threaded. A neuron, its conductances
//! and its thresholds form one mutation domain; stochastic conductances carry
//! their own seeded random stream, so independent neurons can run on separate
//! threads and stay reproducible.
//!
//! ## Time step
//!
//! All models use forward Euler (the OU conductance uses its exact update).
//! Choose `dt` well below the fastest time constant in the neuron; nothing
//! checks this at runtime.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Core type definitions
pub mod types;

// Synaptic drive and spike rule
pub mod conductance;
pub mod threshold;

// Neuron models
pub mod models;

pub mod spike_train;

// Re-export types
pub use types::{ConductanceKind, Error, NeuralError, Result, ThresholdState};

pub use conductance::Conductance;
pub use threshold::MatThreshold;

// Re-export neuron models
pub use models::{
    HhNeuron, HhParameters, LifNeuron, LifParameters, ModelParameters, NeuronModel,
};

pub use spike_train::{merge_spike_trains, SpikeMergePolicy, ThresholdCrossingDetector};
