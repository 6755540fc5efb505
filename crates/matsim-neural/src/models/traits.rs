// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Traits shared by all neuron models

use crate::conductance::Conductance;
use crate::types::Result;

/// A single-compartment neuron driven step by step by a harness
///
/// Implementations own their conductances exclusively, indexed by insertion
/// order. `dt` is always in seconds.
pub trait NeuronModel {
    /// Parameter set describing this model
    type Parameters: ModelParameters;

    /// Human-readable model name
    fn model_name(&self) -> &'static str;

    /// Update conductances, integrate the membrane and advance time by `dt`
    fn timestep(&mut self, dt: f64);

    /// Integrate the membrane only, using the conductances as they are
    fn integrate_voltage(&mut self, dt: f64);

    /// Membrane potential
    fn voltage(&self) -> f64;

    /// Elapsed simulated time (seconds)
    fn time(&self) -> f64;

    /// Model parameters
    fn parameters(&self) -> &Self::Parameters;

    /// Take ownership of a conductance; returns its index
    fn append_conductance(&mut self, conductance: Conductance) -> usize;

    /// Owned conductances in insertion order
    fn conductances(&self) -> &[Conductance];

    /// Mutable access to one conductance (e.g. to `activate()` it)
    fn conductance_mut(&mut self, index: usize) -> Result<&mut Conductance>;

    /// Return to the resting state at `time = 0`
    fn reset(&mut self);

    /// Total synaptic current `Σ g_i (V - E_i)` at the present voltage
    fn synaptic_current(&self) -> f64 {
        let v = self.voltage();
        self.conductances().iter().map(|c| c.current(v)).sum()
    }
}

/// Validation contract for model parameter sets
pub trait ModelParameters {
    /// Reject non-physical parameter values
    fn validate(&self) -> Result<()>;

    /// Number of scalar parameters in the set
    fn parameter_count() -> usize;
}
