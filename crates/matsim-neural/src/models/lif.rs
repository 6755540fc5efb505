// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # LIF (Leaky Integrate-and-Fire) Neuron Model
//!
//! Conductance-driven LIF neuron whose spikes are decided by MAT threshold units.
//!
//! ## Model Dynamics
//!
//! ```text
//! Synaptic current (per conductance):
//!     I_i = g_i × (V - E_i)
//!
//! Membrane Potential Update (explicit Euler):
//!     tau = R × C
//!     V(t+dt) = V(t) + dt × [ (V_rest - V(t)) / tau - Σ I_i / C ]
//!
//! Firing Check (per MAT unit, after the unit's own update):
//!     if unit is quiescent and V(t+dt) ≥ unit.threshold:
//!         unit.fire(t+dt)
//! ```
//!
//! The voltage is never reset: MAT neurons signal spikes through their
//! thresholds alone. Each unit keeps its own spike record; combining the
//! records into one train is the caller's choice (see
//! [`merged_spike_times`](LifNeuron::merged_spike_times)).
//!
//! Euler integration is stable only for `dt` well below the fastest time
//! constant among `tau`, conductance decays and threshold `tau1`/`tau2`.

use tracing::{debug, trace};

use super::traits::{ModelParameters, NeuronModel};
use crate::conductance::Conductance;
use crate::spike_train::{merge_spike_trains, SpikeMergePolicy};
use crate::threshold::MatThreshold;
use crate::types::error::{ensure_finite, ensure_positive};
use crate::types::{NeuralError, Result};

/// LIF model-specific parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct LifParameters {
    /// Resting potential: baseline membrane potential when no input
    pub resting_potential: f64,

    /// Membrane resistance R
    pub membrane_resistance: f64,

    /// Membrane capacitance C
    pub membrane_capacitance: f64,
}

impl LifParameters {
    /// Create LIF parameters with custom values
    pub fn with_values(
        resting_potential: f64,
        membrane_resistance: f64,
        membrane_capacitance: f64,
    ) -> Self {
        Self {
            resting_potential,
            membrane_resistance,
            membrane_capacitance,
        }
    }

    /// Membrane time constant `R × C`
    #[inline]
    pub fn time_constant(&self) -> f64 {
        self.membrane_resistance * self.membrane_capacitance
    }
}

impl Default for LifParameters {
    fn default() -> Self {
        Self {
            resting_potential: -70.0,
            membrane_resistance: 10.0,
            membrane_capacitance: 1.0,
        }
    }
}

impl ModelParameters for LifParameters {
    fn validate(&self) -> Result<()> {
        ensure_finite("resting_potential", self.resting_potential)?;
        ensure_positive("membrane_resistance", self.membrane_resistance)?;
        ensure_positive("membrane_capacitance", self.membrane_capacitance)?;
        ensure_positive("time_constant", self.time_constant())
    }

    fn parameter_count() -> usize {
        3 // resting_potential + membrane_resistance + membrane_capacitance
    }
}

/// LIF neuron with conductance inputs and MAT thresholds
#[derive(Debug, Clone)]
pub struct LifNeuron {
    params: LifParameters,
    time_constant: f64,
    voltage: f64,
    time: f64,
    conductances: Vec<Conductance>,
    mats: Vec<MatThreshold>,
    fired_last_step: Vec<usize>,
}

impl LifNeuron {
    /// Create a neuron at rest with the given threshold units
    pub fn new(
        resting_potential: f64,
        membrane_resistance: f64,
        membrane_capacitance: f64,
        thresholds: Vec<MatThreshold>,
    ) -> Result<Self> {
        Self::with_parameters(
            LifParameters::with_values(
                resting_potential,
                membrane_resistance,
                membrane_capacitance,
            ),
            thresholds,
        )
    }

    pub fn with_parameters(params: LifParameters, thresholds: Vec<MatThreshold>) -> Result<Self> {
        params.validate()?;
        debug!(
            resting = params.resting_potential,
            tau = params.time_constant(),
            mats = thresholds.len(),
            "created LIF neuron"
        );
        Ok(Self {
            params,
            time_constant: params.time_constant(),
            voltage: params.resting_potential,
            time: 0.0,
            conductances: Vec::new(),
            mats: thresholds,
            fired_last_step: Vec::new(),
        })
    }

    /// Membrane time constant `R × C`
    #[inline]
    pub fn time_constant(&self) -> f64 {
        self.time_constant
    }

    /// Override the membrane potential (e.g. to start away from rest)
    pub fn set_voltage(&mut self, voltage: f64) {
        self.voltage = voltage;
    }

    pub fn thresholds(&self) -> &[MatThreshold] {
        &self.mats
    }

    pub fn threshold_mut(&mut self, index: usize) -> Result<&mut MatThreshold> {
        let len = self.mats.len();
        self.mats
            .get_mut(index)
            .ok_or(NeuralError::ThresholdIndexOutOfRange { index, len })
    }

    /// Indices of the threshold units that fired during the last `timestep`
    pub fn fired_last_step(&self) -> &[usize] {
        &self.fired_last_step
    }

    /// Per-unit spike records, in threshold order
    pub fn spike_trains(&self) -> Vec<&[f64]> {
        self.mats.iter().map(|m| m.get_spike_times()).collect()
    }

    /// Combine the per-unit spike records into one train
    pub fn merged_spike_times(&self, policy: SpikeMergePolicy, tolerance: f64) -> Vec<f64> {
        merge_spike_trains(&self.spike_trains(), policy, tolerance)
    }

    /// Clear every unit's spike record, keeping the dynamic state
    pub fn reset_spike_times(&mut self) {
        for mat in &mut self.mats {
            mat.reset_spike_times();
        }
    }
}

impl NeuronModel for LifNeuron {
    type Parameters = LifParameters;

    fn model_name(&self) -> &'static str {
        "Leaky Integrate-and-Fire (LIF) with MAT thresholds"
    }

    fn timestep(&mut self, dt: f64) {
        for conductance in &mut self.conductances {
            conductance.update(dt);
        }

        self.integrate_voltage(dt);

        self.fired_last_step.clear();
        for (index, mat) in self.mats.iter_mut().enumerate() {
            mat.update(dt);
            if mat.is_quiescent() && self.voltage >= mat.threshold() && mat.fire(self.time) {
                trace!(unit = index, t = self.time, v = self.voltage, "LIF spike");
                self.fired_last_step.push(index);
            }
        }
    }

    /// Membrane Euler step only
    ///
    /// The MAT units keep their own clocks and are advanced only by
    /// `timestep`, so after calls to this method `thresholds()[i].time()`
    /// lags `time()`.
    #[inline]
    fn integrate_voltage(&mut self, dt: f64) {
        let synaptic = self.synaptic_current();
        let leak = (self.params.resting_potential - self.voltage) / self.time_constant;
        self.voltage += dt * (leak - synaptic / self.params.membrane_capacitance);
        self.time += dt;
    }

    #[inline]
    fn voltage(&self) -> f64 {
        self.voltage
    }

    #[inline]
    fn time(&self) -> f64 {
        self.time
    }

    fn parameters(&self) -> &LifParameters {
        &self.params
    }

    fn append_conductance(&mut self, conductance: Conductance) -> usize {
        self.conductances.push(conductance);
        self.conductances.len() - 1
    }

    fn conductances(&self) -> &[Conductance] {
        &self.conductances
    }

    fn conductance_mut(&mut self, index: usize) -> Result<&mut Conductance> {
        let len = self.conductances.len();
        self.conductances
            .get_mut(index)
            .ok_or(NeuralError::ConductanceIndexOutOfRange { index, len })
    }

    fn reset(&mut self) {
        self.voltage = self.params.resting_potential;
        self.time = 0.0;
        self.fired_last_step.clear();
        for conductance in &mut self.conductances {
            conductance.reset();
        }
        for mat in &mut self.mats {
            mat.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_neuron() -> LifNeuron {
        LifNeuron::new(-70.0, 10.0, 1.0, Vec::new()).unwrap()
    }

    #[test]
    fn test_lif_parameters_validation() {
        let params_valid = LifParameters::with_values(-70.0, 10.0, 1.0);
        assert!(params_valid.validate().is_ok());
        assert_eq!(params_valid.time_constant(), 10.0);

        let params_invalid = LifParameters::with_values(-70.0, 0.0, 1.0);
        assert!(params_invalid.validate().is_err());

        let params_invalid = LifParameters::with_values(f64::NAN, 10.0, 1.0);
        assert!(params_invalid.validate().is_err());
    }

    #[test]
    fn test_lif_membrane_potential_update() {
        let mut neuron = quiet_neuron();
        neuron.set_voltage(-60.0);
        neuron.integrate_voltage(0.1);
        // Expected: -60 + 0.1 × (-70 + 60) / 10 = -60.1
        assert!((neuron.voltage() - -60.1).abs() < 1e-12);
        assert!((neuron.time() - 0.1).abs() < 1e-15);
    }

    #[test]
    fn test_lif_relaxes_to_rest() {
        let mut neuron = quiet_neuron();
        neuron.set_voltage(-50.0);
        let dt = 0.001;
        for step in 1..=50_000 {
            neuron.timestep(dt);
            if step % 5_000 == 0 {
                let t = neuron.time();
                let expected = -70.0 + 20.0 * (-t / 10.0).exp();
                assert!(
                    (neuron.voltage() - expected).abs() < 0.01,
                    "t = {}: V = {}, expected {}",
                    t,
                    neuron.voltage(),
                    expected
                );
            }
        }
        assert!((neuron.voltage() - -70.0).abs() < 0.2);
    }

    #[test]
    fn test_lif_firing_condition() {
        let mat = MatThreshold::new(5.0, 1.0, 0.5, 5.0, -60.0, 1.0, false).unwrap();
        let mut neuron = LifNeuron::new(-70.0, 10.0, 1.0, vec![mat]).unwrap();

        // Below threshold: no spike
        neuron.set_voltage(-65.0);
        neuron.timestep(0.01);
        assert!(neuron.fired_last_step().is_empty());

        // Above threshold: fires once, then refractory
        neuron.set_voltage(-50.0);
        neuron.timestep(0.01);
        assert_eq!(neuron.fired_last_step(), &[0]);
        neuron.set_voltage(-40.0);
        neuron.timestep(0.01);
        assert!(neuron.fired_last_step().is_empty());
        assert_eq!(neuron.thresholds()[0].get_spike_times().len(), 1);
    }

    #[test]
    fn test_integrate_voltage_leaves_thresholds() {
        let mat = MatThreshold::new(5.0, 1.0, 0.5, 5.0, -60.0, 1.0, false).unwrap();
        let mut neuron = LifNeuron::new(-70.0, 10.0, 1.0, vec![mat]).unwrap();

        neuron.integrate_voltage(0.01);
        assert_eq!(neuron.time(), 0.01);
        assert_eq!(neuron.thresholds()[0].time(), 0.0);

        neuron.timestep(0.01);
        assert_eq!(neuron.thresholds()[0].time(), 0.01);
        assert!(neuron.thresholds()[0].time() < neuron.time());
    }

    #[test]
    fn test_lif_conductance_index() {
        let mut neuron = quiet_neuron();
        let first = neuron.append_conductance(Conductance::exponential(0.5, 2.0, 0.0).unwrap());
        let second = neuron.append_conductance(Conductance::exponential(0.5, 2.0, -80.0).unwrap());
        assert_eq!((first, second), (0, 1));
        assert!(neuron.conductance_mut(1).is_ok());
        assert!(matches!(
            neuron.conductance_mut(2),
            Err(NeuralError::ConductanceIndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_lif_reset() {
        let mat = MatThreshold::new(5.0, 1.0, 0.5, 5.0, -60.0, 1.0, false).unwrap();
        let mut neuron = LifNeuron::new(-70.0, 10.0, 1.0, vec![mat]).unwrap();
        neuron.set_voltage(-40.0);
        neuron.timestep(0.01);
        assert_eq!(neuron.thresholds()[0].get_spike_times().len(), 1);

        neuron.reset();
        assert_eq!(neuron.voltage(), -70.0);
        assert_eq!(neuron.time(), 0.0);
        assert!(neuron.thresholds()[0].get_spike_times().is_empty());
        assert_eq!(neuron.thresholds()[0].threshold(), -60.0);
    }
}
