// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Hodgkin-Huxley Neuron Model
//!
//! ## Model Dynamics
//!
//! ```text
//! c_m dV/dt = -(I_Na + I_K + I_L + I_syn)
//!
//! I_Na  = g_Na m³h (V - E_Na)
//! I_K   = g_K n⁴ (V - E_K)
//! I_L   = g_L (V - E_L)
//! I_syn = Σ g_i (V - E_i)
//!
//! dx/dt = α_x(V)(1 - x) - β_x(V) x,   x ∈ {m, h, n}
//! ```
//!
//! Classic squid-axon units: mV, ms, mS/cm², µF/cm², µA/cm². The public `dt`
//! is in seconds like every other model and is converted to milliseconds for
//! the membrane and gate integration. Synaptic conductances attached to this
//! neuron are read in mS/cm².
//!
//! Spikes are not detected here; feed `voltage()` to a
//! [`ThresholdCrossingDetector`](crate::spike_train::ThresholdCrossingDetector).
//! Forward Euler needs `dt` of about 10 µs (1e-5 s) or less.

use tracing::debug;

use super::traits::{ModelParameters, NeuronModel};
use crate::conductance::Conductance;
use crate::types::error::{ensure_finite, ensure_non_negative, ensure_positive};
use crate::types::{NeuralError, Result};

const MS_PER_SECOND: f64 = 1_000.0;

/// Hodgkin-Huxley membrane parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct HhParameters {
    /// Leak conductance (mS/cm²)
    pub g_l: f64,
    /// Leak reversal (mV)
    pub e_l: f64,
    /// Membrane capacitance (µF/cm²)
    pub c_m: f64,
    /// Sodium conductance (mS/cm²)
    pub g_na: f64,
    /// Sodium reversal (mV)
    pub e_na: f64,
    /// Potassium conductance (mS/cm²)
    pub g_k: f64,
    /// Potassium reversal (mV)
    pub e_k: f64,
    /// Initial membrane potential (mV); gates start at steady state here
    pub v_rest: f64,
}

impl Default for HhParameters {
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

impl ModelParameters for HhParameters {
    fn validate(&self) -> Result<()> {
        ensure_non_negative("g_l", self.g_l)?;
        ensure_non_negative("g_na", self.g_na)?;
        ensure_non_negative("g_k", self.g_k)?;
        ensure_positive("c_m", self.c_m)?;
        ensure_finite("e_l", self.e_l)?;
        ensure_finite("e_na", self.e_na)?;
        ensure_finite("e_k", self.e_k)?;
        ensure_finite("v_rest", self.v_rest)
    }

    fn parameter_count() -> usize {
        8
    }
}

/// Voltage-dependent opening/closing rates (1/ms) of one gate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateRates {
    pub alpha: f64,
    pub beta: f64,
}

impl GateRates {
    /// Steady-state open fraction `α / (α + β)`
    #[inline]
    pub fn steady_state(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Relaxation time constant `1 / (α + β)` (ms)
    #[inline]
    pub fn time_constant(&self) -> f64 {
        1.0 / (self.alpha + self.beta)
    }

    /// One Euler step of `dx/dt = α(1 - x) - βx`
    #[inline]
    fn step(&self, x: f64, dt_ms: f64) -> f64 {
        x + dt_ms * (self.alpha * (1.0 - x) - self.beta * x)
    }
}

/// `x / (1 - exp(-x / k))`, continuous through `x = 0`
#[inline]
fn vtrap(x: f64, k: f64) -> f64 {
    if (x / k).abs() < 1e-6 {
        k * (1.0 + x / (2.0 * k))
    } else {
        x / (1.0 - (-x / k).exp())
    }
}

/// Sodium activation rates
pub fn m_rates(v: f64) -> GateRates {
    GateRates {
        alpha: 0.1 * vtrap(v + 40.0, 10.0),
        beta: 4.0 * (-(v + 65.0) / 18.0).exp(),
    }
}

/// Sodium inactivation rates
pub fn h_rates(v: f64) -> GateRates {
    GateRates {
        alpha: 0.07 * (-(v + 65.0) / 20.0).exp(),
        beta: 1.0 / (1.0 + (-(v + 35.0) / 10.0).exp()),
    }
}

/// Potassium activation rates
pub fn n_rates(v: f64) -> GateRates {
    GateRates {
        alpha: 0.01 * vtrap(v + 55.0, 10.0),
        beta: 0.125 * (-(v + 65.0) / 80.0).exp(),
    }
}

/// Shortest of the m, h and n relaxation time constants at `v` (ms)
pub fn fastest_gate_time_constant(v: f64) -> f64 {
    [m_rates(v), h_rates(v), n_rates(v)]
        .iter()
        .map(GateRates::time_constant)
        .fold(f64::INFINITY, f64::min)
}

/// Intrinsic ionic currents (µA/cm²)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IonicCurrents {
    pub sodium: f64,
    pub potassium: f64,
    pub leak: f64,
}

impl IonicCurrents {
    pub fn total(&self) -> f64 {
        self.sodium + self.potassium + self.leak
    }
}

/// Hodgkin-Huxley neuron with synaptic conductance inputs
#[derive(Debug, Clone)]
pub struct HhNeuron {
    params: HhParameters,
    v: f64,
    m: f64,
    h: f64,
    n: f64,
    time: f64,
    conductances: Vec<Conductance>,
}

impl HhNeuron {
    /// Neuron with the classic squid-axon parameters, at rest
    pub fn new() -> Self {
        Self::at_rest(HhParameters::default())
    }

    pub fn with_parameters(params: HhParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self::at_rest(params))
    }

    fn at_rest(params: HhParameters) -> Self {
        let v = params.v_rest;
        debug!(v_rest = v, g_na = params.g_na, g_k = params.g_k, "created HH neuron");
        Self {
            params,
            v,
            m: m_rates(v).steady_state(),
            h: h_rates(v).steady_state(),
            n: n_rates(v).steady_state(),
            time: 0.0,
            conductances: Vec::new(),
        }
    }

    /// Sodium activation
    #[inline]
    pub fn m(&self) -> f64 {
        self.m
    }

    /// Sodium inactivation
    #[inline]
    pub fn h(&self) -> f64 {
        self.h
    }

    /// Potassium activation
    #[inline]
    pub fn n(&self) -> f64 {
        self.n
    }

    /// Override the membrane potential; gates keep their values
    pub fn set_voltage(&mut self, v: f64) {
        self.v = v;
    }

    pub fn ionic_currents(&self) -> IonicCurrents {
        let p = &self.params;
        IonicCurrents {
            sodium: p.g_na * self.m.powi(3) * self.h * (self.v - p.e_na),
            potassium: p.g_k * self.n.powi(4) * (self.v - p.e_k),
            leak: p.g_l * (self.v - p.e_l),
        }
    }
}

impl Default for HhNeuron {
    fn default() -> Self {
        Self::new()
    }
}

impl NeuronModel for HhNeuron {
    type Parameters = HhParameters;

    fn model_name(&self) -> &'static str {
        "Hodgkin-Huxley (HH)"
    }

    fn timestep(&mut self, dt: f64) {
        for conductance in &mut self.conductances {
            conductance.update(dt);
        }
        self.integrate_voltage(dt);
    }

    fn integrate_voltage(&mut self, dt: f64) {
        let dt_ms = dt * MS_PER_SECOND;
        let v = self.v;

        let total = self.ionic_currents().total() + self.synaptic_current();
        let (m_rate, h_rate, n_rate) = (m_rates(v), h_rates(v), n_rates(v));

        self.v = v - dt_ms * total / self.params.c_m;
        self.m = m_rate.step(self.m, dt_ms);
        self.h = h_rate.step(self.h, dt_ms);
        self.n = n_rate.step(self.n, dt_ms);
        self.time += dt;
    }

    #[inline]
    fn voltage(&self) -> f64 {
        self.v
    }

    #[inline]
    fn time(&self) -> f64 {
        self.time
    }

    fn parameters(&self) -> &HhParameters {
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
        let conductances = core::mem::take(&mut self.conductances);
        *self = Self::at_rest(self.params);
        self.conductances = conductances;
        for conductance in &mut self.conductances {
            conductance.reset();
        }
    }
}
