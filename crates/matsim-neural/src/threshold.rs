// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Multi-timescale Adaptive Threshold (MAT)
//!
//! ```text
//! threshold(t) = omega + t1(t) + t2(t)
//!
//! Between spikes:   t1 ← t1 × exp(-dt/tau1),  t2 ← t2 × exp(-dt/tau2)
//! On accepted spike: t1 ← t1 + alpha1,        t2 ← t2 + alpha2
//! ```
//!
//! The unit does not look at the voltage. The owning neuron compares its
//! voltage with `threshold()` and calls `fire(t)`; the unit refuses spikes
//! that fall inside `refractory_period` of the previous one.

use tracing::trace;

use crate::types::error::{ensure_finite, ensure_non_negative, ensure_positive};
use crate::types::{Result, ThresholdState};

/// One adaptive threshold unit with its own spike record
#[derive(Debug, Clone)]
pub struct MatThreshold {
    alpha1: f64,
    alpha2: f64,
    tau1: f64,
    tau2: f64,
    omega: f64,
    refractory_period: f64,
    initially_resetting: bool,

    t1: f64,
    t2: f64,
    threshold: f64,
    time: f64,
    past_spike_time: f64,
    state: ThresholdState,
    spike_times: Vec<f64>,
}

impl MatThreshold {
    /// Create a threshold unit
    ///
    /// With `resetting` set the unit starts refractory, as if it had fired at
    /// `t = 0` (without recording that spike or raising the threshold).
    pub fn new(
        alpha1: f64,
        alpha2: f64,
        tau1: f64,
        tau2: f64,
        omega: f64,
        refractory_period: f64,
        resetting: bool,
    ) -> Result<Self> {
        ensure_finite("alpha1", alpha1)?;
        ensure_finite("alpha2", alpha2)?;
        ensure_positive("tau1", tau1)?;
        ensure_positive("tau2", tau2)?;
        ensure_finite("omega", omega)?;
        ensure_non_negative("refractory_period", refractory_period)?;

        let mut unit = Self {
            alpha1,
            alpha2,
            tau1,
            tau2,
            omega,
            refractory_period,
            initially_resetting: resetting,
            t1: 0.0,
            t2: 0.0,
            threshold: omega,
            time: 0.0,
            past_spike_time: f64::NEG_INFINITY,
            state: ThresholdState::Quiescent,
            spike_times: Vec::new(),
        };
        unit.reset();
        Ok(unit)
    }

    /// Record a spike at time `t`
    ///
    /// A `t` ahead of the unit's clock moves the clock forward first, so the
    /// refractory state and the acceptance test read the same time. Returns
    /// `false` while the unit is refractory at `t`; nothing else changes.
    pub fn fire(&mut self, t: f64) -> bool {
        self.time = self.time.max(t);
        self.refresh_state();
        if !self.is_quiescent() || t - self.past_spike_time < self.refractory_period {
            trace!(t, past = self.past_spike_time, "spike rejected: refractory");
            return false;
        }

        self.spike_times.push(t);
        self.t1 += self.alpha1;
        self.t2 += self.alpha2;
        self.past_spike_time = t;
        self.state = ThresholdState::Refractory;
        self.recompute();
        trace!(t, threshold = self.threshold, "spike recorded");
        true
    }

    /// Advance the threshold dynamics by `dt`
    pub fn update(&mut self, dt: f64) {
        self.time += dt;
        self.t1 *= (-dt / self.tau1).exp();
        self.t2 *= (-dt / self.tau2).exp();
        self.recompute();
        self.refresh_state();
    }

    #[inline]
    fn refresh_state(&mut self) {
        if self.state == ThresholdState::Refractory
            && self.time - self.past_spike_time >= self.refractory_period
        {
            self.state = ThresholdState::Quiescent;
        }
    }

    #[inline]
    fn recompute(&mut self) {
        self.threshold = self.omega + self.t1 + self.t2;
    }

    /// Current threshold `omega + t1 + t2`
    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[inline]
    pub fn state(&self) -> ThresholdState {
        self.state
    }

    /// True while refractory
    #[inline]
    pub fn resetting(&self) -> bool {
        self.state == ThresholdState::Refractory
    }

    #[inline]
    pub fn is_quiescent(&self) -> bool {
        self.state == ThresholdState::Quiescent
    }

    /// Time of the last accepted spike (`-inf` before the first)
    pub fn past_spike_time(&self) -> f64 {
        self.past_spike_time
    }

    /// Unit clock: advanced by `update()`, moved forward by a later `fire(t)`
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn refractory_period(&self) -> f64 {
        self.refractory_period
    }

    /// Fast and slow adaptation components `(t1, t2)`
    pub fn components(&self) -> (f64, f64) {
        (self.t1, self.t2)
    }

    /// Recorded spike times, in firing order
    pub fn get_spike_times(&self) -> &[f64] {
        &self.spike_times
    }

    /// Clear the recorded spike times only
    pub fn reset_spike_times(&mut self) {
        self.spike_times.clear();
    }

    /// Restore the state right after construction, spike record included
    pub fn reset(&mut self) {
        self.t1 = 0.0;
        self.t2 = 0.0;
        self.time = 0.0;
        self.spike_times.clear();
        if self.initially_resetting {
            self.past_spike_time = 0.0;
            self.state = ThresholdState::Refractory;
        } else {
            self.past_spike_time = f64::NEG_INFINITY;
            self.state = ThresholdState::Quiescent;
        }
        self.recompute();
    }
}
