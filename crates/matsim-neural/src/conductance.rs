// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Synaptic Conductances
//!
//! A conductance drives the membrane with `I = g × (V - reversal)`. Three
//! processes share one value type and differ only in how `g` advances:
//!
//! ```text
//! Exponential:
//!     g ← (g + g_peak·[activated]) × exp(-dt/decay)
//!
//! Shot noise:
//!     k ~ Poisson(rate × dt)
//!     g ← (g + k × g_peak) × exp(-dt/decay)
//!
//! Ornstein-Uhlenbeck:
//!     A = exp(-dt/decay)
//!     g ← mean + (g - mean)·A + sigma·sqrt(1 - A²)·N(0, 1)
//!
//!     mean  = rate × g_peak × decay
//!     sigma = sqrt(rate × g_peak² × decay / 2)
//! ```
//!
//! The OU process is the diffusion limit of the shot-noise process with the
//! same `(rate, g_peak, decay)`, so both have the same stationary mean and
//! variance. For small `dt` its update is the Euler–Maruyama step
//! `g + (mean - g)·dt/decay + D·sqrt(dt)·N(0, 1)` with `D = sigma·sqrt(2/decay)`.
//!
//! `dt` is in seconds. Keep `dt` well below `decay`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Poisson, StandardNormal};
use tracing::debug;

use crate::types::error::{ensure_finite, ensure_non_negative, ensure_positive};
use crate::types::{ConductanceKind, NeuralError, Result};

/// Variant-specific state
#[derive(Debug, Clone)]
enum Process {
    Exponential,
    ShotNoise {
        rate: f64,
        rng: StdRng,
    },
    OrnsteinUhlenbeck {
        rate: f64,
        mean: f64,
        sigma: f64,
        diffusion: f64,
        rng: StdRng,
    },
}

/// Time-varying synaptic conductance
#[derive(Debug, Clone)]
pub struct Conductance {
    g: f64,
    reversal: f64,
    g_peak: f64,
    decay: f64,
    /// Set by `activate()`, consumed by the next `update()`
    pending_activation: bool,
    spike_activated: bool,
    process: Process,
}

impl Conductance {
    /// Deterministic conductance that jumps by `g_peak` on `activate()`
    pub fn exponential(g_peak: f64, decay: f64, reversal: f64) -> Result<Self> {
        validate_common(g_peak, decay, reversal)?;
        debug!(g_peak, decay, reversal, "created exponential conductance");
        Ok(Self::with_process(g_peak, decay, reversal, 0.0, Process::Exponential))
    }

    /// Conductance driven by Poisson arrivals at `rate` (Hz)
    pub fn shot_noise(rate: f64, g_peak: f64, decay: f64, reversal: f64, seed: u64) -> Result<Self> {
        validate_common(g_peak, decay, reversal)?;
        ensure_non_negative("rate", rate)?;
        debug!(rate, g_peak, decay, reversal, seed, "created shot-noise conductance");
        let process = Process::ShotNoise {
            rate,
            rng: StdRng::seed_from_u64(seed),
        };
        Ok(Self::with_process(g_peak, decay, reversal, 0.0, process))
    }

    /// Ornstein-Uhlenbeck conductance with the statistics of shot noise at `rate` (Hz)
    ///
    /// Starts at the stationary mean.
    pub fn ornstein_uhlenbeck(
        rate: f64,
        g_peak: f64,
        decay: f64,
        reversal: f64,
        seed: u64,
    ) -> Result<Self> {
        validate_common(g_peak, decay, reversal)?;
        ensure_non_negative("rate", rate)?;
        let (mean, sigma, diffusion) = ou_statistics(rate, g_peak, decay);
        debug!(rate, g_peak, decay, reversal, seed, mean, sigma, "created OU conductance");
        let process = Process::OrnsteinUhlenbeck {
            rate,
            mean,
            sigma,
            diffusion,
            rng: StdRng::seed_from_u64(seed),
        };
        Ok(Self::with_process(g_peak, decay, reversal, mean, process))
    }

    fn with_process(g_peak: f64, decay: f64, reversal: f64, g: f64, process: Process) -> Self {
        Self {
            g,
            reversal,
            g_peak,
            decay,
            pending_activation: false,
            spike_activated: false,
            process,
        }
    }

    /// Advance the conductance by `dt` seconds
    pub fn update(&mut self, dt: f64) {
        let decay_factor = self.get_a(dt);
        let activated = core::mem::take(&mut self.pending_activation);

        match &mut self.process {
            Process::Exponential => {
                if activated {
                    self.g += self.g_peak;
                }
                self.g *= decay_factor;
                self.spike_activated = activated;
            }
            Process::ShotNoise { rate, rng } => {
                let arrivals = poisson_arrivals(*rate * dt, rng) + u64::from(activated);
                self.g += arrivals as f64 * self.g_peak;
                self.g *= decay_factor;
                self.spike_activated = arrivals > 0;
            }
            Process::OrnsteinUhlenbeck {
                mean, sigma, rng, ..
            } => {
                if activated {
                    self.g += self.g_peak;
                }
                let noise: f64 = StandardNormal.sample(rng);
                let spread = *sigma * (1.0 - decay_factor * decay_factor).sqrt();
                let next = *mean + (self.g - *mean) * decay_factor + spread * noise;
                self.g = next.max(0.0);
                self.spike_activated = activated;
            }
        }
    }

    /// Exact single-step decay weight `exp(-dt/decay)`
    pub fn get_a(&self, dt: f64) -> f64 {
        (-dt / self.decay).exp()
    }

    /// Signal a presynaptic spike; applied on the next `update()`
    pub fn activate(&mut self) {
        self.pending_activation = true;
    }

    /// Change the driving rate of a stochastic conductance
    pub fn set_rate(&mut self, new_rate: f64) -> Result<()> {
        ensure_non_negative("rate", new_rate)?;
        let (g_peak, decay) = (self.g_peak, self.decay);
        match &mut self.process {
            Process::Exponential => {
                return Err(NeuralError::RateNotSupported {
                    kind: ConductanceKind::Exponential,
                })
            }
            Process::ShotNoise { rate, .. } => *rate = new_rate,
            Process::OrnsteinUhlenbeck {
                rate,
                mean,
                sigma,
                diffusion,
                ..
            } => {
                *rate = new_rate;
                (*mean, *sigma, *diffusion) = ou_statistics(new_rate, g_peak, decay);
            }
        }
        debug!(kind = %self.kind(), rate = new_rate, "conductance rate changed");
        Ok(())
    }

    /// Current conductance magnitude
    #[inline]
    pub fn g(&self) -> f64 {
        self.g
    }

    /// Reversal potential
    #[inline]
    pub fn reversal(&self) -> f64 {
        self.reversal
    }

    #[inline]
    pub fn g_peak(&self) -> f64 {
        self.g_peak
    }

    #[inline]
    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Whether the last `update()` applied at least one discrete jump
    #[inline]
    pub fn spike_activated(&self) -> bool {
        self.spike_activated
    }

    /// Driving rate, `None` for exponential conductances
    pub fn rate(&self) -> Option<f64> {
        match &self.process {
            Process::Exponential => None,
            Process::ShotNoise { rate, .. } | Process::OrnsteinUhlenbeck { rate, .. } => {
                Some(*rate)
            }
        }
    }

    /// Stationary mean of the OU process
    pub fn mean(&self) -> Option<f64> {
        match &self.process {
            Process::OrnsteinUhlenbeck { mean, .. } => Some(*mean),
            _ => None,
        }
    }

    /// Stationary standard deviation of the OU process
    pub fn sigma(&self) -> Option<f64> {
        match &self.process {
            Process::OrnsteinUhlenbeck { sigma, .. } => Some(*sigma),
            _ => None,
        }
    }

    /// Euler–Maruyama diffusion coefficient `D` of the OU process
    pub fn diffusion(&self) -> Option<f64> {
        match &self.process {
            Process::OrnsteinUhlenbeck { diffusion, .. } => Some(*diffusion),
            _ => None,
        }
    }

    pub fn kind(&self) -> ConductanceKind {
        match self.process {
            Process::Exponential => ConductanceKind::Exponential,
            Process::ShotNoise { .. } => ConductanceKind::ShotNoise,
            Process::OrnsteinUhlenbeck { .. } => ConductanceKind::OrnsteinUhlenbeck,
        }
    }

    /// Synaptic current at `voltage`
    #[inline]
    pub fn current(&self, voltage: f64) -> f64 {
        self.g * (voltage - self.reversal)
    }

    /// Return to the initial magnitude; random streams keep their position
    pub fn reset(&mut self) {
        self.g = self.mean().unwrap_or(0.0);
        self.pending_activation = false;
        self.spike_activated = false;
    }
}

fn validate_common(g_peak: f64, decay: f64, reversal: f64) -> Result<()> {
    ensure_non_negative("g_peak", g_peak)?;
    ensure_positive("decay", decay)?;
    ensure_finite("reversal", reversal)
}

/// `(mean, sigma, diffusion)` of the OU process matching shot noise at `rate`
fn ou_statistics(rate: f64, g_peak: f64, decay: f64) -> (f64, f64, f64) {
    let mean = rate * g_peak * decay;
    let sigma = (rate * g_peak * g_peak * decay / 2.0).sqrt();
    let diffusion = sigma * (2.0 / decay).sqrt();
    (mean, sigma, diffusion)
}

fn poisson_arrivals(lambda: f64, rng: &mut StdRng) -> u64 {
    if lambda <= 0.0 {
        return 0;
    }
    match Poisson::new(lambda) {
        Ok(dist) => {
            let count: f64 = dist.sample(rng);
            count as u64
        }
        Err(_) => 0,
    }
}
