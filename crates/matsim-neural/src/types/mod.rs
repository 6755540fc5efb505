// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neural Types Module
//!
//! Type definitions shared by the conductance, threshold and neuron modules.

use core::fmt;

pub mod error;

pub use error::{Error, NeuralError, Result};

/// Conductance process variant (excitatory/inhibitory is set by the reversal potential)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "snake_case"))]
pub enum ConductanceKind {
    Exponential = 0,
    ShotNoise = 1,
    OrnsteinUhlenbeck = 2,
}

impl ConductanceKind {
    /// Whether the process draws from a random stream
    pub fn is_stochastic(self) -> bool {
        !matches!(self, ConductanceKind::Exponential)
    }
}

impl fmt::Display for ConductanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConductanceKind::Exponential => "exponential",
            ConductanceKind::ShotNoise => "shot-noise",
            ConductanceKind::OrnsteinUhlenbeck => "ornstein-uhlenbeck",
        };
        f.write_str(name)
    }
}

/// Refractory state machine of a MAT threshold unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ThresholdState {
    /// Ready to accept a spike
    Quiescent,
    /// Within `refractory_period` of the last accepted spike
    Refractory,
}
