// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for neuron model operations

use super::ConductanceKind;

/// Error types for neuron model operations
///
/// Only configuration problems are errors. A `fire` call rejected by the
/// refractory window is model behaviour and is reported through its return
/// value instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NeuralError {
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("{kind} conductance has no driving rate")]
    RateNotSupported { kind: ConductanceKind },

    #[error("Conductance index {index} out of range (neuron owns {len})")]
    ConductanceIndexOutOfRange { index: usize, len: usize },

    #[error("Threshold index {index} out of range (neuron owns {len})")]
    ThresholdIndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = core::result::Result<T, NeuralError>;
pub type Error = NeuralError;

/// Reject non-finite values
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(NeuralError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        })
    }
}

/// Reject values that are not finite and strictly positive
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    ensure_finite(name, value)?;
    if value <= 0.0 {
        return Err(NeuralError::InvalidParameter {
            name,
            value,
            reason: "must be > 0",
        });
    }
    Ok(())
}

/// Reject values that are not finite and non-negative
pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> Result<()> {
    ensure_finite(name, value)?;
    if value < 0.0 {
        return Err(NeuralError::InvalidParameter {
            name,
            value,
            reason: "must be >= 0",
        });
    }
    Ok(())
}
