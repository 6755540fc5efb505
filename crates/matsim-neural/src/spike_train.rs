// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spike train utilities
//!
//! A LIF neuron with several MAT units keeps one spike record per unit, and
//! an HH neuron has no spike record at all. These helpers turn either into a
//! single canonical train.

/// How per-unit spike records combine into one train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "snake_case"))]
pub enum SpikeMergePolicy {
    /// A spike from any unit counts
    #[default]
    Union,
    /// A spike counts only if every unit fired within the tolerance
    Consensus,
}

/// Merge spike records according to `policy`
///
/// Inputs must be sorted ascending (as recorded by `MatThreshold`). Under
/// `Union`, spikes closer than `tolerance` to the previously kept spike are
/// collapsed into it. Under `Consensus`, the times of the first train are
/// kept when each other train has a spike within `tolerance`.
///
/// # Example
/// ```
/// use matsim_neural::spike_train::{merge_spike_trains, SpikeMergePolicy};
///
/// let a: &[f64] = &[0.010, 0.050];
/// let b: &[f64] = &[0.010, 0.030];
///
/// let union = merge_spike_trains(&[a, b], SpikeMergePolicy::Union, 1e-6);
/// assert_eq!(union, vec![0.010, 0.030, 0.050]);
///
/// let both = merge_spike_trains(&[a, b], SpikeMergePolicy::Consensus, 1e-6);
/// assert_eq!(both, vec![0.010]);
/// ```
pub fn merge_spike_trains(trains: &[&[f64]], policy: SpikeMergePolicy, tolerance: f64) -> Vec<f64> {
    match policy {
        SpikeMergePolicy::Union => {
            let mut all: Vec<f64> = trains.iter().flat_map(|t| t.iter().copied()).collect();
            all.sort_by(|a, b| a.total_cmp(b));

            let mut merged: Vec<f64> = Vec::with_capacity(all.len());
            for t in all {
                match merged.last() {
                    Some(&last) if t - last <= tolerance => {}
                    _ => merged.push(t),
                }
            }
            merged
        }
        SpikeMergePolicy::Consensus => {
            let Some((first, rest)) = trains.split_first() else {
                return Vec::new();
            };
            first
                .iter()
                .copied()
                .filter(|&t| rest.iter().all(|other| has_spike_near(other, t, tolerance)))
                .collect()
        }
    }
}

/// Whether the sorted `train` holds a spike within `tolerance` of `t`
fn has_spike_near(train: &[f64], t: f64, tolerance: f64) -> bool {
    let start = train.partition_point(|&s| s < t - tolerance);
    train.get(start).is_some_and(|&s| s <= t + tolerance)
}

/// Upward threshold-crossing spike detector for a sampled voltage trace
///
/// Each crossing from below `threshold` to at or above it records one spike
/// at the sample time.
#[derive(Debug, Clone)]
pub struct ThresholdCrossingDetector {
    threshold: f64,
    last_voltage: Option<f64>,
    spike_times: Vec<f64>,
}

impl ThresholdCrossingDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last_voltage: None,
            spike_times: Vec::new(),
        }
    }

    /// Feed one sample; returns true when it completes an upward crossing
    pub fn observe(&mut self, time: f64, voltage: f64) -> bool {
        let crossed = matches!(self.last_voltage, Some(prev) if prev < self.threshold)
            && voltage >= self.threshold;
        if crossed {
            self.spike_times.push(time);
        }
        self.last_voltage = Some(voltage);
        crossed
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn spike_times(&self) -> &[f64] {
        &self.spike_times
    }

    pub fn reset(&mut self) {
        self.last_voltage = None;
        self.spike_times.clear();
    }
}
