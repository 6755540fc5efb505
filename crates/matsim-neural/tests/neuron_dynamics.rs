// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Neuron Dynamics Test Suite
//!
//! Validates the numerical behaviour of the conductance processes, MAT
//! thresholds and both neuron models over long runs.
//!
//! # Test Coverage Matrix
//!
//! ## Conductances
//! - OU stationary mean and variance
//!
//! ## LIF
//! - Single exponential synaptic event (rise, bound, relaxation)
//! - Spike-frequency adaptation from MAT thresholds
//! - Multiple MAT units and spike merging
//!
//! ## Hodgkin-Huxley
//! - Rest state stays at the fixed point
//! - Strong excitatory conductance produces an action potential
//!
//! ## Independence
//! - Neurons on separate threads reproduce the sequential result

use matsim_neural::{
    Conductance, HhNeuron, LifNeuron, MatThreshold, NeuronModel, SpikeMergePolicy,
    ThresholdCrossingDetector,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// LIF neuron (tau = 10 ms) under a near-constant OU drive settling around -46.7
fn driven_lif(mats: Vec<MatThreshold>, seed: u64) -> LifNeuron {
    let mut neuron = LifNeuron::new(-70.0, 1.0, 0.01, mats).unwrap();
    neuron.append_conductance(
        Conductance::ornstein_uhlenbeck(100_000.0, 0.001, 0.005, 0.0, seed).unwrap(),
    );
    neuron.set_voltage(-70.0 / 1.5);
    neuron
}

fn adapting_unit() -> MatThreshold {
    MatThreshold::new(5.0, 2.0, 0.01, 0.2, -60.0, 0.002, false).unwrap()
}

fn intervals(spikes: &[f64]) -> Vec<f64> {
    spikes.windows(2).map(|w| w[1] - w[0]).collect()
}

// ============================================================================
// SECTION 1: Conductances
// ============================================================================

#[test]
fn test_ou_stationary_statistics() {
    let (rate, g_peak, decay, dt) = (1000.0, 0.01, 0.01, 1e-4);
    let mut c = Conductance::ornstein_uhlenbeck(rate, g_peak, decay, 0.0, 2024).unwrap();
    let mean = c.mean().unwrap();
    let sigma = c.sigma().unwrap();

    let steps = 200_000;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for _ in 0..steps {
        c.update(dt);
        assert!(c.g() >= 0.0);
        sum += c.g();
        sum_sq += c.g() * c.g();
    }
    let average = sum / steps as f64;
    let variance = sum_sq / steps as f64 - average * average;

    assert!(
        (average - mean).abs() < 0.05 * mean,
        "average {} vs mean {}",
        average,
        mean
    );
    assert!(
        (variance - sigma * sigma).abs() < 0.2 * sigma * sigma,
        "variance {} vs {}",
        variance,
        sigma * sigma
    );
}

// ============================================================================
// SECTION 2: LIF
// ============================================================================

#[test]
fn test_lif_single_synaptic_event() {
    let mut neuron = LifNeuron::new(-70.0, 10.0, 1.0, Vec::new()).unwrap();
    let index = neuron.append_conductance(Conductance::exponential(0.5, 2.0, 0.0).unwrap());
    neuron.conductance_mut(index).unwrap().activate();

    let dt = 0.01;
    let mut peak = f64::NEG_INFINITY;
    let mut voltage_at_one = None;
    for step in 1..=8_000 {
        neuron.timestep(dt);
        let t = step as f64 * dt;
        let v = neuron.voltage();

        // Drive is at most g(t) × 70 while V stays in [-70, 0]
        let bound = -70.0 + 87.5 * ((-t / 10.0).exp() - (-t / 2.0).exp());
        assert!(v <= bound + 0.5, "t = {}: V = {} above bound {}", t, v, bound);
        assert!(v <= 0.0);
        assert!(v >= -70.0 - 1e-9);

        if step == 100 {
            voltage_at_one = Some(v);
        }
        peak = peak.max(v);
    }

    assert!(voltage_at_one.unwrap() > -60.0, "voltage should rise sharply");
    assert!(peak > -50.0);
    assert!((neuron.voltage() - -70.0).abs() < 0.5);
}

#[test]
fn test_lif_spike_frequency_adaptation() {
    let mut neuron = driven_lif(vec![adapting_unit()], 11);
    for _ in 0..5_000 {
        neuron.timestep(1e-4);
    }

    let spikes = neuron.thresholds()[0].get_spike_times();
    assert!(spikes.len() > 5, "expected repetitive firing, got {:?}", spikes);

    let isi = intervals(spikes);
    assert!(isi.iter().all(|&d| d >= 0.002));
    let last = isi[isi.len() - 1];
    assert!(
        last > isi[0],
        "intervals should lengthen: first {}, last {}",
        isi[0],
        last
    );
}

#[test]
fn test_lif_identical_units_merge() {
    let mut neuron = driven_lif(vec![adapting_unit(), adapting_unit()], 5);
    for _ in 0..3_000 {
        neuron.timestep(1e-4);
    }

    let trains = neuron.spike_trains();
    assert_eq!(trains[0], trains[1]);

    let union = neuron.merged_spike_times(SpikeMergePolicy::Union, 1e-6);
    let consensus = neuron.merged_spike_times(SpikeMergePolicy::Consensus, 1e-6);
    assert_eq!(union, trains[0].to_vec());
    assert_eq!(consensus, trains[0].to_vec());
}

#[test]
fn test_lif_reset_between_runs() {
    let mut neuron = driven_lif(vec![adapting_unit()], 3);
    for _ in 0..1_000 {
        neuron.timestep(1e-4);
    }
    assert!(!neuron.thresholds()[0].get_spike_times().is_empty());

    neuron.reset_spike_times();
    assert!(neuron.thresholds()[0].get_spike_times().is_empty());
    assert!(neuron.time() > 0.0);

    neuron.reset();
    assert_eq!(neuron.time(), 0.0);
    assert_eq!(neuron.voltage(), -70.0);
}

// ============================================================================
// SECTION 3: Hodgkin-Huxley
// ============================================================================

#[test]
fn test_hh_rest_state() {
    let mut neuron = HhNeuron::new();
    let (m0, h0, n0) = (neuron.m(), neuron.h(), neuron.n());

    // 50 ms at 10 µs
    for _ in 0..5_000 {
        neuron.timestep(1e-5);
        for gate in [neuron.m(), neuron.h(), neuron.n()] {
            assert!((0.0..=1.0).contains(&gate));
        }
    }

    assert!((neuron.voltage() - -65.0).abs() < 0.5, "V = {}", neuron.voltage());
    assert!((neuron.m() - m0).abs() < 0.01);
    assert!((neuron.h() - h0).abs() < 0.01);
    assert!((neuron.n() - n0).abs() < 0.01);
    assert!((neuron.time() - 0.05).abs() < 1e-9);
}

#[test]
fn test_hh_action_potential() {
    let mut neuron = HhNeuron::new();
    let index = neuron.append_conductance(Conductance::exponential(1.0, 0.005, 0.0).unwrap());
    neuron.conductance_mut(index).unwrap().activate();

    let mut detector = ThresholdCrossingDetector::new(0.0);
    let mut peak = f64::NEG_INFINITY;
    for _ in 0..2_000 {
        neuron.timestep(1e-5);
        detector.observe(neuron.time(), neuron.voltage());
        peak = peak.max(neuron.voltage());
        for gate in [neuron.m(), neuron.h(), neuron.n()] {
            assert!((0.0..=1.0).contains(&gate));
        }
    }

    assert!(peak > 0.0, "peak {}", peak);
    assert!(!detector.spike_times().is_empty());
}

// ============================================================================
// SECTION 4: Independence
// ============================================================================

#[test]
fn test_neurons_are_independent_across_threads() {
    let run = |seed: u64| {
        let mut neuron = driven_lif(vec![adapting_unit()], seed);
        for _ in 0..2_000 {
            neuron.timestep(1e-4);
        }
        (neuron.voltage(), neuron.thresholds()[0].get_spike_times().to_vec())
    };

    let sequential: Vec<_> = (0..4).map(run).collect();
    let handles: Vec<_> = (0..4)
        .map(|seed| std::thread::spawn(move || run(seed)))
        .collect();
    let parallel: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(sequential, parallel);
}
