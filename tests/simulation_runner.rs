// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end runs: configuration in, spike report out.

use std::io::Write;

use matsim::config::{
    load_config, ConductanceConfig, MatThresholdConfig, MatsimConfig, MergePolicyConfig, ModelKind,
};
use matsim::runner::{self, RunnerError};

/// The single-event LIF experiment: tau = 10, one exponential input at t = 0
fn single_event_config() -> MatsimConfig {
    let mut config = MatsimConfig::default();
    config.simulation.dt = 0.01;
    config.simulation.duration = 80.0;
    config.simulation.record_trace = true;
    config.simulation.trace_stride = 1;
    config.lif.membrane_resistance = 10.0;
    config.lif.membrane_capacitance = 1.0;
    // Out of reach: V stays below the 0 mV reversal
    config.thresholds.push(MatThresholdConfig {
        alpha1: 1.0,
        alpha2: 1.0,
        tau1: 1.0,
        tau2: 5.0,
        omega: 0.0,
        refractory_period: 0.002,
        resetting: false,
    });
    config.conductances.push(ConductanceConfig::Exponential {
        g_peak: 0.5,
        decay: 2.0,
        reversal: 0.0,
        activation_times: vec![0.0],
    });
    config
}

/// Tonic firing under OU background drive
fn driven_config(seed: u64, trials: usize) -> MatsimConfig {
    let mut config = MatsimConfig::default();
    config.simulation.duration = 0.5;
    config.simulation.seed = seed;
    config.simulation.trials = trials;
    config.thresholds.push(MatThresholdConfig::default());
    config.conductances.push(ConductanceConfig::OrnsteinUhlenbeck {
        rate: 2000.0,
        g_peak: 0.05,
        decay: 0.005,
        reversal: 0.0,
    });
    config
}

#[test]
fn test_single_event_trace_stays_under_bound() {
    let report = runner::run(&single_event_config()).unwrap();
    assert_eq!(report.steps, 8000);

    let trial = &report.trials[0];
    assert!(trial.spike_times.is_empty());

    let trace = trial.trace.as_ref().unwrap();
    assert_eq!(trace.len(), 8001);
    assert_eq!(trace[0].voltage, -70.0);

    let mut peak = f64::NEG_INFINITY;
    for point in &trace[1..] {
        let t = point.time;
        let bound = -70.0 + 87.5 * ((-t / 10.0).exp() - (-t / 2.0).exp());
        assert!(point.voltage <= bound + 0.5, "t = {}: V = {}", t, point.voltage);
        peak = peak.max(point.voltage);
    }
    assert!(peak > -50.0);
    assert!((trial.final_voltage - -70.0).abs() < 0.5);
}

#[test]
fn test_driven_lif_fires_and_respects_refractory() {
    let report = runner::run(&driven_config(7, 1)).unwrap();
    let trial = &report.trials[0];

    assert!(!trial.spike_times.is_empty());
    assert_eq!(trial.unit_spike_times.len(), 1);
    assert_eq!(trial.spike_times, trial.unit_spike_times[0]);
    assert!(trial
        .spike_times
        .windows(2)
        .all(|w| w[1] - w[0] >= 0.002));
    assert!((trial.firing_rate - trial.spike_times.len() as f64 / 0.5).abs() < 1e-9);
}

#[test]
fn test_runs_are_reproducible_and_trials_independent() {
    let first = runner::run(&driven_config(42, 2)).unwrap();
    let second = runner::run(&driven_config(42, 2)).unwrap();

    for (a, b) in first.trials.iter().zip(&second.trials) {
        assert_eq!(a.seed, b.seed);
        assert_eq!(a.spike_times, b.spike_times);
    }
    assert_ne!(first.trials[0].seed, first.trials[1].seed);
    assert_ne!(first.trials[0].spike_times, first.trials[1].spike_times);
}

#[test]
fn test_consensus_of_two_identical_units() {
    let mut config = driven_config(3, 1);
    config.thresholds.push(MatThresholdConfig::default());
    config.simulation.merge_policy = MergePolicyConfig::Consensus;

    let report = runner::run(&config).unwrap();
    let trial = &report.trials[0];
    assert_eq!(trial.unit_spike_times[0], trial.unit_spike_times[1]);
    assert_eq!(trial.spike_times, trial.unit_spike_times[0]);
}

#[test]
fn test_hodgkin_huxley_action_potential() {
    let mut config = MatsimConfig::default();
    config.simulation.model = ModelKind::HodgkinHuxley;
    config.simulation.dt = 1e-5;
    config.simulation.duration = 0.02;
    config.conductances.push(ConductanceConfig::Exponential {
        g_peak: 1.0,
        decay: 0.005,
        reversal: 0.0,
        activation_times: vec![0.0],
    });

    let report = runner::run(&config).unwrap();
    let trial = &report.trials[0];
    assert_eq!(trial.spike_times.len(), 1, "spikes: {:?}", trial.spike_times);
    assert!(trial.spike_times[0] < 0.002);
    assert!(trial.unit_spike_times.is_empty());
    assert!((trial.final_voltage - -65.0).abs() < 1.0);
}

#[test]
fn test_invalid_step_is_reported() {
    let mut config = driven_config(1, 1);
    config.simulation.dt = 0.01;
    let err = runner::run(&config).unwrap_err();
    assert!(matches!(err, RunnerError::Config(_)));
    assert!(err.to_string().contains("fastest time constant"));
}

#[test]
fn test_report_from_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("matsim.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"
[simulation]
model = "lif"
dt = 0.0001
duration = 0.2
seed = 11

[[thresholds]]
alpha1 = 15.0
alpha2 = 3.0
tau1 = 0.01
tau2 = 0.2
omega = -55.0
refractory_period = 0.002

[[conductances]]
kind = "ornstein_uhlenbeck"
rate = 2000.0
g_peak = 0.05
decay = 0.005
reversal = 0.0
"#
    )
    .unwrap();

    let config = load_config(Some(path.as_path()), None).unwrap();
    let report = runner::run(&config).unwrap();

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["steps"], 2000);
    assert_eq!(json["trials"].as_array().unwrap().len(), 1);
    assert!(json["trials"][0].get("trace").is_none());
    assert!(json["model"].as_str().unwrap().contains("LIF"));
}

#[test]
fn test_demo_configs_are_valid() {
    let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
    for name in ["lif_ou_drive.toml", "hh_single_pulse.toml"] {
        let config = load_config(Some(demos.join(name).as_path()), None).unwrap();
        matsim::config::validate_config(&config)
            .unwrap_or_else(|e| panic!("{} is invalid: {}", name, e));
    }
}
