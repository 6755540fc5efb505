// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulation runner
//!
//! Builds a neuron from [`MatsimConfig`], drives it for the configured
//! duration and collects spikes into a serializable [`RunReport`].
//!
//! Every trial builds a fresh neuron. Stochastic conductances are seeded from
//! `simulation.seed`, the trial index and the conductance index, so a trial
//! is reproducible on its own and independent of the others.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use matsim_config::{
    validate_config, ConductanceConfig, ConfigError, MatsimConfig, MergePolicyConfig, ModelKind,
};
use matsim_neural::{
    Conductance, HhNeuron, HhParameters, LifNeuron, LifParameters, MatThreshold, NeuralError,
    NeuronModel, SpikeMergePolicy, ThresholdCrossingDetector,
};

/// Runner errors
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build neuron: {0}")]
    Neural(#[from] NeuralError),
}

pub type RunnerResult<T> = Result<T, RunnerError>;

/// Steps per fastest time constant below which a run is flagged
const COARSE_STEP_RATIO: f64 = 10.0;

/// One voltage sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TracePoint {
    pub time: f64,
    pub voltage: f64,
}

/// Outcome of one trial
#[derive(Debug, Clone, Serialize)]
pub struct TrialReport {
    pub trial: usize,
    /// Seed the trial's conductances were derived from
    pub seed: u64,
    /// Spike record of each MAT unit (empty for HH)
    pub unit_spike_times: Vec<Vec<f64>>,
    /// Canonical spike train of the neuron
    pub spike_times: Vec<f64>,
    /// Spikes per second of simulated time
    pub firing_rate: f64,
    pub final_voltage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<TracePoint>>,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub model: &'static str,
    pub dt: f64,
    pub duration: f64,
    pub steps: usize,
    pub trials: Vec<TrialReport>,
}

impl RunReport {
    /// Firing rate averaged over trials
    pub fn mean_firing_rate(&self) -> f64 {
        if self.trials.is_empty() {
            return 0.0;
        }
        self.trials.iter().map(|t| t.firing_rate).sum::<f64>() / self.trials.len() as f64
    }

    pub fn total_spikes(&self) -> usize {
        self.trials.iter().map(|t| t.spike_times.len()).sum()
    }
}

/// Validate `config` and run every trial
pub fn run(config: &MatsimConfig) -> RunnerResult<RunReport> {
    validate_config(config)?;

    let sim = &config.simulation;
    if let Some(fastest) = config.fastest_time_constant() {
        if sim.dt > fastest / COARSE_STEP_RATIO {
            warn!(dt = sim.dt, fastest, "dt is coarse for forward Euler");
        }
    }
    let steps = step_count(sim.dt, sim.duration);
    let mut trials = Vec::with_capacity(sim.trials);
    let mut model = "";

    for trial in 0..sim.trials {
        let report = match sim.model {
            ModelKind::Lif => {
                let mut neuron = build_lif(config, trial)?;
                model = neuron.model_name();
                run_lif_trial(config, trial, steps, &mut neuron)
            }
            ModelKind::HodgkinHuxley => {
                let mut neuron = build_hodgkin_huxley(config, trial)?;
                model = neuron.model_name();
                run_hodgkin_huxley_trial(config, trial, steps, &mut neuron)
            }
        };
        info!(
            trial,
            spikes = report.spike_times.len(),
            rate_hz = report.firing_rate,
            v_final = report.final_voltage,
            "trial complete"
        );
        trials.push(report);
    }

    Ok(RunReport {
        model,
        dt: sim.dt,
        duration: sim.duration,
        steps,
        trials,
    })
}

/// LIF neuron with the configured thresholds and trial-seeded conductances
pub fn build_lif(config: &MatsimConfig, trial: usize) -> RunnerResult<LifNeuron> {
    let lif = &config.lif;
    let thresholds = config
        .thresholds
        .iter()
        .map(|m| {
            MatThreshold::new(
                m.alpha1,
                m.alpha2,
                m.tau1,
                m.tau2,
                m.omega,
                m.refractory_period,
                m.resetting,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let params = LifParameters::with_values(
        lif.resting_potential,
        lif.membrane_resistance,
        lif.membrane_capacitance,
    );
    let mut neuron = LifNeuron::with_parameters(params, thresholds)?;
    attach_conductances(&mut neuron, config, trial)?;
    Ok(neuron)
}

/// HH neuron with the configured membrane and trial-seeded conductances
pub fn build_hodgkin_huxley(config: &MatsimConfig, trial: usize) -> RunnerResult<HhNeuron> {
    let hh = &config.hodgkin_huxley;
    let params = HhParameters {
        g_l: hh.g_l,
        e_l: hh.e_l,
        c_m: hh.c_m,
        g_na: hh.g_na,
        e_na: hh.e_na,
        g_k: hh.g_k,
        e_k: hh.e_k,
        v_rest: hh.v_rest,
    };
    let mut neuron = HhNeuron::with_parameters(params)?;
    attach_conductances(&mut neuron, config, trial)?;
    Ok(neuron)
}

fn attach_conductances<N: NeuronModel>(
    neuron: &mut N,
    config: &MatsimConfig,
    trial: usize,
) -> RunnerResult<()> {
    let base = trial_seed(config.simulation.seed, trial);
    for (index, conductance) in config.conductances.iter().enumerate() {
        let seed = conductance_seed(base, index);
        neuron.append_conductance(build_conductance(conductance, seed)?);
    }
    Ok(())
}

fn build_conductance(config: &ConductanceConfig, seed: u64) -> Result<Conductance, NeuralError> {
    match *config {
        ConductanceConfig::Exponential {
            g_peak,
            decay,
            reversal,
            ..
        } => Conductance::exponential(g_peak, decay, reversal),
        ConductanceConfig::ShotNoise {
            rate,
            g_peak,
            decay,
            reversal,
        } => Conductance::shot_noise(rate, g_peak, decay, reversal, seed),
        ConductanceConfig::OrnsteinUhlenbeck {
            rate,
            g_peak,
            decay,
            reversal,
        } => Conductance::ornstein_uhlenbeck(rate, g_peak, decay, reversal, seed),
    }
}

fn run_lif_trial(
    config: &MatsimConfig,
    trial: usize,
    steps: usize,
    neuron: &mut LifNeuron,
) -> TrialReport {
    let trace = drive(neuron, config, steps, |_| {});

    let sim = &config.simulation;
    let spike_times = neuron.merged_spike_times(merge_policy(sim.merge_policy), sim.merge_tolerance);
    let unit_spike_times = neuron.spike_trains().into_iter().map(<[f64]>::to_vec).collect();

    trial_report(config, trial, neuron.voltage(), unit_spike_times, spike_times, trace)
}

fn run_hodgkin_huxley_trial(
    config: &MatsimConfig,
    trial: usize,
    steps: usize,
    neuron: &mut HhNeuron,
) -> TrialReport {
    let mut detector = ThresholdCrossingDetector::new(config.simulation.spike_detection_threshold);
    detector.observe(neuron.time(), neuron.voltage());

    let trace = drive(neuron, config, steps, |n| {
        detector.observe(n.time(), n.voltage());
    });

    let spike_times = detector.spike_times().to_vec();
    trial_report(config, trial, neuron.voltage(), Vec::new(), spike_times, trace)
}

/// Step `neuron` through the run, firing scheduled activations
///
/// An activation at time `a` is delivered to the step covering `[t, t + dt)`
/// with `t <= a`, so it lands in the conductance on that step's update.
fn drive<N, F>(
    neuron: &mut N,
    config: &MatsimConfig,
    steps: usize,
    mut after_step: F,
) -> Option<Vec<TracePoint>>
where
    N: NeuronModel,
    F: FnMut(&N),
{
    let sim = &config.simulation;
    let dt = sim.dt;
    let mut schedule = ActivationSchedule::new(&config.conductances);

    let stride = sim.trace_stride.max(1);
    let mut trace = sim.record_trace.then(|| {
        let mut points = Vec::with_capacity(steps / stride + 2);
        points.push(TracePoint {
            time: neuron.time(),
            voltage: neuron.voltage(),
        });
        points
    });

    for step in 0..steps {
        let window_end = (step + 1) as f64 * dt;
        for index in schedule.due(window_end) {
            // Indices come from the same config the neuron was built from
            if let Ok(conductance) = neuron.conductance_mut(index) {
                conductance.activate();
            }
        }

        neuron.timestep(dt);
        after_step(&*neuron);

        if let Some(points) = trace.as_mut() {
            if (step + 1) % stride == 0 {
                points.push(TracePoint {
                    time: neuron.time(),
                    voltage: neuron.voltage(),
                });
            }
        }
    }

    trace
}

fn trial_report(
    config: &MatsimConfig,
    trial: usize,
    final_voltage: f64,
    unit_spike_times: Vec<Vec<f64>>,
    spike_times: Vec<f64>,
    trace: Option<Vec<TracePoint>>,
) -> TrialReport {
    let duration = config.simulation.duration;
    TrialReport {
        trial,
        seed: trial_seed(config.simulation.seed, trial),
        firing_rate: spike_times.len() as f64 / duration,
        unit_spike_times,
        spike_times,
        final_voltage,
        trace,
    }
}

/// Pending presynaptic spike times of the exponential conductances
struct ActivationSchedule {
    /// `(time, conductance index)`, latest first
    pending: Vec<(f64, usize)>,
}

impl ActivationSchedule {
    fn new(conductances: &[ConductanceConfig]) -> Self {
        let mut pending: Vec<(f64, usize)> = conductances
            .iter()
            .enumerate()
            .flat_map(|(index, c)| match c {
                ConductanceConfig::Exponential {
                    activation_times, ..
                } => activation_times.iter().map(|&t| (t, index)).collect(),
                _ => Vec::new(),
            })
            .collect();
        pending.sort_by(|a, b| b.0.total_cmp(&a.0));
        debug!(activations = pending.len(), "activation schedule built");
        Self { pending }
    }

    /// Conductances with an activation before `window_end`
    fn due(&mut self, window_end: f64) -> Vec<usize> {
        let mut due = Vec::new();
        while let Some(&(time, index)) = self.pending.last() {
            if time >= window_end {
                break;
            }
            self.pending.pop();
            due.push(index);
        }
        due
    }
}

fn merge_policy(policy: MergePolicyConfig) -> SpikeMergePolicy {
    match policy {
        MergePolicyConfig::Union => SpikeMergePolicy::Union,
        MergePolicyConfig::Consensus => SpikeMergePolicy::Consensus,
    }
}

fn step_count(dt: f64, duration: f64) -> usize {
    (duration / dt).round() as usize
}

/// Seed of one trial, derived from the root seed
pub fn trial_seed(root: u64, trial: usize) -> u64 {
    splitmix64(root ^ splitmix64(trial as u64))
}

/// Seed of one conductance within a trial
pub fn conductance_seed(trial_seed: u64, index: usize) -> u64 {
    splitmix64(trial_seed.wrapping_add(index as u64))
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
