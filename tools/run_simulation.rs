// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Run a configured neuron simulation and print the report as JSON.
//!
//! The configuration comes from `--config <path>`, `MATSIM_CONFIG_PATH` or a
//! `matsim.toml` found in the current directory or one of its parents.
//! `MATSIM_*` environment variables and `--key=value` arguments override it.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use tracing::info;

use matsim::config::{load_config, LoggingConfig as FileLoggingConfig};
use matsim::observability::{self, LogFormat, LoggingConfig};
use matsim::runner;

struct Args {
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    pretty: bool,
    overrides: HashMap<String, String>,
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: run_simulation [--config <path>] [--output <path>] [--log-dir <path>] [--pretty]\n\
         \x20                     [--<key>=<value> ...] [--debug-<crate>] [--debug-all]\n\n\
         Override keys: dt, duration, trials, seed, model, log_level, record_trace\n\n\
         {}",
        observability::debug_flags_help()
    );
    process::exit(2);
}

fn parse_args() -> Args {
    let mut parsed = Args {
        config: None,
        output: None,
        log_dir: None,
        pretty: false,
        overrides: HashMap::new(),
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.config = Some(PathBuf::from(v));
            }
            "--output" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.output = Some(PathBuf::from(v));
            }
            "--log-dir" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.log_dir = Some(PathBuf::from(v));
            }
            "--pretty" => parsed.pretty = true,
            "-h" | "--help" => usage_and_exit(),
            // Handled by the debug flag parser
            other if other.starts_with("--debug-") => {}
            other => match other.strip_prefix("--").and_then(|kv| kv.split_once('=')) {
                Some((key, value)) => {
                    parsed
                        .overrides
                        .insert(key.replace('-', "_"), value.to_string());
                }
                None => {
                    eprintln!("Unknown argument: {other}");
                    usage_and_exit();
                }
            },
        }
    }

    parsed
}

fn logging_config(file: &FileLoggingConfig, log_dir: Option<PathBuf>) -> LoggingConfig {
    LoggingConfig {
        level: file.level.clone(),
        format: if file.json {
            LogFormat::Json
        } else {
            LogFormat::Text
        },
        log_dir,
    }
}

fn main() -> Result<()> {
    let args = parse_args();

    let config = load_config(args.config.as_deref(), Some(&args.overrides))
        .context("Failed to load configuration")?;

    let debug_flags = observability::parse_debug_flags();
    let _log_guard = observability::init_logging(
        &debug_flags,
        &logging_config(&config.logging, args.log_dir),
    )?;

    info!(
        model = ?config.simulation.model,
        dt = config.simulation.dt,
        duration = config.simulation.duration,
        trials = config.simulation.trials,
        seed = config.simulation.seed,
        "starting simulation"
    );

    let report = runner::run(&config)?;
    info!(
        total_spikes = report.total_spikes(),
        mean_rate_hz = report.mean_firing_rate(),
        "simulation finished"
    );

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    match args.output {
        Some(path) => fs::write(&path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?,
        None => println!("{json}"),
    }

    Ok(())
}
