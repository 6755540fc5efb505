// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for matsim
//!
//! Console output is always on. With the `file-logging` feature and a
//! `log_dir` configured, JSON logs also go to a timestamped run folder.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps background log writers alive; drop it last
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder holding the log files, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Build the filter for the console: `RUST_LOG` wins, then debug flags over
/// the configured level
pub fn build_filter(debug_flags: &CrateDebugFlags, level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(debug_flags.to_filter_string(level)))
}

/// Initialize the global subscriber
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug_flags.any_enabled());
    let console: BoxedLayer = match config.format {
        LogFormat::Text => console
            .with_filter(build_filter(debug_flags, &config.level))
            .boxed(),
        LogFormat::Json => console
            .json()
            .with_filter(build_filter(debug_flags, &config.level))
            .boxed(),
    };
    layers.push(console);

    #[cfg(feature = "file-logging")]
    let (file_guards, log_dir) = match &config.log_dir {
        Some(base) => {
            let (file_layers, guards, run_folder) =
                file_logging::layers(debug_flags, &config.level, base)?;
            layers.extend(file_layers);
            (guards, Some(run_folder))
        }
        None => (Vec::new(), None),
    };
    #[cfg(not(feature = "file-logging"))]
    let log_dir = None;

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        log_dir,
    })
}

/// Initialize logging with default settings
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LoggingConfig::default())
}

#[cfg(feature = "file-logging")]
mod file_logging {
    //! JSON run logs with retention
    //!
    //! ```text
    //! ./logs/
    //!   └── run_20250101_120000/
    //!       ├── matsim-neural.log
    //!       ├── matsim-config.log
    //!       └── matsim.log (combined)
    //! ```

    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};
    use chrono::{NaiveDateTime, Utc};
    use tracing_appender::non_blocking::WorkerGuard;
    use tracing_appender::rolling;
    use tracing_subscriber::{EnvFilter, Layer};

    use super::{build_filter, BoxedLayer};
    use crate::cli::CrateDebugFlags;

    const RETENTION_DAYS: i64 = 30;
    const RETENTION_RUNS: usize = 10;

    pub(super) fn layers(
        debug_flags: &CrateDebugFlags,
        level: &str,
        base_log_dir: &Path,
    ) -> Result<(Vec<BoxedLayer>, Vec<WorkerGuard>, PathBuf)> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let run_folder = base_log_dir.join(format!("run_{}", timestamp));
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

        cleanup_old_logs(base_log_dir, &run_folder)?;

        let mut layers = Vec::new();
        let mut guards = Vec::new();

        // One file per library crate; the umbrella crate goes to the combined file
        for crate_name in crate::KNOWN_CRATES.iter().filter(|c| **c != "matsim") {
            let appender = rolling::never(&run_folder, format!("{}.log", crate_name));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);

            let target = crate_name.replace('-', "_");
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .json()
                    .with_filter(EnvFilter::new(format!("{}=debug,off", target)))
                    .boxed(),
            );
        }

        let combined = rolling::never(&run_folder, "matsim.log");
        let (writer, guard) = tracing_appender::non_blocking(combined);
        guards.push(guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(build_filter(debug_flags, level))
                .boxed(),
        );

        Ok((layers, guards, run_folder))
    }

    /// Remove run folders older than the retention window, then all but the
    /// newest runs
    fn cleanup_old_logs(base_log_dir: &Path, current: &Path) -> Result<()> {
        let cutoff = Utc::now().naive_utc() - chrono::Duration::days(RETENTION_DAYS);

        let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
        for entry in std::fs::read_dir(base_log_dir)? {
            let path = entry?.path();
            if !path.is_dir() || path == current {
                continue;
            }
            let stamp = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix("run_"))
                .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y%m%d_%H%M%S").ok());
            if let Some(stamp) = stamp {
                runs.push((path, stamp));
            }
        }
        runs.sort_by_key(|(_, stamp)| *stamp);

        // The current run counts toward the limit
        let excess = (runs.len() + 1).saturating_sub(RETENTION_RUNS);
        for (i, (path, stamp)) in runs.iter().enumerate() {
            if *stamp < cutoff || i < excess {
                if let Err(e) = std::fs::remove_dir_all(path) {
                    eprintln!(
                        "Warning: Failed to remove old log directory {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }
        Ok(())
    }

}
