// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for graphcodec applications
//!
//! Installs a console layer (text or JSON) and, with the `file-logging` feature, a JSON
//! log file inside a timestamped run folder with a bounded number of kept runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps file writers alive; logs are flushed when it is dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    fn console_only() -> Self {
        LoggingGuard {
            #[cfg(feature = "file-logging")]
            _file_guards: Vec::new(),
            log_dir: None,
        }
    }

    /// Run folder the log file is written to, if file output is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Filter directive combining the per-crate debug flags with the configured level
pub fn build_filter(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> String {
    debug_flags.to_filter_string_with_default(&config.level)
}

/// Initialize logging with console output and optional file output
///
/// With `config.log_dir` set, creates:
/// ```text
/// <log_dir>/
///   └── run_20250101_120000/
///       └── graphcodec.log (JSON lines)
/// ```
///
/// # Errors
/// Fails if the filter is invalid, the log folder cannot be created, file output is
/// requested without the `file-logging` feature, or a global subscriber already exists.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = build_filter(debug_flags, config);
    let mut layers: Vec<BoxedLayer> = vec![console_layer(config.format, &filter)?];
    let mut guard = LoggingGuard::console_only();

    if let Some(base_log_dir) = &config.log_dir {
        attach_file_output(base_log_dir, config, &filter, &mut layers, &mut guard)?;
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(guard)
}

/// Initialize console logging at `info` with the given debug flags
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LoggingConfig::default())
}

fn env_filter(filter: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(filter).with_context(|| format!("Invalid log filter '{}'", filter))
}

fn console_layer(format: LogFormat, filter: &str) -> Result<BoxedLayer> {
    let layer = match format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(env_filter(filter)?)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
            .with_filter(env_filter(filter)?)
            .boxed(),
    };
    Ok(layer)
}

#[cfg(feature = "file-logging")]
fn attach_file_output(
    base_log_dir: &Path,
    config: &LoggingConfig,
    filter: &str,
    layers: &mut Vec<BoxedLayer>,
    guard: &mut LoggingGuard,
) -> Result<()> {
    use tracing_appender::rolling;

    let timestamp = chrono::Utc::now().format(RUN_TIMESTAMP_FORMAT);
    let run_folder = base_log_dir.join(format!("run_{}", timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    cleanup_old_runs(base_log_dir, config.retention_runs)?;

    let appender = rolling::never(&run_folder, "graphcodec.log");
    let (non_blocking, worker_guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(env_filter(filter)?)
        .boxed();

    layers.push(file_layer);
    guard._file_guards.push(worker_guard);
    guard.log_dir = Some(run_folder);
    Ok(())
}

#[cfg(not(feature = "file-logging"))]
fn attach_file_output(
    base_log_dir: &Path,
    _config: &LoggingConfig,
    _filter: &str,
    _layers: &mut Vec<BoxedLayer>,
    _guard: &mut LoggingGuard,
) -> Result<()> {
    anyhow::bail!(
        "File logging to {} requires the file-logging feature",
        base_log_dir.display()
    )
}

#[cfg(feature = "file-logging")]
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Remove all but the `retention_runs` most recent run folders
#[cfg(feature = "file-logging")]
fn cleanup_old_runs(base_log_dir: &Path, retention_runs: usize) -> Result<()> {
    use chrono::NaiveDateTime;

    if !base_log_dir.exists() {
        return Ok(());
    }

    let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let timestamp = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix("run_"))
            .and_then(|stamp| NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP_FORMAT).ok());
        if let Some(timestamp) = timestamp {
            runs.push((path, timestamp));
        }
    }

    // newest first
    runs.sort_by(|a, b| b.1.cmp(&a.1));
    for (path, _) in runs.iter().skip(retention_runs) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_uses_configured_level() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(build_filter(&CrateDebugFlags::default(), &config), "warn");

        let flags = CrateDebugFlags::from_args(vec!["--debug-graphcodec-serialization".to_string()]);
        assert_eq!(
            build_filter(&flags, &config),
            "graphcodec_serialization=debug,warn"
        );
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        assert!(console_layer(LogFormat::Text, "graphcodec=loudest").is_err());
    }

    #[test]
    fn test_global_subscriber_is_installed_once() {
        let guard = init_logging_default(&CrateDebugFlags::default()).unwrap();
        assert!(guard.log_dir().is_none());
        tracing::info!("logging initialized");
        assert!(init_logging_default(&CrateDebugFlags::default()).is_err());
    }

    #[cfg(not(feature = "file-logging"))]
    #[test]
    fn test_file_output_requires_feature() {
        let mut layers = Vec::new();
        let mut guard = LoggingGuard::console_only();
        let result = attach_file_output(
            Path::new("./logs"),
            &LoggingConfig::default(),
            "info",
            &mut layers,
            &mut guard,
        );
        assert!(result.is_err());
        assert!(layers.is_empty());
    }

    #[cfg(feature = "file-logging")]
    #[test]
    fn test_cleanup_keeps_most_recent_runs() {
        let dir = tempfile::tempdir().unwrap();
        for stamp in ["20240101_000000", "20240201_000000", "20240301_000000"] {
            std::fs::create_dir(dir.path().join(format!("run_{}", stamp))).unwrap();
        }
        std::fs::create_dir(dir.path().join("unrelated")).unwrap();

        cleanup_old_runs(dir.path(), 2).unwrap();

        assert!(!dir.path().join("run_20240101_000000").exists());
        assert!(dir.path().join("run_20240201_000000").exists());
        assert!(dir.path().join("run_20240301_000000").exists());
        assert!(dir.path().join("unrelated").exists());
    }
}
