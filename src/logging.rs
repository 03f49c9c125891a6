use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::{FncmError, Result};

/// Log file for a given day: `<dir>/<YYYY>/<Month>/<YYYY-MM-DD>.log`
#[must_use]
pub fn log_file_path(log_dir: &Path, date: NaiveDate) -> PathBuf {
    log_dir
        .join(date.year().to_string())
        .join(date.format("%B").to_string())
        .join(format!("{}.log", date.format("%Y-%m-%d")))
}

/// Initialize structured logging system.
///
/// Console output goes to stderr. When `config.to_file` is set, records are
/// also appended to today's file under `config.directory`; the returned
/// guard must be held until exit so buffered lines are flushed.
pub fn init_logging(config: &LoggingConfig, log_level: &str) -> Result<Option<WorkerGuard>> {
    // Set up environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| FncmError::Config(format!("Failed to create log filter: {e}")))?;

    let (file_layer, guard) = if config.to_file {
        let path = log_file_path(Path::new(&config.directory), Local::now().date_naive());
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;
        let file_name = path.file_name().map_or_else(|| "fncm.log".into(), |n| n.to_os_string());

        let file_appender = rolling::never(parent, file_name);
        let (non_blocking_appender, guard) = non_blocking(file_appender);

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_appender)
            .with_ansi(false)
            .with_target(true);
        let layer = if config.format == "json" {
            layer.json().boxed()
        } else {
            layer.boxed()
        };
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    // Add console layer
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false);

    Registry::default()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| FncmError::Config(format!("Failed to install log subscriber: {e}")))?;

    info!("Logging system initialized");
    Ok(guard)
}

/// Performance timing utilities
pub struct OperationTimer {
    operation: String,
    start: std::time::Instant,
}

impl OperationTimer {
    #[must_use]
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            let duration = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
            tracing::debug!(
                operation = %self.operation,
                duration_ms = duration,
                "Operation finished"
            );
        }
    }
}
