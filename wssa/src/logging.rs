//! Tracing subscriber setup.
//!
//! Console output goes to stderr so that query results on stdout stay
//! machine-readable. The filter comes from `WSSA_LOG` when set (standard
//! `EnvFilter` directives such as `wssa=debug`), else from the configured
//! level. An optional log file receives the same events without ANSI
//! colours through a non-blocking writer.
//!
//! ```no_run
//! use wssa::logging::{init_logging, LoggingConfig};
//!
//! let _guard = init_logging(&LoggingConfig::default().with_level("debug"))?;
//! tracing::info!("ready");
//! # Ok::<(), wssa::logging::LoggingError>(())
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding filter directives.
pub const LOG_ENV_VAR: &str = "WSSA_LOG";

/// Level used when neither the environment nor the config sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Cannot open log file {path}: {reason}")]
    LogFile { path: PathBuf, reason: String },

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive used when `WSSA_LOG` is unset.
    pub level: String,
    /// Also write events to this file.
    pub file: Option<PathBuf>,
    /// Colourise console output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Filter from `WSSA_LOG`, falling back to `self.level`.
    pub fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        EnvFilter::try_from_env(LOG_ENV_VAR).or_else(|_| {
            EnvFilter::try_new(&self.level).map_err(|e| LoggingError::InvalidFilter {
                filter: self.level.clone(),
                reason: e.to_string(),
            })
        })
    }
}

/// Install the global subscriber.
///
/// # Returns
///
/// The log file writer guard when a file is configured. Dropping it
/// flushes and stops the background writer, so keep it for the life of
/// the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = config.env_filter()?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_timer(LocalTime::rfc_3339())
        .with_target(true)
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let appender = file_appender(path)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_timer(LocalTime::rfc_3339())
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(guard)
}

fn file_appender(path: &Path) -> Result<RollingFileAppender, LoggingError> {
    let log_file_error = |reason: String| LoggingError::LogFile {
        path: path.to_path_buf(),
        reason,
    };

    let name = path
        .file_name()
        .ok_or_else(|| log_file_error("path has no file name".to_string()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| log_file_error(e.to_string()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy())
        .build(dir)
        .map_err(|e| log_file_error(e.to_string()))
}
