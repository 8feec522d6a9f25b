//! CLI error type.

use std::fmt;
use std::path::PathBuf;

use wssa::config::ConfigError;
use wssa::healpix::HealpixError;
use wssa::logging::LoggingError;
use wssa::release::ReleaseError;
use wssa::service::{QueryError, ServiceError};

/// Errors reported by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file or setting problem.
    Config(String),

    /// Bad command-line input.
    Input(String),

    /// Coordinate input file could not be read.
    InputFile { path: PathBuf, source: std::io::Error },

    /// The value service could not be built.
    Service(ServiceError),

    /// A query failed.
    Query(QueryError),

    Healpix(HealpixError),

    /// Writing an output FITS file failed.
    Fits {
        path: PathBuf,
        source: fitsio::errors::Error,
    },

    Logging(LoggingError),

    Json(serde_json::Error),

    /// Writing results to stdout failed.
    Output(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Input(msg) => write!(f, "Invalid input: {}", msg),
            CliError::InputFile { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            CliError::Service(e) => write!(f, "Failed to start: {}", e),
            CliError::Query(e) => write!(f, "Query failed: {}", e),
            CliError::Healpix(e) => write!(f, "{}", e),
            CliError::Fits { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
            CliError::Logging(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Json(e) => write!(f, "JSON output failed: {}", e),
            CliError::Output(e) => write!(f, "Failed to write output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) | CliError::Input(_) => None,
            CliError::InputFile { source, .. } => Some(source),
            CliError::Service(e) => Some(e),
            CliError::Query(e) => Some(e),
            CliError::Healpix(e) => Some(e),
            CliError::Fits { source, .. } => Some(source),
            CliError::Logging(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Output(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ReleaseError> for CliError {
    fn from(e: ReleaseError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        CliError::Query(e)
    }
}

impl From<HealpixError> for CliError {
    fn from(e: HealpixError) -> Self {
        CliError::Healpix(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Output(e)
    }
}
