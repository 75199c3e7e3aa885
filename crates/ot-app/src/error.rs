//! Error types for the ot-app service layer.

use std::path::PathBuf;

use ot_core::SeriesError;
use ot_trace::TraceError;

/// Application error type that wraps errors from the backend crates and
/// provides one error interface for every frontend.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Failed to write export file: {path}")]
    ExportWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ot-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<SeriesError> for AppError {
    fn from(err: SeriesError) -> Self {
        AppError::Trace(TraceError::Series(err))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(format!("Failed to parse config YAML: {}", err))
    }
}
