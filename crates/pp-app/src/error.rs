//! Error types for the pp-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the design and simulation
/// crates and gives CLI front ends a single error to report.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Controller design failed: {0}")]
    Design(#[from] pp_controls::ControlError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] pp_sim::SimError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pp-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<pp_core::CoreError> for AppError {
    fn from(err: pp_core::CoreError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}
