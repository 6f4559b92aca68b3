//! Error types for realization and simulation.

use pp_core::CoreError;
use thiserror::Error;

/// Errors encountered while building or running a simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// More zeros than poles: the transfer function is not physically realizable.
    #[error(
        "Not physically realizable: numerator order ({num_degree}) exceeds denominator order ({den_degree})"
    )]
    Causality { num_degree: usize, den_degree: usize },

    #[error("Degenerate model: {what}")]
    DegenerateModel { what: &'static str },

    #[error("Non-finite value in {what}")]
    NonFinite { what: &'static str },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;
