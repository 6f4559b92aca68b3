//! Error types for controller design.

use std::fmt;

use pp_core::CoreError;
use thiserror::Error;

/// Result type for controller design operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Likely cause of a singular Sylvester matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum SingularityHint {
    /// A plant pole (of the integrator-augmented denominator) is also a
    /// numerator zero, so the two polynomials are not coprime.
    PoleZeroCancellation { re: f64, im: f64 },
    /// No common root was located: the numerator is zero or the plant is
    /// otherwise uncontrollable/unobservable.
    Uncontrollable,
}

impl fmt::Display for SingularityHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingularityHint::PoleZeroCancellation { re, im } => write!(
                f,
                "plant pole {re:.4}{im:+.4}j is cancelled by a numerator zero"
            ),
            SingularityHint::Uncontrollable => {
                write!(f, "plant appears uncontrollable or unobservable")
            }
        }
    }
}

/// Errors that can occur while designing a controller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Overshoot or settling time outside their valid ranges.
    #[error("Invalid design specification: {what}")]
    InvalidSpec { what: &'static str },

    /// Plant polynomials that cannot describe a causal system.
    #[error("Invalid plant model: {what}")]
    InvalidPlant { what: String },

    /// The closed loop has fewer poles than the dominant set needs.
    #[error(
        "Closed-loop order {available} is too low to place {required} dominant poles"
    )]
    InsufficientOrder { available: usize, required: usize },

    /// The Diophantine equation has no unique solution.
    #[error("Design failed: singular Sylvester matrix (rcond = {rcond:.3e}); {hint}")]
    DesignFailure { hint: SingularityHint, rcond: f64 },

    #[error(transparent)]
    Core(#[from] CoreError),
}
