//! Controller synthesis and stability analysis for SISO plants.
//!
//! This crate turns time-domain requirements into a concrete controller:
//!
//! - [`pole_spec`]: overshoot / settling time to damping ratio, natural
//!   frequency and dominant pole.
//! - [`synthesis`]: pole placement by solving the Diophantine equation
//!   `Dp_ext*A + Np*B = A_cl` as a Sylvester linear system.
//! - [`routh`]: Routh array stability test with degenerate-row handling.
//!
//! # Numerical thresholds
//!
//! All epsilons are fixed constants. They are approximations with known
//! failure modes: roots exactly on the imaginary axis (Routh zero pivot) and
//! exact pole-zero cancellation (singular Sylvester matrix).

pub mod error;
pub mod pole_spec;
pub mod routh;
pub mod synthesis;

pub use error::{ControlError, ControlResult, SingularityHint};
pub use pole_spec::{DesignSpec, DominantPoles, InputClass};
pub use routh::{RouthArray, StabilityVerdict, check_routh_stability, routh_verdict};
pub use synthesis::{
    ControllerDesign, count_integrators, design_controller, desired_characteristic_polynomial,
    far_poles, integrators_to_add, sylvester_matrix,
};
