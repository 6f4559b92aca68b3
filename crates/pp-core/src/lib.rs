//! pp-core: numeric foundation for poleplace.
//!
//! Contains:
//! - numeric (Real + tolerances + fixed epsilon constants)
//! - poly (ascending-coefficient polynomial algebra)
//! - pole (complex poles and conjugate pairing)
//! - transfer (transfer function composition)
//! - timing (stage timers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod pole;
pub mod poly;
pub mod timing;
pub mod transfer;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use pole::{Pole, conjugate_pair, poly_from_poles};
pub use poly::{Polynomial, add, derivative, multiply};
pub use transfer::TransferFunction;
