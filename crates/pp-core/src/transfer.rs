//! Transfer function value type and unity-feedback composition.

use crate::numeric::{Real, ZERO_COEFF_TOL};
use crate::poly::{Polynomial, add, multiply};

/// `G(s) = num(s) / den(s)`, both ascending.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransferFunction {
    pub num: Polynomial,
    pub den: Polynomial,
}

impl TransferFunction {
    pub fn new(num: impl Into<Polynomial>, den: impl Into<Polynomial>) -> Self {
        Self {
            num: num.into(),
            den: den.into(),
        }
    }

    /// Cascade connection `self * other`.
    pub fn series(&self, other: &TransferFunction) -> TransferFunction {
        TransferFunction {
            num: multiply(&self.num, &other.num),
            den: multiply(&self.den, &other.den),
        }
    }

    /// Closed loop of `controller` driving `plant` with unity negative feedback:
    /// `Bc*Np / (Ac*Dp + Bc*Np)`.
    ///
    /// The denominator is the closed-loop characteristic polynomial.
    pub fn unity_feedback(plant: &TransferFunction, controller: &TransferFunction) -> Self {
        let open = controller.series(plant);
        let den = add(&open.den, &open.num);
        TransferFunction { num: open.num, den }
    }

    /// Proper means `deg(num) <= deg(den)` after trimming near-zero high terms.
    pub fn is_proper(&self) -> bool {
        self.num.trimmed(ZERO_COEFF_TOL).degree() <= self.den.trimmed(ZERO_COEFF_TOL).degree()
    }

    /// Static gain `num(0) / den(0)`; `None` with a pole at the origin.
    pub fn dc_gain(&self) -> Option<Real> {
        let d0 = self.den.coeff(0);
        if d0.abs() < ZERO_COEFF_TOL {
            None
        } else {
            Some(self.num.coeff(0) / d0)
        }
    }
}
