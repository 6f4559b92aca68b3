//! Routh-Hurwitz stability test.
//!
//! The array is built from the descending coefficients. Two degenerate cases
//! are handled:
//!
//! - **all-zero row**: replaced by the coefficients of the derivative of the
//!   auxiliary polynomial formed from the row above it;
//! - **zero pivot**: a first-column entry that is ~0 in a non-zero row is
//!   replaced by [`ZERO_PIVOT_SUBSTITUTE`].
//!
//! The zero-pivot substitution is not the full epsilon-limit procedure. For
//! polynomials with roots exactly on the imaginary axis the verdict depends
//! on the substitute's magnitude and should be read as approximate.

use pp_core::numeric::{COEFF_EPS, Real};
use pp_core::Polynomial;
use serde::{Deserialize, Serialize};

/// Entries below this magnitude count as zero inside the array.
pub const ROUTH_ZERO_TOL: Real = 1e-10;

/// Value written in place of a vanishing pivot.
pub const ZERO_PIVOT_SUBSTITUTE: Real = 1e-6;

/// First-column entries must exceed `-STABILITY_MARGIN`.
pub const STABILITY_MARGIN: Real = 1e-10;

/// Outcome of a Routh test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityVerdict {
    Stable,
    Unstable,
    /// NaN/inf in the first column, or nothing to test. Treated as unstable.
    Indeterminate,
}

impl StabilityVerdict {
    pub fn is_stable(self) -> bool {
        matches!(self, StabilityVerdict::Stable)
    }
}

/// A computed Routh array.
#[derive(Debug, Clone, PartialEq)]
pub struct RouthArray {
    rows: Vec<Vec<Real>>,
    zero_pivots: usize,
    zero_rows: usize,
}

impl RouthArray {
    /// Build the array for an ascending-order characteristic polynomial.
    ///
    /// Near-zero highest-order coefficients are stripped and the polynomial
    /// is negated if its leading coefficient is negative.
    pub fn build(poly: &Polynomial) -> Self {
        let mut desc = poly.trimmed(COEFF_EPS).descending();
        if desc.iter().all(|c| c.abs() < COEFF_EPS) {
            return Self {
                rows: Vec::new(),
                zero_pivots: 0,
                zero_rows: 0,
            };
        }
        if desc[0] < 0.0 {
            desc.iter_mut().for_each(|c| *c = -*c);
        }

        let n = desc.len();
        let cols = n.div_ceil(2);
        let mut rows = vec![vec![0.0; cols]; n];
        for (k, &c) in desc.iter().enumerate() {
            rows[k % 2][k / 2] = c;
        }

        let mut zero_pivots = 0;
        let mut zero_rows = 0;
        for i in 2..n {
            if rows[i - 1].iter().all(|v| v.abs() < ROUTH_ZERO_TOL) {
                // row i-2 holds the auxiliary polynomial of degree n+1-i in
                // powers d, d-2, ...; differentiate it term by term
                let degree = (n + 1 - i) as isize;
                for j in 0..cols {
                    let power = degree - 2 * j as isize;
                    rows[i - 1][j] = if power > 0 {
                        rows[i - 2][j] * power as Real
                    } else {
                        0.0
                    };
                }
                zero_rows += 1;
            }
            if rows[i - 1][0].abs() < ROUTH_ZERO_TOL {
                rows[i - 1][0] = ZERO_PIVOT_SUBSTITUTE;
                zero_pivots += 1;
            }

            let a = rows[i - 2][0];
            let c = rows[i - 1][0];
            for j in 0..cols - 1 {
                let b = rows[i - 2][j + 1];
                let d = rows[i - 1][j + 1];
                rows[i][j] = (c * b - a * d) / c;
            }
        }

        Self {
            rows,
            zero_pivots,
            zero_rows,
        }
    }

    pub fn rows(&self) -> &[Vec<Real>] {
        &self.rows
    }

    pub fn first_column(&self) -> Vec<Real> {
        self.rows.iter().map(|r| r[0]).collect()
    }

    /// Number of zero pivots replaced by [`ZERO_PIVOT_SUBSTITUTE`].
    pub fn zero_pivots(&self) -> usize {
        self.zero_pivots
    }

    /// Number of all-zero rows replaced via the auxiliary polynomial.
    pub fn zero_rows(&self) -> usize {
        self.zero_rows
    }

    /// Sign changes down the first column; equals the number of right
    /// half-plane roots when no degenerate row occurred.
    pub fn sign_changes(&self) -> usize {
        let signs: Vec<bool> = self
            .first_column()
            .into_iter()
            .filter(|v| v.abs() >= ROUTH_ZERO_TOL)
            .map(|v| v > 0.0)
            .collect();
        signs.windows(2).filter(|w| w[0] != w[1]).count()
    }

    pub fn verdict(&self) -> StabilityVerdict {
        if self.rows.is_empty() {
            return StabilityVerdict::Indeterminate;
        }
        let first = self.first_column();
        if first.iter().any(|v| !v.is_finite()) {
            return StabilityVerdict::Indeterminate;
        }
        if first.iter().all(|&v| v > -STABILITY_MARGIN) {
            StabilityVerdict::Stable
        } else {
            StabilityVerdict::Unstable
        }
    }
}

pub fn routh_verdict(poly: &Polynomial) -> StabilityVerdict {
    RouthArray::build(poly).verdict()
}

/// True iff the Routh verdict is [`StabilityVerdict::Stable`].
pub fn check_routh_stability(poly: &Polynomial) -> bool {
    routh_verdict(poly).is_stable()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use nalgebra::Complex;
    use pp_core::{conjugate_pair, poly_from_poles};
    use proptest::prelude::*;

    fn lhp_poles() -> impl Strategy<Value = Vec<Complex<f64>>> {
        prop::collection::vec((-5.0_f64..-0.5, 0.0_f64..3.0), 1..4)
            .prop_map(|v| v.into_iter().map(|(re, im)| Complex::new(re, im)).collect())
    }

    proptest! {
        #[test]
        fn left_half_plane_roots_are_stable(poles in lhp_poles()) {
            let poly = poly_from_poles(&conjugate_pair(&poles)).unwrap();
            prop_assert!(check_routh_stability(&poly));
        }

        #[test]
        fn one_right_half_plane_root_is_unstable(
            poles in lhp_poles(),
            rhp in 0.5_f64..5.0,
        ) {
            let mut all = conjugate_pair(&poles);
            all.push(Complex::new(rhp, 0.0));
            let poly = poly_from_poles(&all).unwrap();
            prop_assert!(!check_routh_stability(&poly));
        }
    }
}
