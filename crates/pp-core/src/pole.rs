//! Complex poles and their conversion into real polynomial factors.
//!
//! A real polynomial can only be built from a pole set that is closed under
//! conjugation. [`conjugate_pair`] enforces that by construction and
//! [`poly_from_poles`] refuses a set that still is not closed.

use nalgebra::Complex;

use crate::error::{CoreError, CoreResult};
use crate::numeric::{IMAG_TOL, Real};
use crate::poly::Polynomial;

/// A pole in the s-plane. Real poles have a zero imaginary part.
pub type Pole = Complex<Real>;

pub fn real_pole(p: Real) -> Pole {
    Complex::new(p, 0.0)
}

pub fn is_real(p: &Pole) -> bool {
    p.im.abs() <= IMAG_TOL
}

/// Expand every complex pole into itself plus its conjugate; real-ish poles
/// keep only their real part.
pub fn conjugate_pair(poles: &[Pole]) -> Vec<Pole> {
    let mut paired = Vec::with_capacity(poles.len() * 2);
    for p in poles {
        if is_real(p) {
            paired.push(real_pole(p.re));
        } else {
            paired.push(*p);
            paired.push(p.conj());
        }
    }
    paired
}

/// Expand `prod (s - p_i)` into a monic real polynomial.
///
/// # Errors
///
/// [`CoreError::UnpairedPole`] when the expansion keeps a non-negligible
/// imaginary part, i.e. the input was not closed under conjugation.
pub fn poly_from_poles(poles: &[Pole]) -> CoreResult<Polynomial> {
    let mut acc: Vec<Pole> = vec![Complex::new(1.0, 0.0)];
    for p in poles {
        // (s - p) * acc
        let mut next = vec![Complex::new(0.0, 0.0); acc.len() + 1];
        for (i, c) in acc.iter().enumerate() {
            next[i] -= c * p;
            next[i + 1] += *c;
        }
        acc = next;
    }

    let scale = acc.iter().map(|c| c.re.abs()).fold(1.0, Real::max);
    if let Some(bad) = acc.iter().find(|c| c.im.abs() > IMAG_TOL * scale) {
        let culprit = poles
            .iter()
            .find(|p| !is_real(p) && !poles.iter().any(|q| (q - p.conj()).norm() <= IMAG_TOL))
            .copied()
            .unwrap_or(*bad);
        return Err(CoreError::UnpairedPole {
            re: culprit.re,
            im: culprit.im,
        });
    }

    Ok(Polynomial::new(acc.iter().map(|c| c.re).collect::<Vec<_>>()).suppress_small())
}
