//! Real polynomials in ascending coefficient order.
//!
//! Index `i` of the coefficient vector holds the coefficient of `s^i`, so
//! `[6.0, 11.0, 6.0, 1.0]` is `s^3 + 6s^2 + 11s + 6`. Nothing is trimmed
//! implicitly: a vector with zero highest-order entries keeps its length, and
//! [`Polynomial::trimmed`] is the explicit way to drop them.
//!
//! Every algebraic combination ([`multiply`], [`add`], [`derivative`]) snaps
//! coefficients smaller than [`COEFF_EPS`] to exactly zero so round-off never
//! grows into spurious high-order terms.

use std::fmt;
use std::ops::{Add, Mul};

use nalgebra::{Complex, DMatrix};

use crate::numeric::{COEFF_EPS, Real, ZERO_COEFF_TOL, snap_to_zero};

/// Ascending-coefficient real polynomial.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Polynomial {
    coeffs: Vec<Real>,
}

impl Polynomial {
    /// Wrap literal coefficients as given (no suppression, no trimming).
    pub fn new(coeffs: impl Into<Vec<Real>>) -> Self {
        Self {
            coeffs: coeffs.into(),
        }
    }

    /// The zero polynomial, stored as a single zero coefficient.
    pub fn zero() -> Self {
        Self { coeffs: vec![0.0] }
    }

    pub fn constant(c: Real) -> Self {
        Self { coeffs: vec![c] }
    }

    /// `s^n`, the bare differentiation operator raised to `n`.
    pub fn s_pow(n: usize) -> Self {
        let mut coeffs = vec![0.0; n + 1];
        coeffs[n] = 1.0;
        Self { coeffs }
    }

    pub fn coeffs(&self) -> &[Real] {
        &self.coeffs
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Degree as stored: `len - 1`, and 0 for an empty vector.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Highest stored coefficient (0 for an empty vector).
    pub fn leading(&self) -> Real {
        self.coeffs.last().copied().unwrap_or(0.0)
    }

    /// Coefficient of `s^i`, zero past the end.
    pub fn coeff(&self, i: usize) -> Real {
        self.coeffs.get(i).copied().unwrap_or(0.0)
    }

    /// Drop highest-order coefficients with magnitude below `tol`.
    ///
    /// At least one coefficient is always kept, so an all-zero input becomes
    /// the zero polynomial.
    pub fn trimmed(&self, tol: Real) -> Self {
        let keep = self
            .coeffs
            .iter()
            .rposition(|c| c.abs() >= tol)
            .map_or(1, |idx| idx + 1);
        let mut coeffs: Vec<Real> = self.coeffs.iter().copied().take(keep).collect();
        if coeffs.is_empty() {
            coeffs.push(0.0);
        }
        Self { coeffs }
    }

    /// True when every coefficient is below `tol` in magnitude.
    pub fn is_zero(&self, tol: Real) -> bool {
        self.coeffs.iter().all(|c| c.abs() < tol)
    }

    /// Number of consecutive lowest-order coefficients below `tol`, i.e. the
    /// multiplicity of the root at `s = 0`.
    pub fn leading_zero_count(&self, tol: Real) -> usize {
        self.coeffs.iter().take_while(|c| c.abs() < tol).count()
    }

    /// Snap every coefficient below [`COEFF_EPS`] to exactly zero.
    pub fn suppress_small(mut self) -> Self {
        for c in &mut self.coeffs {
            *c = snap_to_zero(*c, COEFF_EPS);
        }
        self
    }

    /// Term-wise power rule; constants and empty vectors give the zero polynomial.
    pub fn derivative(&self) -> Self {
        derivative(self)
    }

    /// Horner evaluation at a real point.
    pub fn eval(&self, x: Real) -> Real {
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    /// Horner evaluation at a complex point.
    pub fn eval_complex(&self, z: Complex<Real>) -> Complex<Real> {
        self.coeffs
            .iter()
            .rev()
            .fold(Complex::new(0.0, 0.0), |acc, &c| acc * z + Complex::new(c, 0.0))
    }

    /// Coefficients in descending order (highest power first).
    pub fn descending(&self) -> Vec<Real> {
        self.coeffs.iter().rev().copied().collect()
    }

    /// All roots, from the eigenvalues of the companion matrix.
    ///
    /// Near-zero highest-order coefficients are trimmed first; a constant (or
    /// zero) polynomial has no roots.
    pub fn roots(&self) -> Vec<Complex<Real>> {
        let p = self.trimmed(ZERO_COEFF_TOL);
        let n = p.degree();
        if n == 0 {
            return Vec::new();
        }
        let lead = p.leading();
        let mut companion = DMatrix::<Real>::zeros(n, n);
        for i in 0..n - 1 {
            companion[(i, i + 1)] = 1.0;
        }
        for j in 0..n {
            companion[(n - 1, j)] = -p.coeffs[j] / lead;
        }
        companion.complex_eigenvalues().iter().copied().collect()
    }
}

/// Convolution. Result length is `len(p) + len(q) - 1`; an empty operand gives
/// the zero polynomial.
pub fn multiply(p: &Polynomial, q: &Polynomial) -> Polynomial {
    if p.is_empty() || q.is_empty() {
        return Polynomial::zero();
    }
    let mut res = vec![0.0; p.len() + q.len() - 1];
    for (i, a) in p.coeffs.iter().enumerate() {
        for (j, b) in q.coeffs.iter().enumerate() {
            res[i + j] += a * b;
        }
    }
    Polynomial::new(res).suppress_small()
}

/// Coefficient-wise sum, padding the shorter operand with zeros.
pub fn add(p: &Polynomial, q: &Polynomial) -> Polynomial {
    let n = p.len().max(q.len());
    let res: Vec<Real> = (0..n).map(|i| p.coeff(i) + q.coeff(i)).collect();
    Polynomial::new(res).suppress_small()
}

pub fn derivative(p: &Polynomial) -> Polynomial {
    if p.len() <= 1 {
        return Polynomial::zero();
    }
    let res: Vec<Real> = p
        .coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(power, c)| c * power as Real)
        .collect();
    Polynomial::new(res).suppress_small()
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        multiply(self, rhs)
    }
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        add(self, rhs)
    }
}

impl From<Vec<Real>> for Polynomial {
    fn from(coeffs: Vec<Real>) -> Self {
        Self::new(coeffs)
    }
}

impl From<&[Real]> for Polynomial {
    fn from(coeffs: &[Real]) -> Self {
        Self::new(coeffs.to_vec())
    }
}

fn format_coeff(c: Real) -> String {
    let s = format!("{c:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Ascending human-readable form, e.g. `10 + 2s + 1s^2`. Terms below
/// [`ZERO_COEFF_TOL`] are skipped; the zero polynomial prints as `0`.
impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .coeffs
            .iter()
            .enumerate()
            .filter(|(_, c)| c.abs() >= ZERO_COEFF_TOL)
            .map(|(i, &c)| match i {
                0 => format_coeff(c),
                1 => format!("{}s", format_coeff(c)),
                _ => format!("{}s^{}", format_coeff(c), i),
            })
            .collect();
        if terms.is_empty() {
            write!(f, "0")
        } else {
            write!(f, "{}", terms.join(" + "))
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn nonzero_coeffs() -> impl Strategy<Value = Vec<Real>> {
        prop::collection::vec(0.5_f64..10.0_f64, 1..6)
    }

    proptest! {
        #[test]
        fn multiply_is_commutative(a in nonzero_coeffs(), b in nonzero_coeffs()) {
            let pa = Polynomial::new(a.clone());
            let pb = Polynomial::new(b.clone());
            let ab = multiply(&pa, &pb);
            let ba = multiply(&pb, &pa);
            prop_assert_eq!(ab.len(), a.len() + b.len() - 1);
            for (x, y) in ab.coeffs().iter().zip(ba.coeffs()) {
                prop_assert!((x - y).abs() <= 1e-9 * x.abs().max(1.0));
            }
        }

        #[test]
        fn product_evaluates_to_product_of_values(
            a in nonzero_coeffs(),
            b in nonzero_coeffs(),
            x in -2.0_f64..2.0_f64,
        ) {
            let pa = Polynomial::new(a);
            let pb = Polynomial::new(b);
            let lhs = multiply(&pa, &pb).eval(x);
            let rhs = pa.eval(x) * pb.eval(x);
            prop_assert!((lhs - rhs).abs() <= 1e-7 * rhs.abs().max(1.0));
        }
    }
}
