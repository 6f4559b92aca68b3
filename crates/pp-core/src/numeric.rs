use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// Coefficients below this magnitude are forced to exactly zero after any
/// polynomial combination. Legitimately tiny coefficients are lost as well.
pub const COEFF_EPS: Real = 1e-8;

/// A coefficient this small counts as zero when detecting free integrators,
/// trimming highest-order terms, or printing.
pub const ZERO_COEFF_TOL: Real = 1e-6;

/// Imaginary parts below this magnitude make a pole real.
pub const IMAG_TOL: Real = 1e-6;

/// Smallest leading denominator coefficient accepted for normalization.
pub const LEADING_COEFF_MIN: Real = 1e-12;

/// Replace `v` by zero when it is smaller than `eps` in magnitude.
#[inline]
pub fn snap_to_zero(v: Real, eps: Real) -> Real {
    if v.abs() < eps { 0.0 } else { v }
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

pub fn ensure_all_finite(values: &[Real], what: &'static str) -> Result<(), CoreError> {
    for &v in values {
        ensure_finite(v, what)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_to_zero_threshold() {
        assert_eq!(snap_to_zero(5e-9, COEFF_EPS), 0.0);
        assert_eq!(snap_to_zero(-5e-9, COEFF_EPS), 0.0);
        assert_eq!(snap_to_zero(2e-8, COEFF_EPS), 2e-8);
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
        assert!(ensure_all_finite(&[1.0, Real::INFINITY], "coeffs").is_err());
        assert!(ensure_all_finite(&[1.0, -2.0], "coeffs").is_ok());
    }
}
