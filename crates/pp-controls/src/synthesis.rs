//! Pole-placement controller synthesis.
//!
//! Given a plant `Np/Dp` and a [`DesignSpec`], the controller `B/A` is chosen
//! so that the closed-loop characteristic polynomial equals a desired one:
//!
//! ```text
//! Dp_ext * A' + Np * B = A_cl,    Dp_ext = Dp * s^r,    A = A' * s^r
//! ```
//!
//! `r` integrators are injected so that the loop type matches the reference
//! class. Matching coefficients turns the polynomial identity into a square
//! Sylvester system `M * [A'; B] = A_cl` that is solved with LU.

use nalgebra::{DMatrix, DVector};
use pp_core::numeric::{COEFF_EPS, Real, ZERO_COEFF_TOL, ensure_all_finite};
use pp_core::{Pole, Polynomial, TransferFunction, multiply, poly_from_poles};
use tracing::{debug, warn};

use crate::error::{ControlError, ControlResult, SingularityHint};
use crate::pole_spec::{DesignSpec, DominantPoles, InputClass};

/// Lowest-order coefficients below this count as free integrators.
pub const INTEGRATOR_TOL: Real = ZERO_COEFF_TOL;

/// Far poles sit at least this many times further left than the dominant pair.
pub const FAR_POLE_FACTOR: Real = 10.0;

/// Far poles are never closer to the origin than this (rad/s).
pub const FAR_POLE_FLOOR: Real = 10.0;

/// Fractional offset between successive far poles. Repeated real roots give
/// a defective (Jordan) factor and an ill-conditioned Sylvester solve.
pub const FAR_POLE_SPREAD: Real = 0.1;

/// Reciprocal condition number below which the Sylvester matrix is singular.
pub const SINGULAR_RCOND: Real = 1e-12;

/// Reciprocal condition number below which a solved design is logged as fragile.
pub const ILL_CONDITIONED_RCOND: Real = 1e-8;

/// Relative residual under which a plant pole counts as cancelled by a zero.
pub const CANCELLATION_TOL: Real = 1e-6;

/// Result of a successful design run.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerDesign {
    /// Controller numerator `B`.
    pub num: Polynomial,
    /// Controller denominator `A`, injected integrators included.
    pub den: Polynomial,
    /// Integrators injected into the controller.
    pub integrators_added: usize,
    /// Integrators the plant already had.
    pub existing_integrators: usize,
    pub zeta: Real,
    pub omega_n: Real,
    /// Representative dominant pole (upper half-plane member).
    pub dominant_pole: Pole,
    /// Non-dominant real poles used to fill the closed-loop order.
    pub far_poles: Vec<Pole>,
    /// Target closed-loop characteristic polynomial.
    pub desired_char_poly: Polynomial,
    /// Reciprocal condition number of the Sylvester matrix.
    pub rcond: Real,
}

impl ControllerDesign {
    pub fn controller(&self) -> TransferFunction {
        TransferFunction::new(self.num.clone(), self.den.clone())
    }

    /// Unity-feedback closed loop with `plant`.
    pub fn closed_loop(&self, plant: &TransferFunction) -> TransferFunction {
        TransferFunction::unity_feedback(plant, &self.controller())
    }

    /// Largest relative coefficient mismatch between `Dp*A + Np*B` and the
    /// desired characteristic polynomial.
    pub fn verify(&self, plant: &TransferFunction) -> Real {
        let realized = self.closed_loop(plant).den;
        let n = realized.len().max(self.desired_char_poly.len());
        (0..n)
            .map(|i| {
                let target = self.desired_char_poly.coeff(i);
                (realized.coeff(i) - target).abs() / target.abs().max(1.0)
            })
            .fold(0.0, Real::max)
    }
}

/// Number of free integrators (roots at `s = 0`) in a plant denominator.
pub fn count_integrators(den: &Polynomial) -> usize {
    den.leading_zero_count(INTEGRATOR_TOL)
}

/// Integrators the controller must inject for `input`.
pub fn integrators_to_add(den: &Polynomial, input: InputClass) -> usize {
    input
        .required_integrators()
        .saturating_sub(count_integrators(den))
}

/// `count` spread real poles to the left of the dominant pair.
pub fn far_poles(dominant: &DominantPoles, count: usize) -> Vec<Pole> {
    let base = (FAR_POLE_FACTOR * dominant.decay_rate()).max(FAR_POLE_FLOOR);
    (0..count)
        .map(|k| Pole::new(-base * (1.0 + FAR_POLE_SPREAD * k as Real), 0.0))
        .collect()
}

/// Desired closed-loop polynomial of degree `total_order`: the dominant pole
/// pair times enough far real poles. Returns the polynomial and the far poles.
pub fn desired_characteristic_polynomial(
    dominant: &DominantPoles,
    total_order: usize,
) -> ControlResult<(Polynomial, Vec<Pole>)> {
    let paired = dominant.paired();
    if paired.len() > total_order {
        return Err(ControlError::InsufficientOrder {
            available: total_order,
            required: paired.len(),
        });
    }

    let mut a_cl = poly_from_poles(&paired)?;
    let far = far_poles(dominant, total_order - paired.len());
    for p in &far {
        a_cl = multiply(&a_cl, &Polynomial::new(vec![-p.re, 1.0]));
    }
    Ok((a_cl, far))
}

/// Sylvester matrix for `Dp_ext * A' + Np * B` with `deg(A') = deg(B) = deg_ctrl`.
///
/// Columns `0..=deg_ctrl` convolve `dp_ext` against the `A'` unknowns, the next
/// `deg_ctrl + 1` columns convolve `np` against the `B` unknowns. Terms that
/// would land past the last row are dropped.
pub fn sylvester_matrix(dp_ext: &Polynomial, np: &Polynomial, deg_ctrl: usize) -> DMatrix<Real> {
    let block = deg_ctrl + 1;
    let num_vars = 2 * block;
    let mut m = DMatrix::<Real>::zeros(num_vars, num_vars);
    for j in 0..block {
        for (k, &c) in dp_ext.coeffs().iter().enumerate() {
            if j + k < num_vars {
                m[(j + k, j)] = c;
            }
        }
        for (k, &c) in np.coeffs().iter().enumerate() {
            if j + k < num_vars {
                m[(j + k, block + j)] = c;
            }
        }
    }
    m
}

fn reciprocal_condition(m: &DMatrix<Real>) -> Real {
    let sv = m.clone().svd(false, false).singular_values;
    let max = sv.max();
    if max <= 0.0 { 0.0 } else { sv.min() / max }
}

/// Look for a root of `dp_ext` that is also a root of `np`.
fn diagnose_singularity(dp_ext: &Polynomial, np: &Polynomial) -> SingularityHint {
    if np.is_zero(ZERO_COEFF_TOL) {
        return SingularityHint::Uncontrollable;
    }
    let coeff_mag: Real = np.coeffs().iter().map(|c| c.abs()).sum();
    for root in dp_ext.roots() {
        let reach = root.norm().max(1.0).powi(np.degree() as i32);
        if np.eval_complex(root).norm() <= CANCELLATION_TOL * coeff_mag * reach {
            return SingularityHint::PoleZeroCancellation {
                re: root.re,
                im: root.im,
            };
        }
    }
    SingularityHint::Uncontrollable
}

fn validate_plant(plant: &TransferFunction) -> ControlResult<(Polynomial, Polynomial)> {
    ensure_all_finite(plant.num.coeffs(), "plant numerator")?;
    ensure_all_finite(plant.den.coeffs(), "plant denominator")?;

    // only float noise is trimmed; a small but real leading term keeps its order
    let den = plant.den.trimmed(COEFF_EPS);
    let num = plant.num.trimmed(COEFF_EPS);
    if den.is_zero(COEFF_EPS) {
        return Err(ControlError::InvalidPlant {
            what: "denominator is identically zero".to_string(),
        });
    }
    if num.degree() > den.degree() {
        return Err(ControlError::InvalidPlant {
            what: format!(
                "numerator order ({}) exceeds denominator order ({})",
                num.degree(),
                den.degree()
            ),
        });
    }
    Ok((num, den))
}

/// Design a pole-placement controller for `plant` meeting `spec`.
///
/// # Errors
///
/// - [`ControlError::InvalidSpec`] / [`ControlError::InvalidPlant`] for bad input.
/// - [`ControlError::InsufficientOrder`] when the loop cannot host the dominant pair.
/// - [`ControlError::DesignFailure`] when the Sylvester matrix is singular; the
///   caller has no controller and must not simulate.
pub fn design_controller(
    plant: &TransferFunction,
    spec: &DesignSpec,
) -> ControlResult<ControllerDesign> {
    spec.validate()?;
    let (np, dp) = validate_plant(plant)?;

    // 1. integrator augmentation
    let existing_integrators = count_integrators(&dp);
    let integrators_added = integrators_to_add(&dp, spec.input);
    let s_term = Polynomial::s_pow(integrators_added);
    let dp_ext = multiply(&dp, &s_term);

    let n_ext = dp_ext.degree();
    if n_ext == 0 {
        return Err(ControlError::InsufficientOrder {
            available: 0,
            required: 1,
        });
    }
    let deg_ctrl = n_ext - 1;
    let total_order = n_ext + deg_ctrl;
    debug!(
        existing_integrators,
        integrators_added, n_ext, deg_ctrl, "augmented plant denominator"
    );

    // 2. desired characteristic polynomial
    let dominant = spec.dominant_poles();
    let (a_cl, far) = desired_characteristic_polynomial(&dominant, total_order)?;
    debug!(
        zeta = dominant.zeta,
        omega_n = dominant.omega_n,
        far_poles = ?far.iter().map(|p| p.re).collect::<Vec<_>>(),
        "desired closed-loop poles"
    );

    // 3. Sylvester system
    let block = deg_ctrl + 1;
    let num_vars = 2 * block;
    let m = sylvester_matrix(&dp_ext, &np, deg_ctrl);
    let target = DVector::from_iterator(num_vars, (0..num_vars).map(|i| a_cl.coeff(i)));

    // 4. solve
    let rcond = reciprocal_condition(&m);
    if !(rcond > SINGULAR_RCOND) {
        return Err(ControlError::DesignFailure {
            hint: diagnose_singularity(&dp_ext, &np),
            rcond,
        });
    }
    if rcond < ILL_CONDITIONED_RCOND {
        warn!(rcond, "Sylvester matrix is ill-conditioned; controller may be fragile");
    }

    let lu = m.clone().lu();
    let mut x = lu.solve(&target).ok_or_else(|| ControlError::DesignFailure {
        hint: diagnose_singularity(&dp_ext, &np),
        rcond,
    })?;
    // one step of iterative refinement
    let residual = &target - &m * &x;
    if let Some(dx) = lu.solve(&residual) {
        x += dx;
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(ControlError::DesignFailure {
            hint: diagnose_singularity(&dp_ext, &np),
            rcond,
        });
    }

    // 5. reinstate injected integrators
    let a_part = Polynomial::new(x.rows(0, block).iter().copied().collect::<Vec<_>>()).suppress_small();
    let b_part =
        Polynomial::new(x.rows(block, block).iter().copied().collect::<Vec<_>>()).suppress_small();
    let den = multiply(&a_part, &s_term);

    Ok(ControllerDesign {
        num: b_part,
        den,
        integrators_added,
        existing_integrators,
        zeta: dominant.zeta,
        omega_n: dominant.omega_n,
        dominant_pole: dominant.pole,
        far_poles: far,
        desired_char_poly: a_cl,
        rcond,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(mp: f64, ts: f64, input: InputClass) -> DesignSpec {
        DesignSpec::new(mp, ts, input).unwrap()
    }

    #[test]
    fn integrator_counting() {
        let den = Polynomial::new(vec![0.0, 1.0, 1.0]);
        assert_eq!(count_integrators(&den), 1);
        assert_eq!(integrators_to_add(&den, InputClass::Step), 0);
        assert_eq!(integrators_to_add(&den, InputClass::Ramp), 1);
        let den = Polynomial::new(vec![2.0, 1.0]);
        assert_eq!(integrators_to_add(&den, InputClass::Ramp), 2);
    }

    #[test]
    fn far_poles_are_spread_and_distinct() {
        let d = DominantPoles::from_spec(10.0, 2.0);
        let far = far_poles(&d, 3);
        assert!((far[0].re + 20.0).abs() < 1e-9);
        assert!((far[1].re + 22.0).abs() < 1e-9);
        assert!((far[2].re + 24.0).abs() < 1e-9);

        // slow dominant pair: floor applies
        let slow = DominantPoles::from_spec(10.0, 40.0);
        assert!((far_poles(&slow, 1)[0].re + FAR_POLE_FLOOR).abs() < 1e-12);
    }

    #[test]
    fn desired_polynomial_is_monic_with_requested_order() {
        let d = DominantPoles::from_spec(10.0, 2.0);
        let (a_cl, far) = desired_characteristic_polynomial(&d, 5).unwrap();
        assert_eq!(a_cl.degree(), 5);
        assert_eq!(far.len(), 3);
        assert!((a_cl.leading() - 1.0).abs() < 1e-12);
        assert!(matches!(
            desired_characteristic_polynomial(&d, 1),
            Err(ControlError::InsufficientOrder { available: 1, required: 2 })
        ));
    }

    #[test]
    fn sylvester_layout() {
        // Dp_ext = s + s^2, Np = 10, deg_ctrl = 1
        let m = sylvester_matrix(
            &Polynomial::new(vec![0.0, 1.0, 1.0]),
            &Polynomial::new(vec![10.0]),
            1,
        );
        let expected = DMatrix::from_row_slice(
            4,
            4,
            &[
                0.0, 0.0, 10.0, 0.0, //
                1.0, 0.0, 0.0, 10.0, //
                1.0, 1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0,
            ],
        );
        assert_eq!(m, expected);
    }

    #[test]
    fn lead_controller_for_type_one_plant() {
        // G = 10 / (s^2 + s); hand solution: A = 23 + s, B = 22.894 + 6.845 s
        let plant = TransferFunction::new(vec![10.0], vec![0.0, 1.0, 1.0]);
        let design = design_controller(&plant, &spec(10.0, 2.0, InputClass::Step)).unwrap();
        assert_eq!(design.integrators_added, 0);
        assert_eq!(design.existing_integrators, 1);
        assert_eq!(design.den.len(), 2);
        assert!((design.den.coeff(1) - 1.0).abs() < 1e-9);
        assert!((design.den.coeff(0) - 23.0).abs() < 1e-9);
        let a_cl = &design.desired_char_poly;
        assert!((design.num.coeff(0) - a_cl.coeff(0) / 10.0).abs() < 1e-9);
        assert!((design.num.coeff(1) - (a_cl.coeff(1) - 23.0) / 10.0).abs() < 1e-9);
        assert!(design.verify(&plant) < 1e-9);
    }

    #[test]
    fn ramp_design_injects_integrator_into_controller() {
        let plant = TransferFunction::new(vec![10.0], vec![0.0, 1.0, 1.0]);
        let design = design_controller(&plant, &spec(10.0, 2.0, InputClass::Ramp)).unwrap();
        assert_eq!(design.integrators_added, 1);
        assert_eq!(design.den.coeff(0), 0.0);
        assert_eq!(design.desired_char_poly.degree(), 5);
        assert!(design.verify(&plant) < 1e-6);
    }

    #[test]
    fn cancelling_plant_is_design_failure() {
        // (s + s^2) / (s + s^2): the common factor makes M singular
        let plant = TransferFunction::new(vec![0.0, 1.0, 1.0], vec![0.0, 1.0, 1.0]);
        assert_eq!(count_integrators(&plant.den), 1);
        assert_eq!(integrators_to_add(&plant.den, InputClass::Step), 0);
        let err = design_controller(&plant, &spec(10.0, 2.0, InputClass::Step)).unwrap_err();
        match err {
            ControlError::DesignFailure { hint, .. } => {
                assert!(matches!(hint, SingularityHint::PoleZeroCancellation { .. }))
            }
            other => panic!("expected design failure, got {other:?}"),
        }
    }

    #[test]
    fn zero_numerator_is_uncontrollable() {
        let plant = TransferFunction::new(vec![0.0], vec![1.0, 1.0]);
        let err = design_controller(&plant, &spec(10.0, 2.0, InputClass::Step)).unwrap_err();
        assert!(matches!(
            err,
            ControlError::DesignFailure {
                hint: SingularityHint::Uncontrollable,
                ..
            }
        ));
    }

    #[test]
    fn improper_plant_rejected() {
        let plant = TransferFunction::new(vec![1.0, 1.0, 1.0], vec![1.0, 1.0]);
        let err = design_controller(&plant, &spec(10.0, 2.0, InputClass::Step)).unwrap_err();
        assert!(matches!(err, ControlError::InvalidPlant { .. }));
    }

    #[test]
    fn small_leading_coefficient_keeps_plant_order() {
        // fast pole near -2e6: 5e-7 s^2 + s + 1
        let fast = TransferFunction::new(vec![1.0], vec![1.0, 1.0, 5e-7]);
        let (_, den) = validate_plant(&fast).unwrap();
        assert_eq!(den.degree(), 2);
        assert_eq!(den.leading(), 5e-7);

        // float noise on the top term is still dropped
        let noisy = TransferFunction::new(vec![1.0], vec![1.0, 1.0, 1e-9]);
        let (_, den) = validate_plant(&noisy).unwrap();
        assert_eq!(den.degree(), 1);
    }

    #[test]
    fn static_gain_plant_cannot_host_complex_pair() {
        let plant = TransferFunction::new(vec![2.0], vec![1.0]);
        let err = design_controller(&plant, &spec(10.0, 2.0, InputClass::Step)).unwrap_err();
        assert!(matches!(err, ControlError::InsufficientOrder { .. }));

        // a critically damped target fits: pure integrator 1/s
        let design = design_controller(&plant, &spec(0.0, 2.0, InputClass::Step)).unwrap();
        assert!(design.verify(&plant) < 1e-9);
    }
}
