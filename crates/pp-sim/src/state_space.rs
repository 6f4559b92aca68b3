//! Controllable canonical realization and the stateful simulator built on it.
//!
//! Output evaluation and state advance are separate calls so that a feedback
//! loop can read the output, decide what to do with it, and only then choose
//! whether (and with which input) to integrate.

use nalgebra::{DMatrix, DVector, RowDVector};
use pp_core::numeric::{COEFF_EPS, LEADING_COEFF_MIN, Real, ensure_all_finite};
use pp_core::{Polynomial, TransferFunction};

use crate::error::{SimError, SimResult};
use crate::integrator::{Integrator, RK4};
use crate::model::TransientModel;

/// `x' = A x + B u`, `y = C x + D u` in controllable canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpace {
    a: DMatrix<Real>,
    b: DVector<Real>,
    c: RowDVector<Real>,
    d: Real,
}

impl StateSpace {
    /// Realize `num / den` (ascending coefficients).
    ///
    /// # Errors
    ///
    /// - [`SimError::Causality`] if `deg(num) > deg(den)`.
    /// - [`SimError::DegenerateModel`] if the leading denominator coefficient
    ///   is below [`LEADING_COEFF_MIN`] in magnitude.
    pub fn from_transfer_function(tf: &TransferFunction) -> SimResult<Self> {
        ensure_all_finite(tf.num.coeffs(), "numerator")?;
        ensure_all_finite(tf.den.coeffs(), "denominator")?;

        let num = tf.num.trimmed(COEFF_EPS);
        let den = &tf.den;
        if den.is_empty() {
            return Err(SimError::DegenerateModel {
                what: "denominator has no coefficients",
            });
        }
        if num.degree() > den.degree() {
            return Err(SimError::Causality {
                num_degree: num.degree(),
                den_degree: den.degree(),
            });
        }
        let lead = den.leading();
        if lead.abs() < LEADING_COEFF_MIN {
            return Err(SimError::DegenerateModel {
                what: "leading denominator coefficient is zero",
            });
        }

        let n = den.degree();
        let den_n: Vec<Real> = den.coeffs().iter().map(|c| c / lead).collect();
        let num_n: Vec<Real> = (0..=n).map(|i| num.coeff(i) / lead).collect();

        let mut a = DMatrix::<Real>::zeros(n, n);
        let mut b = DVector::<Real>::zeros(n);
        if n > 0 {
            for i in 0..n - 1 {
                a[(i, i + 1)] = 1.0;
            }
            for j in 0..n {
                a[(n - 1, j)] = -den_n[j];
            }
            b[n - 1] = 1.0;
        }
        let d = num_n[n];
        let c = RowDVector::from_iterator(n, (0..n).map(|i| num_n[i] - den_n[i] * d));

        Ok(Self { a, b, c, d })
    }

    /// Number of states (denominator degree).
    pub fn order(&self) -> usize {
        self.b.len()
    }

    pub fn a(&self) -> &DMatrix<Real> {
        &self.a
    }

    pub fn b(&self) -> &DVector<Real> {
        &self.b
    }

    pub fn c(&self) -> &RowDVector<Real> {
        &self.c
    }

    pub fn d(&self) -> Real {
        self.d
    }

    /// `C x + D u`
    pub fn output(&self, x: &DVector<Real>, u: Real) -> Real {
        self.c.iter().zip(x.iter()).map(|(c, x)| c * x).sum::<Real>() + self.d * u
    }

    /// `A x + B u`
    pub fn derivative(&self, x: &DVector<Real>, u: Real) -> DVector<Real> {
        &self.a * x + &self.b * u
    }
}

/// The realization with its input held constant over one step.
struct HeldInput<'a> {
    ss: &'a StateSpace,
    u: Real,
}

impl TransientModel for HeldInput<'_> {
    type State = DVector<Real>;

    fn rhs(&self, _t: f64, x: &Self::State) -> Self::State {
        self.ss.derivative(x, self.u)
    }

    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State {
        a + b
    }

    fn scale(&self, a: &Self::State, scale: f64) -> Self::State {
        a * scale
    }
}

/// One linear SISO system with its own state vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulator {
    model: StateSpace,
    state: DVector<Real>,
}

impl Simulator {
    /// Build a simulator at rest (zero state) for `tf`.
    pub fn new(tf: &TransferFunction) -> SimResult<Self> {
        let model = StateSpace::from_transfer_function(tf)?;
        let state = DVector::zeros(model.order());
        Ok(Self { model, state })
    }

    /// Build from raw ascending coefficient slices.
    pub fn from_coeffs(num: &[Real], den: &[Real]) -> SimResult<Self> {
        Self::new(&TransferFunction::new(
            Polynomial::from(num),
            Polynomial::from(den),
        ))
    }

    pub fn model(&self) -> &StateSpace {
        &self.model
    }

    pub fn order(&self) -> usize {
        self.model.order()
    }

    pub fn state(&self) -> &DVector<Real> {
        &self.state
    }

    /// Return to zero state.
    pub fn reset(&mut self) {
        self.state.fill(0.0);
    }

    /// Output for input `u` at the current state; does not touch the state.
    pub fn compute_output(&self, u: Real) -> Real {
        self.model.output(&self.state, u)
    }

    /// Integrate one RK4 step of length `dt` with `u` held constant.
    pub fn advance_state(&mut self, u: Real, dt: Real) {
        if self.order() == 0 {
            return;
        }
        let held = HeldInput {
            ss: &self.model,
            u,
        };
        self.state = RK4.step(&held, 0.0, &self.state, dt);
    }

    /// Advance by `dt` with input `u`, then return the new output.
    pub fn step(&mut self, u: Real, dt: Real) -> Real {
        self.advance_state(u, dt);
        self.compute_output(u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn improper_transfer_function_is_rejected() {
        let err = Simulator::from_coeffs(&[0.0, 0.0, 1.0], &[0.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            SimError::Causality {
                num_degree: 2,
                den_degree: 1
            }
        );
    }

    #[test]
    fn zero_leading_coefficient_is_degenerate() {
        let err = Simulator::from_coeffs(&[1.0], &[1.0, 0.0]).unwrap_err();
        assert!(matches!(err, SimError::DegenerateModel { .. }));
        assert!(matches!(
            Simulator::from_coeffs(&[1.0], &[]),
            Err(SimError::DegenerateModel { .. })
        ));
    }

    #[test]
    fn non_finite_coefficients_are_rejected() {
        let err = Simulator::from_coeffs(&[f64::NAN], &[1.0, 1.0]).unwrap_err();
        assert!(matches!(err, SimError::Core(_)));
    }

    #[test]
    fn canonical_form_layout() {
        // (1 + 2s + 3s^2) / (4 + 6s + 2s^2) normalizes to
        // (0.5 + s + 1.5s^2) / (2 + 3s + s^2)
        let tf = TransferFunction::new(vec![1.0, 2.0, 3.0], vec![4.0, 6.0, 2.0]);
        let ss = StateSpace::from_transfer_function(&tf).unwrap();
        assert_eq!(ss.order(), 2);
        assert_eq!(ss.a(), &DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -2.0, -3.0]));
        assert_eq!(ss.b().as_slice(), &[0.0, 1.0]);
        assert_eq!(ss.d(), 1.5);
        // C[i] = num[i] - den[i] * D
        assert_eq!(ss.c()[0], 0.5 - 2.0 * 1.5);
        assert_eq!(ss.c()[1], 1.0 - 3.0 * 1.5);
    }

    #[test]
    fn first_order_step_response() {
        // 1 / (s + 1)
        let mut sim = Simulator::from_coeffs(&[1.0], &[1.0, 1.0]).unwrap();
        let dt = 0.01;
        for _ in 0..100 {
            sim.advance_state(1.0, dt);
        }
        let y = sim.compute_output(1.0);
        assert!((y - (1.0 - (-1.0_f64).exp())).abs() < 1e-6);
    }

    #[test]
    fn compute_output_does_not_mutate() {
        let mut sim = Simulator::from_coeffs(&[1.0], &[1.0, 1.0]).unwrap();
        sim.advance_state(1.0, 0.1);
        let before = sim.state().clone();
        let y1 = sim.compute_output(5.0);
        let y2 = sim.compute_output(5.0);
        assert_eq!(y1, y2);
        assert_eq!(sim.state(), &before);
    }

    #[test]
    fn static_gain_and_feedthrough() {
        let mut gain = Simulator::from_coeffs(&[3.0], &[2.0]).unwrap();
        assert_eq!(gain.order(), 0);
        assert_eq!(gain.step(4.0, 0.1), 6.0);

        // (s + 2) / (s + 1) has D = 1
        let sim = Simulator::from_coeffs(&[2.0, 1.0], &[1.0, 1.0]).unwrap();
        assert_eq!(sim.compute_output(1.0), 1.0);
    }

    #[test]
    fn step_then_reset() {
        let mut sim = Simulator::from_coeffs(&[1.0], &[0.0, 1.0]).unwrap();
        // pure integrator
        let y = sim.step(2.0, 0.5);
        assert!((y - 1.0).abs() < 1e-12);
        sim.reset();
        assert_eq!(sim.compute_output(0.0), 0.0);
    }
}
