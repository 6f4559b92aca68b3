//! Fixed-step time integrators.

use crate::model::TransientModel;

/// Trait for time integrators.
pub trait Integrator {
    /// Advance state by one time step using the transient model.
    fn step<M: TransientModel>(&self, model: &M, t: f64, x: &M::State, dt: f64) -> M::State;
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Copy, Debug, Default)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<M: TransientModel>(&self, model: &M, t: f64, x: &M::State, dt: f64) -> M::State {
        let k1 = model.rhs(t, x);

        let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
        let k2 = model.rhs(t + 0.5 * dt, &x2);

        let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
        let k3 = model.rhs(t + 0.5 * dt, &x3);

        let x4 = model.add(x, &model.scale(&k3, dt));
        let k4 = model.rhs(t + dt, &x4);

        // x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        let k_sum = model.add(
            &model.add(&k1, &model.scale(&k2, 2.0)),
            &model.add(&model.scale(&k3, 2.0), &k4),
        );

        model.add(x, &model.scale(&k_sum, dt / 6.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// x' = -x
    struct Decay;

    impl TransientModel for Decay {
        type State = f64;

        fn rhs(&self, _t: f64, x: &f64) -> f64 {
            -x
        }

        fn add(&self, a: &f64, b: &f64) -> f64 {
            a + b
        }

        fn scale(&self, a: &f64, scale: f64) -> f64 {
            a * scale
        }
    }

    #[test]
    fn rk4_matches_exponential_decay() {
        let dt = 0.1;
        let mut x = 1.0;
        for k in 0..10 {
            x = RK4.step(&Decay, k as f64 * dt, &x, dt);
        }
        assert!((x - (-1.0_f64).exp()).abs() < 1e-6);
    }

    /// x' = t, exercises the time argument
    struct Clock;

    impl TransientModel for Clock {
        type State = f64;

        fn rhs(&self, t: f64, _x: &f64) -> f64 {
            t
        }

        fn add(&self, a: &f64, b: &f64) -> f64 {
            a + b
        }

        fn scale(&self, a: &f64, scale: f64) -> f64 {
            a * scale
        }
    }

    #[test]
    fn rk4_is_exact_for_polynomial_time_input() {
        let x = RK4.step(&Clock, 1.0, &0.0, 0.5);
        // integral of t from 1 to 1.5
        assert!((x - 0.625).abs() < 1e-12);
    }
}
