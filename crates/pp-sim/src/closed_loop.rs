//! Closed-loop simulation of a controller driving a plant through a
//! saturating actuator.

use pp_controls::InputClass;
use pp_core::numeric::{LEADING_COEFF_MIN, Real, ZERO_COEFF_TOL};
use pp_core::{Polynomial, TransferFunction};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::actuator::{AntiWindup, Saturation};
use crate::error::{SimError, SimResult};
use crate::state_space::Simulator;

/// Samples per settling time.
pub const SAMPLES_PER_SETTLING_TIME: Real = 200.0;

/// Largest step the driver will choose on its own (s).
pub const MAX_TIME_STEP: Real = 0.01;

/// Smallest step the driver will choose on its own (s).
pub const MIN_TIME_STEP: Real = 1e-5;

/// Default horizon in multiples of the settling time.
pub const HORIZON_SETTLING_MULTIPLE: Real = 4.0;

/// Longest time grid a single run will allocate.
pub const MAX_SAMPLES: usize = 10_000_000;

/// Cauchy bound `1 + max |a_i / a_n|` on the root magnitudes of `den`.
pub fn cauchy_root_bound(den: &Polynomial) -> Real {
    let p = den.trimmed(ZERO_COEFF_TOL);
    let lead = p.leading();
    if p.degree() == 0 || lead.abs() < LEADING_COEFF_MIN {
        return 0.0;
    }
    let max_ratio = p.coeffs()[..p.degree()]
        .iter()
        .map(|c| (c / lead).abs())
        .fold(0.0, Real::max);
    1.0 + max_ratio
}

/// Fixed step for a run with settling time `ts` over systems with the given
/// denominators.
///
/// Resolves `ts` with [`SAMPLES_PER_SETTLING_TIME`] samples, caps at
/// [`MAX_TIME_STEP`], keeps `|lambda| * dt <= 1` for every root bound (inside
/// the RK4 stability region) and never goes below [`MIN_TIME_STEP`].
pub fn choose_time_step(ts: Real, denominators: &[&Polynomial]) -> Real {
    let mut dt = (ts / SAMPLES_PER_SETTLING_TIME).min(MAX_TIME_STEP);
    for den in denominators {
        let rho = cauchy_root_bound(den);
        if rho > 0.0 {
            dt = dt.min(1.0 / rho);
        }
    }
    dt.max(MIN_TIME_STEP)
}

/// Settings for one closed-loop run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedLoopOptions {
    pub input: InputClass,
    /// Symmetric actuator limit; infinite for an unconstrained loop.
    pub actuator_limit: Real,
    pub anti_windup: AntiWindup,
    /// Design settling time, drives the automatic step and horizon.
    pub settling_time: Real,
    /// Overrides the automatic step.
    pub dt: Option<Real>,
    /// Overrides the automatic horizon.
    pub t_end: Option<Real>,
}

impl ClosedLoopOptions {
    pub fn new(input: InputClass, actuator_limit: Real, settling_time: Real) -> Self {
        Self {
            input,
            actuator_limit,
            anti_windup: AntiWindup::default(),
            settling_time,
            dt: None,
            t_end: None,
        }
    }

    pub fn with_anti_windup(mut self, anti_windup: AntiWindup) -> Self {
        self.anti_windup = anti_windup;
        self
    }

    pub fn with_time_step(mut self, dt: Real) -> Self {
        self.dt = Some(dt);
        self
    }

    pub fn with_horizon(mut self, t_end: Real) -> Self {
        self.t_end = Some(t_end);
        self
    }

    /// Step and horizon actually used for `plant` and `controller`.
    pub fn resolve(
        &self,
        plant: &TransferFunction,
        controller: &TransferFunction,
    ) -> SimResult<(Real, Real)> {
        if !self.settling_time.is_finite() || self.settling_time <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "settling time must be positive",
            });
        }
        let dt = self.dt.unwrap_or_else(|| {
            choose_time_step(self.settling_time, &[&plant.den, &controller.den])
        });
        let t_end = self
            .t_end
            .unwrap_or(HORIZON_SETTLING_MULTIPLE * self.settling_time);
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if !t_end.is_finite() || t_end <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "t_end must be positive",
            });
        }
        Ok((dt, t_end))
    }
}

/// Sampled signals of one run, all of equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub time: Vec<Real>,
    pub output: Vec<Real>,
    pub control_effort: Vec<Real>,
    pub reference: Vec<Real>,
    pub saturated: Vec<bool>,
}

impl Trajectory {
    fn with_capacity(n: usize) -> Self {
        Self {
            time: Vec::with_capacity(n),
            output: Vec::with_capacity(n),
            control_effort: Vec::with_capacity(n),
            reference: Vec::with_capacity(n),
            saturated: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, t: Real, y: Real, u: Real, r: Real, saturated: bool) {
        self.time.push(t);
        self.output.push(y);
        self.control_effort.push(u);
        self.reference.push(r);
        self.saturated.push(saturated);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Fraction of samples with the actuator clamped.
    pub fn saturated_fraction(&self) -> Real {
        if self.is_empty() {
            return 0.0;
        }
        self.saturated.iter().filter(|s| **s).count() as Real / self.len() as Real
    }

    /// `|r - y|` at the last sample.
    pub fn final_tracking_error(&self) -> Option<Real> {
        let y = self.output.last()?;
        let r = self.reference.last()?;
        Some((r - y).abs())
    }

    /// Largest `|u|` over the run.
    pub fn peak_control_effort(&self) -> Real {
        self.control_effort
            .iter()
            .map(|u| u.abs())
            .fold(0.0, Real::max)
    }
}

fn sample_count(dt: Real, t_end: Real) -> SimResult<usize> {
    let n = (t_end / dt).ceil();
    if !n.is_finite() || n > MAX_SAMPLES as Real {
        return Err(SimError::InvalidArg {
            what: "time grid too fine",
        });
    }
    Ok((n as usize).max(1))
}

/// Simulate `controller` driving `plant` under unity feedback.
///
/// Each sample computes the error from the plant output, evaluates the
/// controller, clamps the result, records, then advances the controller
/// (unless anti-windup holds it) and the plant with the clamped effort.
/// An unstable loop is simulated anyway and shows up as divergence.
pub fn run_closed_loop(
    plant: &TransferFunction,
    controller: &TransferFunction,
    opts: &ClosedLoopOptions,
) -> SimResult<Trajectory> {
    let mut plant_sim = Simulator::new(plant)?;
    let mut ctrl_sim = Simulator::new(controller)?;
    let saturation = Saturation::new(opts.actuator_limit)?;
    let (dt, t_end) = opts.resolve(plant, controller)?;
    let steps = sample_count(dt, t_end)?;
    debug!(dt, t_end, steps, "closed-loop time grid");

    let mut traj = Trajectory::with_capacity(steps);
    let mut u = 0.0;
    let mut y = plant_sim.compute_output(u);
    let mut held = 0usize;

    for k in 0..steps {
        let t = k as Real * dt;
        let r = opts.input.reference(t);
        let e = r - y;
        let raw = ctrl_sim.compute_output(e);
        let (clamped, saturated) = saturation.apply(raw);
        u = clamped;
        traj.push(t, y, u, r, saturated);

        if opts.anti_windup.holds_state(saturated, raw, e) {
            held += 1;
        } else {
            ctrl_sim.advance_state(e, dt);
        }
        plant_sim.advance_state(u, dt);
        y = plant_sim.compute_output(u);
    }

    let fraction = traj.saturated_fraction();
    if fraction > 0.0 {
        warn!(
            saturated_pct = 100.0 * fraction,
            held_steps = held,
            limit = saturation.limit(),
            "actuator saturated during run"
        );
    }
    if traj.output.iter().any(|v| !v.is_finite()) {
        warn!("closed-loop output diverged to a non-finite value");
    }
    Ok(traj)
}

/// Closed loop with the automatic step and horizon and clamping anti-windup.
pub fn run_closed_loop_simulation(
    plant: &TransferFunction,
    controller: &TransferFunction,
    input: InputClass,
    actuator_limit: Real,
    settling_time: Real,
) -> SimResult<Trajectory> {
    run_closed_loop(
        plant,
        controller,
        &ClosedLoopOptions::new(input, actuator_limit, settling_time),
    )
}

/// Response of `tf` driven directly by the reference signal, zero-order held
/// over each step.
pub fn simulate_response(
    tf: &TransferFunction,
    input: InputClass,
    dt: Real,
    t_end: Real,
) -> SimResult<Trajectory> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(SimError::InvalidArg {
            what: "dt must be positive",
        });
    }
    if !t_end.is_finite() || t_end <= 0.0 {
        return Err(SimError::InvalidArg {
            what: "t_end must be positive",
        });
    }
    let mut sim = Simulator::new(tf)?;
    let steps = sample_count(dt, t_end)?;
    let mut traj = Trajectory::with_capacity(steps);
    for k in 0..steps {
        let t = k as Real * dt;
        let r = input.reference(t);
        traj.push(t, sim.compute_output(r), r, r, false);
        sim.advance_state(r, dt);
    }
    Ok(traj)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_step_resolves_settling_time() {
        let den = Polynomial::new(vec![1.0, 1.0]);
        assert!((choose_time_step(1.0, &[&den]) - 0.005).abs() < 1e-15);
        assert!((choose_time_step(20.0, &[&den]) - MAX_TIME_STEP).abs() < 1e-15);
    }

    #[test]
    fn time_step_tracks_fast_poles() {
        // root at -1000
        let den = Polynomial::new(vec![1000.0, 1.0]);
        assert!((cauchy_root_bound(&den) - 1001.0).abs() < 1e-12);
        assert!((choose_time_step(2.0, &[&den]) - 1.0 / 1001.0).abs() < 1e-15);

        let stiff = Polynomial::new(vec![1e9, 1.0]);
        assert_eq!(choose_time_step(2.0, &[&stiff]), MIN_TIME_STEP);
    }

    #[test]
    fn constant_denominator_has_no_bound() {
        assert_eq!(cauchy_root_bound(&Polynomial::constant(3.0)), 0.0);
    }

    #[test]
    fn options_validate_overrides() {
        let plant = TransferFunction::new(vec![1.0], vec![1.0, 1.0]);
        let ctrl = TransferFunction::new(vec![1.0], vec![1.0]);
        let opts = ClosedLoopOptions::new(InputClass::Step, 1.0, 2.0);
        let (dt, t_end) = opts.resolve(&plant, &ctrl).unwrap();
        assert!((dt - 0.01).abs() < 1e-15);
        assert!((t_end - 8.0).abs() < 1e-15);

        assert!(opts.with_time_step(0.0).resolve(&plant, &ctrl).is_err());
        assert!(opts.with_horizon(-1.0).resolve(&plant, &ctrl).is_err());
        let bad_ts = ClosedLoopOptions::new(InputClass::Step, 1.0, 0.0);
        assert!(bad_ts.resolve(&plant, &ctrl).is_err());
    }

    #[test]
    fn proportional_loop_settles_at_static_value() {
        // P controller k = 4 on 1/(s + 1): y_ss = 4/5
        let plant = TransferFunction::new(vec![1.0], vec![1.0, 1.0]);
        let ctrl = TransferFunction::new(vec![4.0], vec![1.0]);
        let traj =
            run_closed_loop_simulation(&plant, &ctrl, InputClass::Step, f64::INFINITY, 2.0)
                .unwrap();
        assert_eq!(traj.len(), 800);
        assert_eq!(traj.time[0], 0.0);
        assert_eq!(traj.output[0], 0.0);
        assert_eq!(traj.control_effort[0], 4.0);
        let y_end = *traj.output.last().unwrap();
        assert!((y_end - 0.8).abs() < 1e-3);
        assert_eq!(traj.saturated_fraction(), 0.0);
    }

    #[test]
    fn effort_never_exceeds_limit() {
        let plant = TransferFunction::new(vec![1.0], vec![1.0, 1.0]);
        let ctrl = TransferFunction::new(vec![50.0], vec![1.0]);
        let traj = run_closed_loop_simulation(&plant, &ctrl, InputClass::Step, 2.0, 2.0).unwrap();
        assert!(traj.peak_control_effort() <= 2.0);
        assert!(traj.saturated[0]);
    }

    #[test]
    fn open_loop_ramp_response() {
        // pure integrator driven by r = 1 gives y = t
        let tf = TransferFunction::new(vec![1.0], vec![0.0, 1.0]);
        let traj = simulate_response(&tf, InputClass::Step, 0.1, 1.0).unwrap();
        assert_eq!(traj.len(), 10);
        for (t, y) in traj.time.iter().zip(&traj.output) {
            assert!((t - y).abs() < 1e-12);
        }
        assert!(simulate_response(&tf, InputClass::Step, 0.0, 1.0).is_err());
    }

    #[test]
    fn oversized_time_grid_is_rejected() {
        let plant = TransferFunction::new(vec![1.0], vec![1.0, 1.0]);
        let ctrl = TransferFunction::new(vec![1.0], vec![1.0]);
        let opts = ClosedLoopOptions::new(InputClass::Step, 1.0, 2.0).with_time_step(1e-19);
        assert!(matches!(
            run_closed_loop(&plant, &ctrl, &opts),
            Err(SimError::InvalidArg {
                what: "time grid too fine"
            })
        ));
        assert!(matches!(
            simulate_response(&plant, InputClass::Step, 1e-9, 8.0),
            Err(SimError::InvalidArg { .. })
        ));
        // exactly at the cap is still allowed to size the grid
        assert_eq!(sample_count(1.0, MAX_SAMPLES as Real).unwrap(), MAX_SAMPLES);
    }
}
