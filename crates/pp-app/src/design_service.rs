//! End-to-end design pipeline: synthesis, stability check, closed-loop
//! simulation and performance metrics for one design project.

use std::path::Path;

use pp_controls::{InputClass, RouthArray, StabilityVerdict, design_controller};
use pp_core::timing::Timer;
use pp_core::{Polynomial, TransferFunction};
use pp_sim::{
    ClosedLoopOptions, PerformanceMetrics, Trajectory, analyze_performance, run_closed_loop,
    simulate_response,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::project_service::{load_project, plant_of, spec_of, validate_project};
use crate::schema::DesignProject;

/// Wall time per pipeline stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageTimings {
    pub design_s: f64,
    pub stability_s: f64,
    pub simulation_s: f64,
    pub analysis_s: f64,
    pub total_s: f64,
}

/// A pole written as real and imaginary parts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoleSummary {
    pub re: f64,
    pub im: f64,
}

/// Everything one design run produced.
#[derive(Debug, Clone, Serialize)]
pub struct DesignReport {
    pub name: String,
    pub input: InputClass,
    pub plant: TransferFunction,
    pub controller: TransferFunction,
    pub closed_loop: TransferFunction,
    pub zeta: f64,
    pub omega_n: f64,
    pub dominant_pole: PoleSummary,
    pub far_poles: Vec<f64>,
    pub existing_integrators: usize,
    pub integrators_added: usize,
    pub desired_char_poly: Polynomial,
    /// Reciprocal condition number of the Sylvester matrix.
    pub rcond: f64,
    /// Largest relative mismatch of the realized characteristic polynomial.
    pub residual: f64,
    pub stability: StabilityVerdict,
    pub rhp_roots: usize,
    pub dt_s: f64,
    pub t_end_s: f64,
    /// Saturated closed-loop metrics; step inputs only.
    pub metrics: Option<PerformanceMetrics>,
    /// Metrics of the unconstrained linear closed loop; step inputs only.
    pub linear_metrics: Option<PerformanceMetrics>,
    /// `|r - y|` at the end of the run.
    pub tracking_error: Option<f64>,
    pub saturated_fraction: f64,
    pub timings: StageTimings,
    #[serde(skip)]
    pub trajectory: Trajectory,
}

/// Load, validate and run the project at `path`.
pub fn run_design_file(path: &Path) -> AppResult<DesignReport> {
    let project = load_project(path)?;
    run_design(&project)
}

/// Run the full pipeline for `project`.
///
/// A design failure stops the pipeline. An unstable closed loop does not: it
/// is reported and simulated so the divergence is visible.
pub fn run_design(project: &DesignProject) -> AppResult<DesignReport> {
    let total = Timer::start("total");
    validate_project(project)?;
    let plant = plant_of(project);
    let spec = spec_of(project)?;
    info!(
        name = %project.name,
        plant_num = %plant.num,
        plant_den = %plant.den,
        input = %spec.input,
        "starting design"
    );

    let timer = Timer::start("design");
    let design = design_controller(&plant, &spec)?;
    let residual = design.verify(&plant);
    let design_s = finish_stage(timer);
    info!(
        zeta = design.zeta,
        omega_n = design.omega_n,
        integrators_added = design.integrators_added,
        ctrl_num = %design.num,
        ctrl_den = %design.den,
        "controller designed"
    );

    let timer = Timer::start("stability");
    let controller = design.controller();
    let closed_loop = design.closed_loop(&plant);
    let routh = RouthArray::build(&closed_loop.den);
    let stability = routh.verdict();
    let stability_s = finish_stage(timer);
    if stability.is_stable() {
        info!("closed loop passes the Routh test");
    } else {
        warn!(
            ?stability,
            sign_changes = routh.sign_changes(),
            "closed loop is not stable; simulating anyway"
        );
    }

    let timer = Timer::start("simulation");
    let sim = &project.simulation;
    let mut opts = ClosedLoopOptions::new(
        spec.input,
        sim.actuator_limit.unwrap_or(f64::INFINITY),
        spec.settling_time,
    )
    .with_anti_windup(sim.anti_windup);
    if let Some(dt) = sim.dt_s {
        opts = opts.with_time_step(dt);
    }
    if let Some(t_end) = sim.t_end_s {
        opts = opts.with_horizon(t_end);
    }
    let (dt_s, t_end_s) = opts.resolve(&plant, &controller)?;
    let trajectory = run_closed_loop(&plant, &controller, &opts)?;
    let linear = simulate_response(&closed_loop, spec.input, dt_s, t_end_s)?;
    let simulation_s = finish_stage(timer);

    let timer = Timer::start("analysis");
    let (metrics, linear_metrics) = match spec.input {
        InputClass::Step => (
            step_metrics(&trajectory, "closed loop"),
            step_metrics(&linear, "linear closed loop"),
        ),
        InputClass::Ramp => (None, None),
    };
    let tracking_error = trajectory.final_tracking_error();
    let analysis_s = finish_stage(timer);

    if let Some(m) = &metrics {
        info!(
            overshoot_pct = m.overshoot_pct,
            settling_time = m.settling_time,
            error = m.error,
            "step response"
        );
    }

    Ok(DesignReport {
        name: project.name.clone(),
        input: spec.input,
        plant,
        controller,
        closed_loop,
        zeta: design.zeta,
        omega_n: design.omega_n,
        dominant_pole: PoleSummary {
            re: design.dominant_pole.re,
            im: design.dominant_pole.im,
        },
        far_poles: design.far_poles.iter().map(|p| p.re).collect(),
        existing_integrators: design.existing_integrators,
        integrators_added: design.integrators_added,
        desired_char_poly: design.desired_char_poly,
        rcond: design.rcond,
        residual,
        stability,
        rhp_roots: routh.sign_changes(),
        dt_s,
        t_end_s,
        metrics,
        linear_metrics,
        tracking_error,
        saturated_fraction: trajectory.saturated_fraction(),
        timings: StageTimings {
            design_s,
            stability_s,
            simulation_s,
            analysis_s,
            total_s: finish_stage(total),
        },
        trajectory,
    })
}

fn finish_stage(timer: Timer) -> f64 {
    let stage = timer.label();
    let elapsed_s = timer.stop();
    debug!(stage, elapsed_s, "stage finished");
    elapsed_s
}

fn step_metrics(traj: &Trajectory, what: &str) -> Option<PerformanceMetrics> {
    match analyze_performance(&traj.time, &traj.output, 1.0) {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(error = %e, "no metrics for {}", what);
            None
        }
    }
}
