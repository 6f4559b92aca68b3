//! Time-domain simulation for designed control loops.
//!
//! Provides:
//! - Controllable canonical state-space realization of a transfer function
//! - Simulator with separate output evaluation and RK4 state advance
//! - Saturating actuator with clamping anti-windup
//! - Closed-loop driver with an automatic time grid
//! - Step-response performance analysis

pub mod actuator;
pub mod analysis;
pub mod closed_loop;
pub mod error;
pub mod integrator;
pub mod model;
pub mod state_space;

pub use actuator::{AntiWindup, Saturation};
pub use analysis::{PerformanceMetrics, analyze_performance};
pub use closed_loop::{
    ClosedLoopOptions, Trajectory, choose_time_step, run_closed_loop, run_closed_loop_simulation,
    simulate_response,
};
pub use error::{SimError, SimResult};
pub use integrator::{Integrator, RK4};
pub use model::TransientModel;
pub use state_space::{Simulator, StateSpace};
