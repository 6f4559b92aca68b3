//! Shared application service layer for poleplace.
//!
//! This crate gives every front end the same entry points: design project
//! files, the full design pipeline, and report/trajectory export.

pub mod design_service;
pub mod error;
pub mod export;
pub mod project_service;
pub mod schema;

pub use design_service::{DesignReport, PoleSummary, StageTimings, run_design, run_design_file};
pub use error::{AppError, AppResult};
pub use export::{report_to_json, save_report_json, save_trajectory_csv, trajectory_to_csv};
pub use project_service::{load_project, plant_of, save_project, spec_of, validate_project};
pub use schema::{DesignProject, LATEST_VERSION, PlantDef, SimulationDef, SpecDef};
