//! CSV export of trajectories and JSON export of design reports.

use std::path::Path;

use pp_sim::Trajectory;

use crate::design_service::DesignReport;
use crate::error::{AppError, AppResult};

pub const TRAJECTORY_CSV_HEADER: &str = "time_s,reference,output,control_effort,saturated";

/// One row per sample, header first.
pub fn trajectory_to_csv(traj: &Trajectory) -> String {
    let mut csv = String::from(TRAJECTORY_CSV_HEADER);
    csv.push('\n');
    for i in 0..traj.len() {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            traj.time[i],
            traj.reference[i],
            traj.output[i],
            traj.control_effort[i],
            u8::from(traj.saturated[i])
        ));
    }
    csv
}

pub fn save_trajectory_csv(path: &Path, traj: &Trajectory) -> AppResult<()> {
    std::fs::write(path, trajectory_to_csv(traj)).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn report_to_json(report: &DesignReport) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn save_report_json(path: &Path, report: &DesignReport) -> AppResult<()> {
    std::fs::write(path, report_to_json(report)?).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
