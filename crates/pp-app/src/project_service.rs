//! Project loading, saving, and validation.

use std::path::Path;

use pp_controls::DesignSpec;
use pp_core::TransferFunction;

use crate::error::{AppError, AppResult};
use crate::schema::{DesignProject, LATEST_VERSION};

/// Load project from a YAML file.
pub fn load_project(path: &Path) -> AppResult<DesignProject> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ProjectFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let project: DesignProject = serde_yaml::from_str(&content)
        .map_err(|e| AppError::Project(format!("Failed to parse project YAML: {}", e)))?;

    Ok(project)
}

/// Save project to a YAML file.
pub fn save_project(path: &Path, project: &DesignProject) -> AppResult<()> {
    let content = serde_yaml::to_string(project)
        .map_err(|e| AppError::Project(format!("Failed to serialize project: {}", e)))?;

    std::fs::write(path, content).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Check everything that can be checked without running a design.
pub fn validate_project(project: &DesignProject) -> AppResult<()> {
    if project.version != LATEST_VERSION {
        return Err(AppError::Validation(format!(
            "Unsupported project version {} (expected {})",
            project.version, LATEST_VERSION
        )));
    }
    if project.plant.num.is_empty() || project.plant.den.is_empty() {
        return Err(AppError::Validation(
            "Plant numerator and denominator must be non-empty".to_string(),
        ));
    }
    if project
        .plant
        .num
        .iter()
        .chain(&project.plant.den)
        .any(|c| !c.is_finite())
    {
        return Err(AppError::Validation(
            "Plant coefficients must be finite".to_string(),
        ));
    }
    if !plant_of(project).is_proper() {
        return Err(AppError::Validation(
            "Plant numerator order exceeds denominator order".to_string(),
        ));
    }

    spec_of(project)?;

    let sim = &project.simulation;
    if let Some(limit) = sim.actuator_limit {
        if limit.is_nan() || limit <= 0.0 {
            return Err(AppError::Validation(
                "Actuator limit must be positive".to_string(),
            ));
        }
    }
    for (value, what) in [(sim.dt_s, "dt_s"), (sim.t_end_s, "t_end_s")] {
        if let Some(v) = value {
            if !v.is_finite() || v <= 0.0 {
                return Err(AppError::Validation(format!("{} must be positive", what)));
            }
        }
    }

    Ok(())
}

/// Plant transfer function of `project`.
pub fn plant_of(project: &DesignProject) -> TransferFunction {
    TransferFunction::new(project.plant.num.clone(), project.plant.den.clone())
}

/// Validated design requirements of `project`.
pub fn spec_of(project: &DesignProject) -> AppResult<DesignSpec> {
    Ok(DesignSpec::new(
        project.spec.overshoot_pct,
        project.spec.settling_time_s,
        project.spec.input,
    )?)
}
