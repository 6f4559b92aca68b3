//! Design project file format.

use pp_controls::InputClass;
use pp_sim::AntiWindup;
use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignProject {
    pub version: u32,
    pub name: String,
    pub plant: PlantDef,
    pub spec: SpecDef,
    #[serde(default)]
    pub simulation: SimulationDef,
}

/// Plant transfer function, ascending coefficients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantDef {
    pub num: Vec<f64>,
    pub den: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecDef {
    pub overshoot_pct: f64,
    pub settling_time_s: f64,
    #[serde(default)]
    pub input: InputClass,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SimulationDef {
    /// Symmetric actuator limit; absent means unconstrained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actuator_limit: Option<f64>,
    #[serde(default)]
    pub anti_windup: AntiWindup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_end_s: Option<f64>,
}

impl DesignProject {
    /// Starter project: `G(s) = 10 / (s + s^2)`, 10% overshoot, 2 s settling.
    pub fn template() -> Self {
        Self {
            version: LATEST_VERSION,
            name: "type-one plant".to_string(),
            plant: PlantDef {
                num: vec![10.0],
                den: vec![0.0, 1.0, 1.0],
            },
            spec: SpecDef {
                overshoot_pct: 10.0,
                settling_time_s: 2.0,
                input: InputClass::Step,
            },
            simulation: SimulationDef::default(),
        }
    }
}
