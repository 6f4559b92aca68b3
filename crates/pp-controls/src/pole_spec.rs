//! Time-domain requirements and the dominant poles they imply.
//!
//! Uses the standard second-order approximation: percent overshoot fixes the
//! damping ratio, and a 2% settling band gives `ts ~= 4 / (zeta * wn)`.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use nalgebra::Complex;
use pp_core::{Pole, conjugate_pair};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Overshoot at or below this percentage is treated as "no overshoot":
/// critically damped design with a single real dominant pole.
pub const CRITICAL_OVERSHOOT_PCT: f64 = 1e-6;

/// `zeta * wn * ts` for a 2% settling band.
pub const SETTLING_CONSTANT: f64 = 4.0;

/// Reference signal class the loop must track without steady-state error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputClass {
    /// Unit step, `r(t) = 1`.
    #[default]
    Step,
    /// Unit ramp, `r(t) = t`.
    Ramp,
}

impl InputClass {
    /// Free integrators the open loop needs for zero steady-state error.
    pub fn required_integrators(self) -> usize {
        match self {
            InputClass::Step => 1,
            InputClass::Ramp => 2,
        }
    }

    /// Reference value at time `t`.
    pub fn reference(self, t: f64) -> f64 {
        match self {
            InputClass::Step => 1.0,
            InputClass::Ramp => t,
        }
    }
}

impl fmt::Display for InputClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputClass::Step => write!(f, "step"),
            InputClass::Ramp => write!(f, "ramp"),
        }
    }
}

impl FromStr for InputClass {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "step" => Ok(InputClass::Step),
            "ramp" => Ok(InputClass::Ramp),
            _ => Err(ControlError::InvalidSpec {
                what: "input class must be 'step' or 'ramp'",
            }),
        }
    }
}

/// Design requirements for one design run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignSpec {
    /// Maximum percent overshoot, in `[0, 100)`.
    pub overshoot_pct: f64,
    /// 2% settling time in seconds, positive.
    pub settling_time: f64,
    /// Reference class to track.
    pub input: InputClass,
}

impl DesignSpec {
    /// Create a validated design specification.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::InvalidSpec`] for non-finite values, overshoot
    /// outside `[0, 100)` or a non-positive settling time.
    pub fn new(overshoot_pct: f64, settling_time: f64, input: InputClass) -> ControlResult<Self> {
        let spec = Self {
            overshoot_pct,
            settling_time,
            input,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> ControlResult<()> {
        if !self.overshoot_pct.is_finite() || !(0.0..100.0).contains(&self.overshoot_pct) {
            return Err(ControlError::InvalidSpec {
                what: "overshoot must be in [0, 100) percent",
            });
        }
        if !self.settling_time.is_finite() || self.settling_time <= 0.0 {
            return Err(ControlError::InvalidSpec {
                what: "settling time must be positive",
            });
        }
        Ok(())
    }

    pub fn dominant_poles(&self) -> DominantPoles {
        DominantPoles::from_spec(self.overshoot_pct, self.settling_time)
    }
}

/// Damping ratio, natural frequency and one representative dominant pole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DominantPoles {
    pub zeta: f64,
    pub omega_n: f64,
    /// Upper half-plane member of the pair (or the single real pole).
    pub pole: Pole,
}

impl DominantPoles {
    pub fn from_spec(overshoot_pct: f64, settling_time: f64) -> Self {
        if overshoot_pct <= CRITICAL_OVERSHOOT_PCT {
            let omega_n = SETTLING_CONSTANT / settling_time;
            return Self {
                zeta: 1.0,
                omega_n,
                pole: Complex::new(-omega_n, 0.0),
            };
        }

        let ln_mp = (overshoot_pct / 100.0).ln();
        let zeta = -ln_mp / (PI * PI + ln_mp * ln_mp).sqrt();
        let omega_n = SETTLING_CONSTANT / (zeta * settling_time);
        // max(0, ..) absorbs round-off when zeta lands a hair above 1
        let omega_d = omega_n * (1.0 - zeta * zeta).max(0.0).sqrt();
        Self {
            zeta,
            omega_n,
            pole: Complex::new(-zeta * omega_n, omega_d),
        }
    }

    pub fn is_real(&self) -> bool {
        pp_core::pole::is_real(&self.pole)
    }

    /// Magnitude of the real part, the envelope decay rate.
    pub fn decay_rate(&self) -> f64 {
        self.pole.re.abs()
    }

    /// The dominant pole together with its conjugate when complex.
    pub fn paired(&self) -> Vec<Pole> {
        conjugate_pair(&[self.pole])
    }
}
