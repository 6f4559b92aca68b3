//! Actuator saturation and the anti-windup policy applied around it.

use pp_core::numeric::Real;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Symmetric clamp of the control effort to `[-limit, +limit]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Saturation {
    limit: Real,
}

impl Saturation {
    /// `limit` must be positive; `f64::INFINITY` disables clamping.
    pub fn new(limit: Real) -> SimResult<Self> {
        if limit.is_nan() || limit <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "actuator limit must be positive",
            });
        }
        Ok(Self { limit })
    }

    pub fn unlimited() -> Self {
        Self {
            limit: Real::INFINITY,
        }
    }

    pub fn limit(&self) -> Real {
        self.limit
    }

    /// Clamped value and whether clamping was active.
    pub fn apply(&self, raw: Real) -> (Real, bool) {
        let clamped = raw.clamp(-self.limit, self.limit);
        (clamped, clamped != raw)
    }
}

/// What the controller state does while the actuator is saturated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntiWindup {
    /// Conditional integration: hold the controller state while saturation
    /// and error push in the same direction.
    #[default]
    Clamping,
    /// Always integrate.
    Off,
}

impl AntiWindup {
    /// True when the controller state advance must be skipped this step.
    pub fn holds_state(self, saturated: bool, raw: Real, error: Real) -> bool {
        match self {
            AntiWindup::Off => false,
            AntiWindup::Clamping => saturated && error != 0.0 && raw.signum() == error.signum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_reports_saturation() {
        let sat = Saturation::new(1.0).unwrap();
        assert_eq!(sat.apply(0.5), (0.5, false));
        assert_eq!(sat.apply(3.0), (1.0, true));
        assert_eq!(sat.apply(-3.0), (-1.0, true));
        assert_eq!(sat.apply(1.0), (1.0, false));
    }

    #[test]
    fn invalid_limits() {
        assert!(Saturation::new(0.0).is_err());
        assert!(Saturation::new(-1.0).is_err());
        assert!(Saturation::new(f64::NAN).is_err());
        assert_eq!(Saturation::unlimited().apply(1e12), (1e12, false));
    }

    #[test]
    fn clamping_holds_only_when_pushing_further() {
        let aw = AntiWindup::Clamping;
        assert!(aw.holds_state(true, 5.0, 0.3));
        assert!(aw.holds_state(true, -5.0, -0.3));
        // error reversed: let the state unwind
        assert!(!aw.holds_state(true, 5.0, -0.3));
        assert!(!aw.holds_state(false, 5.0, 0.3));
        assert!(!AntiWindup::Off.holds_state(true, 5.0, 0.3));
    }
}
