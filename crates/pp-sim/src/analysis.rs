//! Step-response performance metrics.

use pp_core::numeric::Real;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Trailing fraction of the samples averaged for the steady-state value.
pub const STEADY_STATE_TAIL: Real = 0.1;

/// Relative half-width of the settling band.
pub const SETTLING_BAND: Real = 0.02;

/// Steady values below this magnitude make overshoot and rise time undefined.
pub const NEAR_ZERO_STEADY: Real = 1e-9;

pub const RISE_LOW: Real = 0.1;
pub const RISE_HIGH: Real = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Mean of the trailing samples.
    pub steady_value: Real,
    /// `|target - steady_value|`
    pub error: Real,
    /// Percent overshoot of the peak over the steady value.
    pub overshoot_pct: Real,
    /// Time after which the output stays inside the band; 0 if it never leaves.
    pub settling_time: Real,
    pub peak_time: Real,
    /// 10% to 90% of the steady value; 0 if either crossing is missing.
    pub rise_time: Real,
}

/// Reduce a sampled response to [`PerformanceMetrics`].
///
/// # Errors
///
/// [`SimError::InvalidArg`] for empty or mismatched series and
/// [`SimError::NonFinite`] if the response diverged.
pub fn analyze_performance(
    time: &[Real],
    output: &[Real],
    target: Real,
) -> SimResult<PerformanceMetrics> {
    if time.is_empty() || time.len() != output.len() {
        return Err(SimError::InvalidArg {
            what: "time and output must be non-empty and of equal length",
        });
    }
    if output.iter().any(|y| !y.is_finite()) {
        return Err(SimError::NonFinite { what: "output" });
    }

    let n = output.len();
    let lookback = ((n as Real * STEADY_STATE_TAIL) as usize).max(1);
    let steady_value = output[n - lookback..].iter().sum::<Real>() / lookback as Real;

    let (peak_idx, peak) = output
        .iter()
        .copied()
        .enumerate()
        .fold((0, Real::NEG_INFINITY), |best, (i, y)| {
            if y > best.1 { (i, y) } else { best }
        });

    let overshoot_pct = if steady_value.abs() > NEAR_ZERO_STEADY {
        (peak - steady_value) / steady_value * 100.0
    } else {
        0.0
    };

    let band = SETTLING_BAND * steady_value.abs();
    let settling_time = match output
        .iter()
        .rposition(|y| (y - steady_value).abs() > band)
    {
        Some(i) => time[(i + 1).min(n - 1)],
        None => 0.0,
    };

    Ok(PerformanceMetrics {
        steady_value,
        error: (target - steady_value).abs(),
        overshoot_pct,
        settling_time,
        peak_time: time[peak_idx],
        rise_time: rise_time(time, output, steady_value),
    })
}

fn rise_time(time: &[Real], output: &[Real], steady_value: Real) -> Real {
    if steady_value.abs() <= NEAR_ZERO_STEADY {
        return 0.0;
    }
    let first_reaching = |level: Real| {
        output
            .iter()
            .position(|y| y / steady_value >= level)
            .map(|i| time[i])
    };
    match (first_reaching(RISE_LOW), first_reaching(RISE_HIGH)) {
        (Some(lo), Some(hi)) if hi >= lo => hi - lo,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(dt: Real, n: usize) -> Vec<Real> {
        (0..n).map(|k| k as Real * dt).collect()
    }

    #[test]
    fn first_order_metrics() {
        let t = grid(0.01, 1001);
        let y: Vec<Real> = t.iter().map(|t| 1.0 - (-t).exp()).collect();
        let m = analyze_performance(&t, &y, 1.0).unwrap();
        assert!((m.steady_value - 1.0).abs() < 1e-3);
        assert!(m.error < 1e-3);
        // monotone: peak is the last sample, overshoot ~0
        assert!(m.overshoot_pct.abs() < 0.1);
        // ln(9) ~= 2.197
        assert!((m.rise_time - 9.0_f64.ln()).abs() < 0.02);
        // ln(50) ~= 3.91
        assert!((m.settling_time - 50.0_f64.ln()).abs() < 0.05);
        assert!(m.rise_time <= m.settling_time);
    }

    #[test]
    fn underdamped_overshoot_and_peak() {
        // zeta = 0.5, wn = 2: 16.3% overshoot at t = pi / wd
        let (zeta, wn) = (0.5_f64, 2.0_f64);
        let wd = wn * (1.0 - zeta * zeta).sqrt();
        let phi = (zeta / (1.0 - zeta * zeta).sqrt()).atan();
        let t = grid(0.001, 20001);
        let y: Vec<Real> = t
            .iter()
            .map(|&t| {
                1.0 - (-zeta * wn * t).exp() * ((wd * t).cos() + phi.tan() * (wd * t).sin())
            })
            .collect();
        let m = analyze_performance(&t, &y, 1.0).unwrap();
        let expected = 100.0 * (-zeta * std::f64::consts::PI / (1.0 - zeta * zeta).sqrt()).exp();
        assert!((m.overshoot_pct - expected).abs() < 0.1);
        assert!((m.peak_time - std::f64::consts::PI / wd).abs() < 0.01);
        assert!(m.settling_time > m.peak_time);
    }

    #[test]
    fn constant_output_never_leaves_band() {
        let t = grid(0.1, 50);
        let y = vec![2.0; 50];
        let m = analyze_performance(&t, &y, 1.0).unwrap();
        assert_eq!(m.settling_time, 0.0);
        assert_eq!(m.overshoot_pct, 0.0);
        assert_eq!(m.error, 1.0);
    }

    #[test]
    fn zero_steady_value_has_no_overshoot_or_rise() {
        let t = grid(0.1, 20);
        let y = vec![0.0; 20];
        let m = analyze_performance(&t, &y, 1.0).unwrap();
        assert_eq!(m.overshoot_pct, 0.0);
        assert_eq!(m.rise_time, 0.0);
    }

    #[test]
    fn bad_input_is_rejected() {
        assert!(analyze_performance(&[], &[], 1.0).is_err());
        assert!(analyze_performance(&[0.0, 1.0], &[0.0], 1.0).is_err());
        assert!(matches!(
            analyze_performance(&[0.0, 1.0], &[0.0, f64::INFINITY], 1.0),
            Err(SimError::NonFinite { .. })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn monotone_rise_orders_rise_before_settling(tau in 0.1_f64..3.0, gain in 0.2_f64..5.0) {
            let dt = tau / 100.0;
            let t: Vec<Real> = (0..2000).map(|k| k as Real * dt).collect();
            let y: Vec<Real> = t.iter().map(|t| gain * (1.0 - (-t / tau).exp())).collect();
            let m = analyze_performance(&t, &y, gain).unwrap();
            prop_assert!(m.rise_time >= 0.0);
            if m.rise_time > 0.0 && m.settling_time > 0.0 {
                prop_assert!(m.rise_time <= m.settling_time);
            }
        }
    }
}
