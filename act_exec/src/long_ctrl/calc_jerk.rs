//! Jerk bound and integrator calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::*;
use util::maths::{clamp, interp};
use veh_if::LongControlState;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Step the acceleration command towards the target, no faster than the
/// jerk bounds allow.
///
/// `jerk_upper` bounds growth, `jerk_lower` bounds decay; both are
/// magnitudes in meters/second^3.
pub fn jerk_limited_integrator(
    target_accel: f64,
    last_accel: f64,
    jerk_upper: f64,
    jerk_lower: f64,
    cycle_period_s: f64
) -> f64 {
    clamp(
        &target_accel,
        &(last_accel - jerk_lower * cycle_period_s),
        &(last_accel + jerk_upper * cycle_period_s)
    )
}

/// Move a jerk bound towards its target by at most `step` per frame,
/// snapping to the target once within `threshold`.
pub fn ramp_update(current: f64, target: f64, step: f64, threshold: f64) -> f64 {
    let error = target - current;
    if error.abs() > threshold {
        current + clamp(&error, &-step, &step)
    }
    else {
        target
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LongCtrl {
    /// Update the jerk bounds for this frame.
    ///
    /// Both bounds sit at the idle value unless the manoeuvre needs more:
    /// the lookahead term ramps the relevant bound towards
    /// `|accel error| / lookahead(speed)`, clipped to the speed-indexed
    /// ceiling, so the integrator is ready before the error grows rather
    /// than reacting after the fact. With no radar/lead context the lower
    /// bound falls back to a generous fixed constant.
    pub(crate) fn calc_jerk_bounds(
        &mut self,
        target_accel_ms2: f64,
        v_ego_ms: f64,
        lead_visible: Option<bool>,
        long_state: LongControlState
    ) {
        let p = &self.params;

        let mut upper_ceiling = interp(v_ego_ms, &p.jerk_upper_bp_ms, &p.jerk_upper_v);
        if long_state != LongControlState::Pid {
            upper_ceiling = upper_ceiling.min(p.non_pid_jerk_upper_ms3);
        }
        let lower_ceiling = interp(v_ego_ms, &p.jerk_lower_bp_ms, &p.jerk_lower_v);

        let accel_error = target_accel_ms2 - self.accel_last_ms2;

        let (desired_upper, desired_lower) = match lead_visible {
            // Radar context unavailable: favour strong, safe deceleration
            // capability over tuned comfort
            None => (p.min_jerk_ms3, p.no_lead_jerk_lower_ms3),

            Some(lead) => {
                if !lead && accel_error.abs() < p.accel_error_band_ms2 {
                    (p.min_jerk_ms3, p.min_jerk_ms3)
                }
                else {
                    let lookahead_s = interp(v_ego_ms, &p.lookahead_bp_ms, &p.lookahead_v_s);
                    let jerk_needed = (accel_error / lookahead_s).abs();

                    if accel_error >= 0.0 {
                        (
                            clamp(&jerk_needed, &p.min_jerk_ms3, &upper_ceiling),
                            p.min_jerk_ms3
                        )
                    }
                    else {
                        (
                            p.min_jerk_ms3,
                            clamp(&jerk_needed, &p.min_jerk_ms3, &lower_ceiling)
                        )
                    }
                }
            }
        };

        self.jerk_upper_ms3 = ramp_update(
            self.jerk_upper_ms3,
            desired_upper,
            p.jerk_ramp_step,
            p.jerk_ramp_threshold
        );
        self.jerk_lower_ms3 = ramp_update(
            self.jerk_lower_ms3,
            desired_lower,
            p.jerk_ramp_step,
            p.jerk_ramp_threshold
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DT: f64 = 0.01;

    #[test]
    fn test_integrator_exactness() {
        // jerk_upper of 1/dt allows exactly 1.0 of accel change per frame
        assert_eq!(jerk_limited_integrator(2.0, 0.0, 1.0 / DT, 0.5, DT), 1.0);

        // jerk_upper of 10/dt reaches the target in one frame
        assert_eq!(jerk_limited_integrator(2.0, 0.0, 10.0 / DT, 0.5, DT), 2.0);
    }

    #[test]
    fn test_integrator_decay_uses_lower_bound() {
        assert_eq!(jerk_limited_integrator(-2.0, 0.0, 0.5, 1.0 / DT, DT), -1.0);
        assert_eq!(jerk_limited_integrator(-2.0, 0.0, 0.5, 10.0 / DT, DT), -2.0);
    }

    #[test]
    fn test_ramp_update() {
        // Far from target: bounded step
        assert!((ramp_update(0.5, 5.0, 0.1, 0.1) - 0.6).abs() < 1e-12);
        assert!((ramp_update(5.0, 0.5, 0.1, 0.1) - 4.9).abs() < 1e-12);

        // Within the threshold: snaps
        assert_eq!(ramp_update(0.95, 1.0, 0.1, 0.1), 1.0);
    }

    #[test]
    fn test_bounds_rest_at_idle_without_demand() {
        let mut ctrl = LongCtrl::default();
        ctrl.set_params(super::super::params::test_params(), DT).unwrap();

        for _ in 0..100 {
            ctrl.calc_jerk_bounds(0.0, 10.0, Some(false), LongControlState::Pid);
        }

        assert_eq!(ctrl.jerk_upper_ms3, 0.5);
        assert_eq!(ctrl.jerk_lower_ms3, 0.5);
    }

    #[test]
    fn test_braking_ramps_lower_bound() {
        let mut ctrl = LongCtrl::default();
        ctrl.set_params(super::super::params::test_params(), DT).unwrap();

        // Hard braking demand at 10 m/s: jerk needed = 3.0 / 0.5 = 6.0,
        // ceiling at 10 m/s is interp([0,5,20],[5.0,3.5,2.5]) ~ 3.17
        for _ in 0..100 {
            ctrl.calc_jerk_bounds(-3.0, 10.0, Some(true), LongControlState::Pid);
        }

        let ceiling = util::maths::interp(
            10.0,
            &[0.0, 5.0, 20.0],
            &[5.0, 3.5, 2.5]
        );
        assert!((ctrl.jerk_lower_ms3 - ceiling).abs() < 1e-9);
        assert_eq!(ctrl.jerk_upper_ms3, 0.5);
    }

    #[test]
    fn test_no_lead_fallback() {
        let mut ctrl = LongCtrl::default();
        ctrl.set_params(super::super::params::test_params(), DT).unwrap();

        for _ in 0..100 {
            ctrl.calc_jerk_bounds(0.0, 10.0, None, LongControlState::Pid);
        }

        assert_eq!(ctrl.jerk_lower_ms3, 5.0);
        assert_eq!(ctrl.jerk_upper_ms3, 0.5);
    }

    #[test]
    fn test_non_pid_caps_upper_bound() {
        let mut ctrl = LongCtrl::default();
        ctrl.set_params(super::super::params::test_params(), DT).unwrap();

        for _ in 0..100 {
            ctrl.calc_jerk_bounds(2.0, 10.0, Some(true), LongControlState::Stopping);
        }

        assert!(ctrl.jerk_upper_ms3 <= 1.0 + 1e-12);
    }
}
