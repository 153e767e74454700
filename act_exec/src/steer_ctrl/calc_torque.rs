//! Steering torque limit calculations
//!
//! Classic driver-torque-aware rate limiter for torque-commanded EPS
//! platforms. All values are in the platform's native actuator units.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::*;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SteerCtrl {
    /// Bound a desired steering torque into a safe applied torque.
    ///
    /// The allowed band is widened by
    /// `driver_allowance + driver_torque * driver_torque_factor` towards the
    /// direction the driver is pulling, so the system never fights a driver
    /// resisting in the same direction. The band never exceeds
    /// `±max_torque`. Rate-up steps apply while the magnitude grows,
    /// rate-down while it shrinks. The final clamp bounds the command
    /// relative to the measured driver torque by `max_rt_delta`,
    /// independent of the rate limits.
    pub(crate) fn apply_torque_limits(
        params: &TorqueLimits,
        desired_torque: f64,
        apply_torque_last: f64,
        driver_torque: f64,
        report: &mut StatusReport,
    ) -> f64 {
        // Limits due to driver torque
        let driver_max_torque = params.max_torque
            + (params.driver_allowance + driver_torque * params.driver_torque_factor);
        let driver_min_torque = -params.max_torque
            + (-params.driver_allowance + driver_torque * params.driver_torque_factor);

        let max_torque_allowed = params.max_torque.min(driver_max_torque).max(0.0);
        let min_torque_allowed = (-params.max_torque).max(driver_min_torque).min(0.0);

        let mut apply_torque = clamp(&desired_torque, &min_torque_allowed, &max_torque_allowed);
        report.torque_driver_limited = apply_torque != desired_torque;

        // Slow rate if torque increases in magnitude
        if apply_torque_last > 0.0 {
            apply_torque = clamp(
                &apply_torque,
                &(apply_torque_last - params.max_rate_down).max(-params.max_rate_up),
                &(apply_torque_last + params.max_rate_up)
            );
        }
        else {
            apply_torque = clamp(
                &apply_torque,
                &(apply_torque_last - params.max_rate_up),
                &(apply_torque_last + params.max_rate_down).min(params.max_rate_up)
            );
        }

        // Real-time delta clamp, a backstop against miscalibrated rate
        // limits: the command may never sit further than max_rt_delta from
        // what the driver's hands are doing
        clamp(
            &apply_torque,
            &(driver_torque - params.max_rt_delta),
            &(driver_torque + params.max_rt_delta)
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn test_limits() -> TorqueLimits {
        TorqueLimits {
            max_torque: 384.0,
            max_rate_up: 3.0,
            max_rate_down: 7.0,
            driver_allowance: 100.0,
            driver_torque_factor: 2.0,
            max_rt_delta: 450.0,
        }
    }

    #[test]
    fn test_converges_and_holds() {
        let limits = test_limits();
        let mut report = StatusReport::default();
        let mut last = 0.0;

        for _ in 0..100 {
            last = SteerCtrl::apply_torque_limits(&limits, 120.0, last, 0.0, &mut report);
        }

        assert_eq!(last, 120.0);
        assert_eq!(
            SteerCtrl::apply_torque_limits(&limits, 120.0, last, 0.0, &mut report),
            120.0
        );
    }

    #[test]
    fn test_rate_up_step() {
        let limits = test_limits();
        let mut report = StatusReport::default();

        assert_eq!(
            SteerCtrl::apply_torque_limits(&limits, 384.0, 10.0, 0.0, &mut report),
            13.0
        );
        assert_eq!(
            SteerCtrl::apply_torque_limits(&limits, -384.0, -10.0, 0.0, &mut report),
            -13.0
        );
    }

    #[test]
    fn test_rate_down_step() {
        let limits = test_limits();
        let mut report = StatusReport::default();

        assert_eq!(
            SteerCtrl::apply_torque_limits(&limits, 0.0, 100.0, 0.0, &mut report),
            93.0
        );
        assert_eq!(
            SteerCtrl::apply_torque_limits(&limits, 0.0, -100.0, 0.0, &mut report),
            -93.0
        );
    }

    #[test]
    fn test_driver_resisting_shrinks_band() {
        // Driver pulling hard right (negative): the leftward band collapses
        // to driver_max = 384 + (100 - 2*200) = 184
        let limits = test_limits();
        let mut report = StatusReport::default();
        let mut last = 0.0;

        for _ in 0..200 {
            last = SteerCtrl::apply_torque_limits(&limits, 384.0, last, -200.0, &mut report);
        }

        assert_eq!(last, 184.0);
        assert!(report.torque_driver_limited);
    }

    #[test]
    fn test_rt_delta_backstop() {
        // With a tight rt delta the command may not leave the driver's
        // vicinity even though the rate limits would allow it
        let mut limits = test_limits();
        limits.max_rt_delta = 50.0;
        let mut report = StatusReport::default();
        let mut last = 0.0;

        for _ in 0..200 {
            last = SteerCtrl::apply_torque_limits(&limits, 384.0, last, 0.0, &mut report);
        }

        assert_eq!(last, 50.0);
    }

    #[test]
    fn test_bound_invariants_random_sweep() {
        let limits = test_limits();
        let mut report = StatusReport::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut last = 0.0f64;
        let max_step = limits.max_rate_up.max(limits.max_rate_down);

        for _ in 0..5000 {
            let desired = rng.gen_range(-2000.0..2000.0);
            let driver = rng.gen_range(-300.0..300.0);

            let out = SteerCtrl::apply_torque_limits(&limits, desired, last, driver, &mut report);

            assert!(out.abs() <= limits.max_torque);
            assert!((out - driver).abs() <= limits.max_rt_delta + 1e-9);

            // The rt clamp is independent of the rate limits and may pull
            // the command straight onto its boundary
            let on_rt_boundary = (out - driver).abs() >= limits.max_rt_delta - 1e-9;
            assert!((out - last).abs() <= max_step + 1e-9 || on_rt_boundary);

            last = out;
        }
    }
}
