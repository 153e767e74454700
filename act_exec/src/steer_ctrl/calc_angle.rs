//! Steering angle limit calculations
//!
//! Translates the platform's lateral acceleration and jerk bounds through
//! the vehicle model into angle and angle-rate bounds at the current speed,
//! and applies them to the desired angle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::*;
use crate::veh_model::{VehicleModel, MIN_SPEED_MS};
use util::maths::{clamp, interp, rate_limit};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SteerCtrl {
    /// Bound a desired steering wheel angle into a safe applied angle.
    ///
    /// The applied angle obeys, in order:
    /// 1. The bus signal's physical encoding range (a transport-layer
    ///    bound, independent of the dynamics bounds below).
    /// 2. A speed-scheduled exponential blend towards the last applied
    ///    angle, rejecting small-signal noise while staying fully
    ///    responsive for deltas under [`ANGLE_BLEND_THRESHOLD_DEG`].
    /// 3. An angle-rate bound derived from the lateral jerk limit, capped
    ///    by the transport-safety rate ceiling.
    /// 4. An absolute angle bound derived from the lateral accel limit.
    /// 5. When steering is not active, the measured angle - the command
    ///    tracks the human-driven wheel so re-engagement starts without
    ///    wind-up. This is the one transition exempt from bound 3.
    /// 6. The platform's absolute angle limit.
    ///
    /// Deterministic given identical inputs; the only held state consumed
    /// is `apply_angle_last_deg`.
    pub(crate) fn apply_angle_limits(
        params: &Params,
        model: &VehicleModel,
        cycle_period_s: f64,
        apply_angle_last_deg: f64,
        desired_angle_deg: f64,
        v_ego_raw_ms: f64,
        measured_angle_deg: f64,
        steering_active: bool,
        report: &mut StatusReport,
    ) -> f64 {
        let lat = &params.lat;

        let mut new_angle = clamp(
            &desired_angle_deg,
            &lat.angle_encoding_min_deg,
            &lat.angle_encoding_max_deg
        );

        let v_ego = v_ego_raw_ms.max(MIN_SPEED_MS);

        // Significant deltas get blended towards the last applied angle
        if (new_angle - apply_angle_last_deg).abs() > ANGLE_BLEND_THRESHOLD_DEG {
            let alpha = (interp(v_ego, &lat.smoothing_speed_bp_ms, &lat.smoothing_alpha_v)
                + lat.smoothing_offset)
                .min(1.0);
            new_angle = new_angle * alpha + apply_angle_last_deg * (1.0 - alpha);
        }

        // *** max lateral jerk limit ***
        let max_curvature_rate = lat.max_lateral_jerk_ms3() / v_ego.powi(2);
        let max_angle_rate_deg_s = model
            .angle_from_curvature(max_curvature_rate, v_ego, 0.0)
            .min(lat.max_angle_rate_deg_s);
        let max_angle_delta = max_angle_rate_deg_s * cycle_period_s;

        let mut apply_angle = rate_limit(
            new_angle,
            apply_angle_last_deg,
            -max_angle_delta,
            max_angle_delta
        );
        report.angle_rate_limited = apply_angle != new_angle;

        // *** max lateral accel limit ***
        let max_curvature = lat.max_lateral_accel_ms2() / v_ego.powi(2);
        let max_angle = model.angle_from_curvature(max_curvature, v_ego, 0.0);
        let clipped = clamp(&apply_angle, &-max_angle, &max_angle);
        report.angle_accel_limited = clipped != apply_angle;
        apply_angle = clipped;

        // Angle is the measured angle when not steering
        if !steering_active {
            apply_angle = measured_angle_deg;
        }

        clamp(&apply_angle, &-lat.max_abs_angle_deg, &lat.max_abs_angle_deg)
    }
}
