//! Parameters structure for SteerCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::InitError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for steering control.
///
/// A typed per-platform snapshot, loaded and validated once at session
/// start. Never mutated mid-session.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// Which steering command form this platform's EPS accepts.
    pub command_kind: CommandKind,

    /// Lateral (angle) limits.
    pub lat: LatLimits,

    /// Torque limits.
    pub torque: TorqueLimits,

    /// Fault avoidance tuning.
    pub fault: FaultAvoidParams,

    /// Override detection tuning.
    pub override_det: OverrideParams,
}

/// Lateral angle limits, per-platform constants.
#[derive(Debug, Default, Deserialize)]
pub struct LatLimits {
    /// Absolute bound on the commanded steering wheel angle.
    ///
    /// Units: degrees
    pub max_abs_angle_deg: f64,

    /// Transport-safety ceiling on the commanded angle rate, independent of
    /// the dynamics-derived bound. Protects the actuator from faulting even
    /// when the lateral jerk bound is looser.
    ///
    /// Units: degrees/second
    pub max_angle_rate_deg_s: f64,

    /// Lowest angle representable in the bus signal's physical encoding.
    ///
    /// Units: degrees
    pub angle_encoding_min_deg: f64,

    /// Highest angle representable in the bus signal's physical encoding.
    ///
    /// Units: degrees
    pub angle_encoding_max_deg: f64,

    /// Speed breakpoints for the smoothing-alpha lookup.
    ///
    /// Units: meters/second
    pub smoothing_speed_bp_ms: Vec<f64>,

    /// Smoothing alpha at each speed breakpoint. 1.0 passes the new angle
    /// straight through, smaller values blend towards the last applied
    /// angle.
    pub smoothing_alpha_v: Vec<f64>,

    /// Constant offset added to the interpolated alpha. The sum is clamped
    /// to 1.0 before use.
    pub smoothing_offset: f64,

    /// ISO-15622-style bound on lateral acceleration.
    ///
    /// Units: meters/second^2
    pub iso_lateral_accel_ms2: f64,

    /// Base bound on lateral jerk before the road-roll tolerance term.
    ///
    /// Units: meters/second^3
    pub base_lateral_jerk_ms3: f64,

    /// Average banked-road roll tolerance. Higher actual roll lowers the
    /// achieved lateral acceleration, so the allowance is widened by
    /// `g * avg_road_roll`.
    pub avg_road_roll: f64,
}

/// Torque limits, per-platform constants in native actuator units.
#[derive(Debug, Default, Deserialize)]
pub struct TorqueLimits {
    /// Absolute bound on the commanded torque.
    pub max_torque: f64,

    /// Maximum per-frame step while torque magnitude is growing.
    pub max_rate_up: f64,

    /// Maximum per-frame step while torque magnitude is shrinking.
    pub max_rate_down: f64,

    /// Band widening granted regardless of driver input.
    pub driver_allowance: f64,

    /// Additional band widening per unit of measured driver torque.
    pub driver_torque_factor: f64,

    /// Bound on `|command - measured driver torque|`, applied after all
    /// rate limiting as a backstop against miscalibrated rate limits.
    pub max_rt_delta: f64,
}

/// Fault avoidance tuning.
///
/// Many steering ECUs fault if torque is applied above a wheel-angle
/// threshold for more than about a second; these values must sit slightly
/// below the ECU's own thresholds.
#[derive(Debug, Default, Deserialize)]
pub struct FaultAvoidParams {
    /// Wheel angle above which the EPS fault timer runs.
    ///
    /// Units: degrees
    pub fault_angle_threshold_deg: f64,

    /// Consecutive above-threshold frames tolerated before the steer
    /// request is cut.
    pub max_fault_frames: u32,

    /// Length of the request-cut pulse.
    ///
    /// Units: frames
    pub release_frames: u32,
}

/// Override detection tuning.
#[derive(Debug, Default, Deserialize)]
pub struct OverrideParams {
    /// Instantaneous driver torque that enters the override state, in
    /// native actuator units.
    pub torque_threshold: f64,

    /// Commanded/measured angle gap below which an active override is
    /// released.
    ///
    /// Units: degrees
    pub angle_gap_deg: f64,

    /// Frames an override is held after the last above-threshold torque
    /// before timing out.
    pub hold_frames: u32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The steering command form accepted by the platform's EPS.
///
/// Resolved once at session start; the update path never branches on
/// anything else to select the command variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// EPS accepts an absolute steering wheel angle.
    Angle,

    /// Planner demands a path curvature; converted to an angle through the
    /// vehicle model, then limited as for `Angle`.
    Curvature,

    /// EPS accepts a torque command.
    Torque,
}

impl Default for CommandKind {
    fn default() -> Self {
        CommandKind::Angle
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LatLimits {
    /// Absolute lateral acceleration bound including the road-roll term.
    ///
    /// Units: meters/second^2
    pub fn max_lateral_accel_ms2(&self) -> f64 {
        self.iso_lateral_accel_ms2
            + crate::veh_model::ACCEL_DUE_TO_GRAVITY_MS2 * self.avg_road_roll
    }

    /// Absolute lateral jerk bound including the road-roll term.
    ///
    /// Units: meters/second^3
    pub fn max_lateral_jerk_ms3(&self) -> f64 {
        self.base_lateral_jerk_ms3
            + crate::veh_model::ACCEL_DUE_TO_GRAVITY_MS2 * self.avg_road_roll
    }
}

impl Params {
    /// Validate the parameter snapshot.
    ///
    /// Configuration programming errors are not recoverable per-frame, so
    /// any failure here must abort the session before the first cycle.
    pub fn validate(&self) -> Result<(), InitError> {
        use InitError::InvalidParam;

        let lat = &self.lat;

        if lat.max_abs_angle_deg <= 0.0 {
            return Err(InvalidParam("lat.max_abs_angle_deg must be positive"));
        }
        if lat.max_angle_rate_deg_s <= 0.0 {
            return Err(InvalidParam("lat.max_angle_rate_deg_s must be positive"));
        }
        if lat.angle_encoding_min_deg >= lat.angle_encoding_max_deg {
            return Err(InvalidParam(
                "lat.angle_encoding_min_deg must be below angle_encoding_max_deg"
            ));
        }
        if lat.iso_lateral_accel_ms2 <= 0.0 {
            return Err(InvalidParam("lat.iso_lateral_accel_ms2 must be positive"));
        }
        if lat.base_lateral_jerk_ms3 <= 0.0 {
            return Err(InvalidParam("lat.base_lateral_jerk_ms3 must be positive"));
        }
        if lat.avg_road_roll < 0.0 {
            return Err(InvalidParam("lat.avg_road_roll must not be negative"));
        }
        if lat.smoothing_offset < 0.0 {
            return Err(InvalidParam("lat.smoothing_offset must not be negative"));
        }

        util::params::validate_table(
            &lat.smoothing_speed_bp_ms,
            &lat.smoothing_alpha_v,
            "lat.smoothing"
        )?;
        if lat.smoothing_alpha_v.iter().any(|a| *a < 0.0 || *a > 1.0) {
            return Err(InvalidParam(
                "lat.smoothing_alpha_v entries must be within [0, 1]"
            ));
        }

        let torque = &self.torque;

        if torque.max_torque <= 0.0 {
            return Err(InvalidParam("torque.max_torque must be positive"));
        }
        if torque.max_rate_up <= 0.0 {
            return Err(InvalidParam("torque.max_rate_up must be positive"));
        }
        if torque.max_rate_down <= 0.0 {
            return Err(InvalidParam("torque.max_rate_down must be positive"));
        }
        if torque.driver_allowance < 0.0 {
            return Err(InvalidParam("torque.driver_allowance must not be negative"));
        }
        if torque.driver_torque_factor < 0.0 {
            return Err(InvalidParam(
                "torque.driver_torque_factor must not be negative"
            ));
        }
        if torque.max_rt_delta <= 0.0 {
            return Err(InvalidParam("torque.max_rt_delta must be positive"));
        }

        if self.fault.fault_angle_threshold_deg <= 0.0 {
            return Err(InvalidParam(
                "fault.fault_angle_threshold_deg must be positive"
            ));
        }
        if self.fault.release_frames == 0 {
            return Err(InvalidParam("fault.release_frames must be at least 1"));
        }

        if self.override_det.torque_threshold <= 0.0 {
            return Err(InvalidParam(
                "override_det.torque_threshold must be positive"
            ));
        }
        if self.override_det.angle_gap_deg <= 0.0 {
            return Err(InvalidParam("override_det.angle_gap_deg must be positive"));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_params() -> Params {
    Params {
        command_kind: CommandKind::Angle,
        lat: LatLimits {
            max_abs_angle_deg: 90.0,
            max_angle_rate_deg_s: 500.0,
            angle_encoding_min_deg: -819.2,
            angle_encoding_max_deg: 819.1,
            smoothing_speed_bp_ms: vec![0.0, 5.0, 15.0, 30.0],
            smoothing_alpha_v: vec![0.1, 0.2, 0.3, 0.4],
            smoothing_offset: 0.6,
            iso_lateral_accel_ms2: 3.0,
            base_lateral_jerk_ms3: 3.0,
            avg_road_roll: 0.06,
        },
        torque: TorqueLimits {
            max_torque: 384.0,
            max_rate_up: 3.0,
            max_rate_down: 7.0,
            driver_allowance: 100.0,
            driver_torque_factor: 2.0,
            max_rt_delta: 450.0,
        },
        fault: FaultAvoidParams {
            fault_angle_threshold_deg: 85.0,
            max_fault_frames: 89,
            release_frames: 2,
        },
        override_det: OverrideParams {
            torque_threshold: 150.0,
            angle_gap_deg: 2.0,
            hold_frames: 100,
        },
    }
}
