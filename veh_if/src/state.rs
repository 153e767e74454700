//! # Measured Vehicle State

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Vehicle state as measured by the sensors, sampled once per control frame.
///
/// All values come from the upstream state estimation and are taken as-is;
/// the engine clamps rather than rejects out-of-range values.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub struct VehicleState {
    /// Raw (unfiltered) longitudinal speed.
    ///
    /// Units: meters/second
    pub v_ego_raw_ms: f64,

    /// Measured steering wheel angle, positive left.
    ///
    /// Units: degrees
    pub steering_angle_deg: f64,

    /// Torque the driver is applying to the steering column, in the
    /// platform's native actuator units (the same scale as the torque
    /// limits configuration).
    pub steering_torque: f64,

    /// Measured longitudinal acceleration.
    ///
    /// Units: meters/second^2
    pub a_ego_ms2: f64,

    /// True when the vehicle is at a standstill.
    pub standstill: bool,
}
