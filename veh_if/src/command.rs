//! # Actuator Commands
//!
//! Bounded commands handed to the CAN codec layer for serialisation into
//! brand-specific bit-packed messages.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Steering command for one control frame.
///
/// Either `angle_deg` or `torque_norm` is meaningful depending on the
/// platform's command kind; the other is carried at zero.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub struct SteerCommand {
    /// Bounded steering wheel angle command.
    ///
    /// Units: degrees
    pub angle_deg: f64,

    /// Bounded steering torque command, normalised to [-1, 1].
    pub torque_norm: f64,

    /// Steer request bit. When false the actuator must not apply torque,
    /// regardless of the commanded angle/torque.
    pub steer_req: bool,
}

/// Longitudinal command for one control frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub struct LongCommand {
    /// Jerk-limited acceleration command.
    ///
    /// Units: meters/second^2
    pub accel_ms2: f64,

    /// Upper jerk bound in force this frame, for brands whose ACC message
    /// carries the comfort band.
    ///
    /// Units: meters/second^3
    pub jerk_upper: f64,

    /// Lower (deceleration) jerk bound in force this frame.
    ///
    /// Units: meters/second^3
    pub jerk_lower: f64,

    /// True while the engine is commanding or holding a stop.
    pub stopping: bool,
}
