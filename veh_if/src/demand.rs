//! # Actuation Demands
//!
//! The demands produced by the upstream planner each frame. These are
//! *desired* values: the engine bounds them into what is physically safe to
//! send to the actuators.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Desired actuation for one control frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub struct ActuationDemand {
    /// Desired steering wheel angle (angle-commanded platforms).
    ///
    /// Units: degrees
    pub angle_deg: f64,

    /// Desired steering torque, normalised to [-1, 1] of the platform's
    /// maximum (torque-commanded platforms).
    pub torque_norm: f64,

    /// Desired path curvature, used to derive lateral acceleration.
    ///
    /// Units: 1/meters
    pub curvature_inv_m: f64,

    /// Desired longitudinal acceleration.
    ///
    /// Units: meters/second^2
    pub accel_ms2: f64,

    /// True while lateral control is engaged. A falling edge must be handled
    /// as an immediate same-frame freeze to the measured angle.
    pub lat_active: bool,

    /// True while longitudinal control is engaged. A falling edge must be
    /// handled as an immediate same-frame reset to zero actuation.
    pub long_active: bool,

    /// High-level longitudinal control state.
    pub long_state: LongControlState,

    /// Whether a lead vehicle is visible to the radar, or `None` if the
    /// radar/lead context is unavailable this frame.
    pub lead_visible: Option<bool>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// High-level longitudinal control state reported by the planner.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LongControlState {
    /// Longitudinal control disengaged.
    Off,

    /// Closed-loop acceleration tracking.
    Pid,

    /// Bringing the vehicle to, or holding it in, a stop.
    Stopping,
}

/// Error returned when parsing a [`LongControlState`] from text.
#[derive(Debug, Error)]
#[error("Unknown longitudinal control state: {0:?}")]
pub struct ParseLongControlStateError(String);

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl Default for LongControlState {
    fn default() -> Self {
        LongControlState::Off
    }
}

impl FromStr for LongControlState {
    type Err = ParseLongControlStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(LongControlState::Off),
            "pid" => Ok(LongControlState::Pid),
            "stopping" => Ok(LongControlState::Stopping),
            other => Err(ParseLongControlStateError(other.to_string())),
        }
    }
}
