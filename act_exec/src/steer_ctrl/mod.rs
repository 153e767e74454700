//! Steering control module
//!
//! Bounds the planner's desired steering actuation into what is physically
//! safe to hand to the EPS, one frame at a time. The module composes four
//! pieces, evaluated in a fixed order each frame:
//!
//! 1. [`OverrideDetector`] - detects the driver physically countering the
//!    commanded steering (hysteresis band, see `override_det.rs`).
//! 2. [`FaultAvoidance`] - cuts the steer request bit periodically while the
//!    wheel is held above the EPS fault angle (see `fault_avoid.rs`).
//! 3. Angle limiting - lateral accel/jerk bounds translated through the
//!    vehicle model into angle and angle-rate bounds (see `calc_angle.rs`).
//! 4. Torque limiting - driver-torque-aware rate limiter for
//!    torque-commanded platforms (see `calc_torque.rs`).
//!
//! Steps 1 and 2 must run before 3 and 4 finalise their outputs, since both
//! can force suppression of the final request.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_angle;
mod calc_torque;
mod fault_avoid;
mod override_det;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use fault_avoid::*;
pub use override_det::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Angle deltas larger than this engage the smoothing blend towards the last
/// applied angle. Smaller deltas pass through at full responsiveness.
///
/// Units: degrees
pub const ANGLE_BLEND_THRESHOLD_DEG: f64 = 0.1;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during SteerCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum SteerCtrlError {
    #[error("proc() called before the module was initialised")]
    NotInitialised,
}
