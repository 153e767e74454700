//! Longitudinal control module
//!
//! Produces a jerk-limited acceleration trajectory from the planner's
//! target acceleration, with debounced stop/start transitions. The module
//! runs independently of steering control, consuming the same vehicle state
//! plus the longitudinal demand and lead-vehicle context.
//!
//! The algorithm shape is canonical across platforms: speed-indexed jerk
//! bounds, a lookahead term that pre-emptively ramps the bounds towards the
//! jerk the manoeuvre will need, and a jerk-limited integrator feeding the
//! acceleration command. All numeric tuning lives in the per-platform
//! parameter file.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_jerk;
mod params;
mod state;
mod stop_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use calc_jerk::*;
pub use params::*;
pub use state::*;
pub use stop_ctrl::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LongCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LongCtrlError {
    #[error("proc() called before the module was initialised")]
    NotInitialised,
}
