//! # Actuation Control Executable Parameters
//!
//! This module provides parameters for the actuation control executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
pub struct ActExecParams {
    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// When true the replay runs against the wall clock at the cycle rate;
    /// when false frames are processed back to back.
    pub realtime: bool,

    /// Number of consecutive cycle overruns tolerated before the engine is
    /// made safe.
    pub max_consec_cycle_overruns: u64,
}
