//! Stop/start state machine
//!
//! Debounces the planner's `stopping` state so that a single noisy cycle
//! can neither force a hard stop nor release one prematurely. The machine
//! holds in `EnteringStop` for the configured dwell before committing to
//! `Stopped`, except when longitudinal control engages straight into a stop
//! (resuming behind a stopped lead), where the commitment is immediate.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use veh_if::LongControlState;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Phase of the stop state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopPhase {
    /// Normal driving, acceleration tracking active.
    Driving,

    /// The planner is requesting a stop; dwelling before committing.
    EnteringStop,

    /// Committed to the stop: the acceleration target is forced to zero
    /// and the stop request is asserted to the actuator.
    Stopped,
}

impl Default for StopPhase {
    fn default() -> Self {
        StopPhase::Driving
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per-session stop state.
#[derive(Default)]
pub struct StopCtrl {
    phase: StopPhase,

    /// Frames spent in `EnteringStop`.
    dwell_frames: u32,

    /// Planner state seen on the previous frame.
    prev_state: LongControlState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StopCtrl {
    /// Advance the machine by one frame.
    ///
    /// # Inputs
    /// - `long_state`: the planner's longitudinal control state.
    /// - `dwell_target_frames`: frames to hold in `EnteringStop`.
    ///
    /// # Outputs
    /// - True while the machine is committed to a stop.
    pub fn update(&mut self, long_state: LongControlState, dwell_target_frames: u32) -> bool {
        let stopping_demanded = long_state == LongControlState::Stopping;

        match self.phase {
            StopPhase::Driving => {
                if stopping_demanded {
                    if self.prev_state == LongControlState::Off || dwell_target_frames == 0 {
                        self.phase = StopPhase::Stopped;
                    }
                    else {
                        self.phase = StopPhase::EnteringStop;
                        self.dwell_frames = 0;
                    }
                }
            }
            StopPhase::EnteringStop => {
                if !stopping_demanded {
                    self.phase = StopPhase::Driving;
                }
                else {
                    self.dwell_frames += 1;
                    if self.dwell_frames >= dwell_target_frames {
                        self.phase = StopPhase::Stopped;
                    }
                }
            }
            StopPhase::Stopped => {
                // Released the frame the planner stops reporting stopping
                if !stopping_demanded {
                    self.phase = StopPhase::Driving;
                }
            }
        }

        self.prev_state = long_state;

        self.phase == StopPhase::Stopped
    }

    /// Current phase, for status reporting.
    pub fn phase(&self) -> StopPhase {
        self.phase
    }

    /// Reset to the driving state, used on disengagement.
    pub fn reset(&mut self) {
        self.phase = StopPhase::Driving;
        self.dwell_frames = 0;
        self.prev_state = LongControlState::Off;
    }
}
