//! EPS fault avoidance state machine
//!
//! Many steering ECUs hard-fault when torque is requested while the wheel
//! angle sits above a threshold for longer than their internal fault timer
//! (around one second). Cutting the request bit for a couple of frames
//! resets that timer, so the machine counts consecutive above-threshold
//! frames and emits a short release pulse before the ECU limit is reached,
//! without fully disengaging.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::FaultAvoidParams;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Externally visible state of the fault avoidance machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultAvoidState {
    /// Steer requests pass through.
    Normal,

    /// The request bit is being cut for the release pulse.
    Suppressing,
}

impl Default for FaultAvoidState {
    fn default() -> Self {
        FaultAvoidState::Normal
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per-session fault avoidance counter. No terminal state: runs for the
/// whole session.
#[derive(Default)]
pub struct FaultAvoidance {
    /// Consecutive frames the fault condition has held while requesting.
    above_limit_frames: u32,

    /// Whether the request bit was cut on the last update.
    suppressing: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FaultAvoidance {
    /// Advance the machine by one frame.
    ///
    /// # Inputs
    /// - `fault_condition`: true when `|measured_angle|` is at or above the
    ///   fault angle threshold.
    /// - `request`: the steer request bit before fault avoidance, i.e.
    ///   whether lateral control is active this frame.
    ///
    /// # Outputs
    /// - The steer request bit after fault avoidance.
    pub fn update(
        &mut self,
        fault_condition: bool,
        mut request: bool,
        params: &FaultAvoidParams
    ) -> bool {
        let requested = request;

        if request && fault_condition {
            self.above_limit_frames += 1;
        }
        else {
            self.above_limit_frames = 0;
        }

        if self.above_limit_frames > params.max_fault_frames {
            request = false;
        }

        // Once the pulse has lasted release_frames the counter restarts, so
        // the request comes back high next frame
        if self.above_limit_frames >= params.max_fault_frames + params.release_frames {
            self.above_limit_frames = 0;
        }

        self.suppressing = requested && !request;

        request
    }

    /// State of the machine as of the last update, for status reporting.
    pub fn state(&self) -> FaultAvoidState {
        if self.suppressing {
            FaultAvoidState::Suppressing
        }
        else {
            FaultAvoidState::Normal
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_params() -> FaultAvoidParams {
        FaultAvoidParams {
            fault_angle_threshold_deg: 85.0,
            max_fault_frames: 89,
            release_frames: 2,
        }
    }

    #[test]
    fn test_single_release_pulse() {
        let params = test_params();
        let mut fa = FaultAvoidance::default();

        // Tolerated frames: request stays high
        for _ in 0..params.max_fault_frames {
            assert!(fa.update(true, true, &params));
            assert_eq!(fa.state(), FaultAvoidState::Normal);
        }

        // Exactly release_frames of suppression
        for _ in 0..params.release_frames {
            assert!(!fa.update(true, true, &params));
            assert_eq!(fa.state(), FaultAvoidState::Suppressing);
        }

        // Counter restarted: request returns high for another full period
        for _ in 0..params.max_fault_frames {
            assert!(fa.update(true, true, &params));
        }
    }

    #[test]
    fn test_condition_clear_resets_counter() {
        let params = test_params();
        let mut fa = FaultAvoidance::default();

        for _ in 0..params.max_fault_frames {
            fa.update(true, true, &params);
        }

        // One below-threshold frame resets the count
        assert!(fa.update(false, true, &params));

        for _ in 0..params.max_fault_frames {
            assert!(fa.update(true, true, &params));
        }
    }

    #[test]
    fn test_inactive_lateral_never_suppresses() {
        let params = test_params();
        let mut fa = FaultAvoidance::default();

        for _ in 0..(params.max_fault_frames * 3) {
            assert!(!fa.update(true, false, &params));
            assert_eq!(fa.state(), FaultAvoidState::Normal);
        }
    }
}
