//! Driver override detection
//!
//! A single-threshold detector oscillates when the driver's torque hovers
//! at the boundary, chattering the actuator. This detector uses a
//! two-threshold band instead: a torque threshold to enter the override
//! state, and a smaller commanded/measured angle gap to leave it. While
//! override is active, lateral actuation is reported as suspended to the
//! caller without disengaging the higher-level control mode.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::OverrideParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per-session override state.
#[derive(Default)]
pub struct OverrideDetector {
    /// True while the driver holds authority over steering.
    active: bool,

    /// Frames since the driver torque was last above the enter threshold.
    frames_since_torque: u32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OverrideDetector {
    /// Advance the detector by one frame.
    ///
    /// # Inputs
    /// - `driver_torque`: measured driver torque, native actuator units.
    /// - `angle_gap_deg`: `|last commanded angle - measured angle|`.
    /// - `standstill`: vehicle standstill flag.
    /// - `lat_active`: whether lateral control is engaged this frame.
    ///
    /// # Outputs
    /// - True while the override holds and actuation must be suspended.
    pub fn update(
        &mut self,
        driver_torque: f64,
        angle_gap_deg: f64,
        standstill: bool,
        lat_active: bool,
        params: &OverrideParams
    ) -> bool {
        if !lat_active {
            self.active = false;
            self.frames_since_torque = 0;
            return false;
        }

        if driver_torque.abs() > params.torque_threshold {
            self.active = true;
            self.frames_since_torque = 0;
            return true;
        }

        if self.active {
            self.frames_since_torque += 1;

            // Release once the wheel has settled back onto the command, the
            // vehicle is stationary, or the hold times out without renewed
            // input
            if angle_gap_deg < params.angle_gap_deg
                || standstill
                || self.frames_since_torque > params.hold_frames
            {
                self.active = false;
                self.frames_since_torque = 0;
            }
        }

        self.active
    }

    /// Whether the override is currently active.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_params() -> OverrideParams {
        OverrideParams {
            torque_threshold: 150.0,
            angle_gap_deg: 2.0,
            hold_frames: 100,
        }
    }

    #[test]
    fn test_hysteresis_band() {
        let params = test_params();
        let mut det = OverrideDetector::default();

        // Below threshold: inactive
        assert!(!det.update(100.0, 10.0, false, true, &params));

        // Enter on instantaneous torque
        assert!(det.update(200.0, 10.0, false, true, &params));

        // Torque back to zero but the wheel is still far from the command:
        // override holds
        for _ in 0..50 {
            assert!(det.update(0.0, 10.0, false, true, &params));
        }

        // Wheel settles under the continued-override gap: released
        assert!(!det.update(0.0, 1.0, false, true, &params));
    }

    #[test]
    fn test_standstill_releases() {
        let params = test_params();
        let mut det = OverrideDetector::default();

        assert!(det.update(200.0, 10.0, false, true, &params));
        assert!(!det.update(0.0, 10.0, true, true, &params));
    }

    #[test]
    fn test_hold_timeout() {
        let params = test_params();
        let mut det = OverrideDetector::default();

        assert!(det.update(200.0, 10.0, false, true, &params));

        for _ in 0..params.hold_frames {
            assert!(det.update(0.0, 10.0, false, true, &params));
        }

        // One frame past the hold window the override times out
        assert!(!det.update(0.0, 10.0, false, true, &params));
    }

    #[test]
    fn test_renewed_torque_restarts_hold() {
        let params = test_params();
        let mut det = OverrideDetector::default();

        assert!(det.update(200.0, 10.0, false, true, &params));

        for _ in 0..(params.hold_frames / 2) {
            assert!(det.update(0.0, 10.0, false, true, &params));
        }

        // Renewed input resets the timeout
        assert!(det.update(200.0, 10.0, false, true, &params));

        for _ in 0..params.hold_frames {
            assert!(det.update(0.0, 10.0, false, true, &params));
        }
        assert!(!det.update(0.0, 10.0, false, true, &params));
    }

    #[test]
    fn test_inactive_lateral_resets() {
        let params = test_params();
        let mut det = OverrideDetector::default();

        assert!(det.update(200.0, 10.0, false, true, &params));
        assert!(!det.update(200.0, 10.0, false, false, &params));
        assert!(!det.is_active());
    }
}
