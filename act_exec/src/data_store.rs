//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use thiserror::Error;

use crate::{long_ctrl, steer_ctrl};
use veh_if::{ActuationDemand, LongCommand, SteerCommand, VehicleState};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the engine has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    /// A module returned a processing error.
    ModuleProcError,

    /// Too many consecutive cycle overruns.
    CycleOverrunLimit,
}

/// An error that occurs while executing one control frame.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("SteerCtrl processing failed: {0}")]
    SteerCtrlError(#[from] steer_ctrl::SteerCtrlError),

    #[error("LongCtrl processing failed: {0}")]
    LongCtrlError(#[from] long_ctrl::LongCtrlError),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
///
/// Owns one instance of every cyclic module for the session. Module state
/// is exclusively owned here: running several vehicle sessions concurrently
/// means several fully independent stores, there is no shared mutable
/// state anywhere in the engine.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    // Safe mode variables
    /// Determines if the engine is in safe mode.
    pub safe: bool,

    /// Gives the reason for the engine being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // SteerCtrl
    pub steer_ctrl: steer_ctrl::SteerCtrl,
    pub steer_ctrl_input: steer_ctrl::InputData,
    pub steer_ctrl_output: SteerCommand,
    pub steer_ctrl_status_rpt: steer_ctrl::StatusReport,

    // LongCtrl
    pub long_ctrl: long_ctrl::LongCtrl,
    pub long_ctrl_input: long_ctrl::InputData,
    pub long_ctrl_output: LongCommand,
    pub long_ctrl_status_rpt: long_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the engine into safe mode with the given cause.
    ///
    /// Safe mode fails towards reduced or zero actuation: the steer request
    /// bit is cut, torque and acceleration are zeroed.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            self.steer_ctrl.make_safe();
            self.long_ctrl.make_safe();

            self.steer_ctrl_output = SteerCommand::default();
            self.long_ctrl_output = LongCommand::default();
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and
    /// sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.steer_ctrl_input = steer_ctrl::InputData::default();
        self.steer_ctrl_output = SteerCommand::default();
        self.steer_ctrl_status_rpt = steer_ctrl::StatusReport::default();

        self.long_ctrl_input = long_ctrl::InputData::default();
        self.long_ctrl_output = LongCommand::default();
        self.long_ctrl_status_rpt = long_ctrl::StatusReport::default();
    }

    /// Execute one control frame through the full pipeline.
    ///
    /// Module order within the frame is fixed: SteerCtrl runs its override
    /// detector and fault avoidance ahead of its limiters, then LongCtrl
    /// produces the acceleration command. On a processing error the engine
    /// goes safe and the error is propagated to the caller.
    pub fn exec_frame(
        &mut self,
        vehicle: VehicleState,
        demand: ActuationDemand
    ) -> Result<(), CycleError> {
        use util::module::State;

        self.steer_ctrl_input = steer_ctrl::InputData { vehicle, demand };
        self.long_ctrl_input = long_ctrl::InputData { vehicle, demand };

        match self.steer_ctrl.proc(&self.steer_ctrl_input) {
            Ok((output, report)) => {
                self.steer_ctrl_output = output;
                self.steer_ctrl_status_rpt = report;
            }
            Err(e) => {
                self.make_safe(SafeModeCause::ModuleProcError);
                return Err(e.into());
            }
        }

        match self.long_ctrl.proc(&self.long_ctrl_input) {
            Ok((output, report)) => {
                self.long_ctrl_output = output;
                self.long_ctrl_status_rpt = report;
            }
            Err(e) => {
                self.make_safe(SafeModeCause::ModuleProcError);
                return Err(e.into());
            }
        }

        self.num_cycles += 1;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::veh_model::test::test_geometry;
    use veh_if::LongControlState;

    const DT: f64 = 0.01;

    fn test_store() -> DataStore {
        let mut ds = DataStore::default();
        ds.steer_ctrl
            .set_params(crate::steer_ctrl::test_params(), test_geometry(), DT)
            .unwrap();
        ds.long_ctrl
            .set_params(crate::long_ctrl::test_params(), DT)
            .unwrap();
        ds
    }

    fn frame(speed: f64, angle: f64, accel: f64) -> (VehicleState, ActuationDemand) {
        (
            VehicleState {
                v_ego_raw_ms: speed,
                steering_angle_deg: 0.0,
                steering_torque: 0.0,
                a_ego_ms2: 0.0,
                standstill: false,
            },
            ActuationDemand {
                angle_deg: angle,
                torque_norm: 0.0,
                curvature_inv_m: 0.0,
                accel_ms2: accel,
                lat_active: true,
                long_active: true,
                long_state: LongControlState::Pid,
                lead_visible: Some(false),
            },
        )
    }

    #[test]
    fn test_end_to_end_frame() {
        let mut ds = test_store();
        let (vehicle, demand) = frame(20.0, 30.0, 1.0);

        ds.exec_frame(vehicle, demand).unwrap();

        // One frame never jumps to the demand
        assert!(ds.steer_ctrl_output.angle_deg < 30.0);
        assert!(ds.steer_ctrl_output.angle_deg.abs() <= 500.0 * DT + 1e-9);
        assert!(ds.long_ctrl_output.accel_ms2 < 1.0);
        assert!(ds.steer_ctrl_output.steer_req);
        assert_eq!(ds.num_cycles, 1);
    }

    #[test]
    fn test_proc_error_goes_safe() {
        // An uninitialised module must drive the store into safe mode
        let mut ds = DataStore::default();
        let (vehicle, demand) = frame(20.0, 30.0, 1.0);

        assert!(ds.exec_frame(vehicle, demand).is_err());
        assert!(ds.safe);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::ModuleProcError));
        assert!(!ds.steer_ctrl_output.steer_req);
        assert_eq!(ds.long_ctrl_output.accel_ms2, 0.0);
    }

    #[test]
    fn test_cycle_start_clears_frame_data() {
        let mut ds = test_store();
        let (vehicle, demand) = frame(20.0, 30.0, 1.0);

        for _ in 0..150 {
            ds.exec_frame(vehicle, demand).unwrap();
        }
        assert!(ds.steer_ctrl_output.angle_deg > 0.0);

        ds.cycle_start(100.0);
        assert_eq!(ds.steer_ctrl_output.angle_deg, 0.0);
        assert!(!ds.is_1_hz_cycle);
    }
}
