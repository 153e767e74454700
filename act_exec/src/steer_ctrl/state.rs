//! Implementations for the SteerCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::Serialize;

// Internal
use super::*;
use crate::veh_model::{GeometryError, VehicleGeometry, VehicleModel};
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::Session,
};
use veh_if::{ActuationDemand, SteerCommand, VehicleState};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Steering control module state
#[derive(Default)]
pub struct SteerCtrl {
    pub(crate) params: Params,

    /// Control cycle period, set at init.
    ///
    /// Units: seconds
    pub(crate) cycle_period_s: f64,

    /// Vehicle model, built from the validated geometry at init.
    pub(crate) model: Option<VehicleModel>,

    fault_avoid: FaultAvoidance,
    override_det: OverrideDetector,

    /// Angle applied on the previous frame.
    ///
    /// Units: degrees
    apply_angle_last_deg: f64,

    /// Torque applied on the previous frame, native actuator units.
    apply_torque_last: f64,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    pub(crate) output: SteerCommand,
    arch_output: Archiver,
}

/// Input data to steering control.
#[derive(Clone, Copy, Default)]
pub struct InputData {
    /// Measured vehicle state for this frame.
    pub vehicle: VehicleState,

    /// Planner demand for this frame.
    pub demand: ActuationDemand,
}

/// Status report for SteerCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Driver override currently holding actuation suspended.
    pub override_active: bool,

    /// Fault avoidance machine state.
    pub fault_state: FaultAvoidState,

    /// The angle demand was cut by the angle-rate bound this frame.
    pub angle_rate_limited: bool,

    /// The angle demand was cut by the lateral-accel bound this frame.
    pub angle_accel_limited: bool,

    /// The torque demand was cut by the driver-torque band this frame.
    pub torque_driver_limited: bool,
}

/// Data required to initialise SteerCtrl.
#[derive(Clone, Copy)]
pub struct InitData {
    /// Path to the module's parameter file, relative to the params dir.
    pub params_file: &'static str,

    /// Path to the platform geometry file, relative to the params dir.
    pub geometry_file: &'static str,

    /// Control cycle period.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during initialisation of the module.
///
/// All of these are startup-fatal: none is recoverable per-frame.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Cannot load parameters: {0}")]
    ParamLoadError(#[from] params::LoadError),

    #[error("Invalid vehicle geometry: {0}")]
    GeometryError(#[from] GeometryError),

    #[error("Invalid parameter: {0}")]
    InvalidParam(&'static str),

    #[error(transparent)]
    InvalidTable(#[from] params::TableError),

    #[error("Cycle period must be positive, got {0}")]
    InvalidCyclePeriod(f64),

    #[error("Cannot initialise archiver: {0}")]
    ArchiveError(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for SteerCtrl {
    type InitData = InitData;
    type InitError = InitError;

    type InputData = InputData;
    type OutputData = SteerCommand;
    type StatusReport = StatusReport;
    type ProcError = SteerCtrlError;

    /// Initialise the SteerCtrl module.
    ///
    /// Loads and validates the module parameters and platform geometry.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        let loaded_params: Params = params::load(init_data.params_file)?;
        let geom: VehicleGeometry = params::load(init_data.geometry_file)?;

        self.set_params(loaded_params, geom, init_data.cycle_period_s)?;

        // Create the arch folder for steer_ctrl
        let mut arch_path = session.arch_root.clone();
        arch_path.push("steer_ctrl");
        std::fs::create_dir_all(arch_path)
            .map_err(|e| InitError::ArchiveError(e.to_string()))?;

        // Initialise the archivers
        self.arch_report = Archiver::from_path(session, "steer_ctrl/status_report.csv")
            .map_err(|e| InitError::ArchiveError(e.to_string()))?;
        self.arch_output = Archiver::from_path(session, "steer_ctrl/output.csv")
            .map_err(|e| InitError::ArchiveError(e.to_string()))?;

        Ok(())
    }

    /// Perform cyclic processing of steering control.
    ///
    /// The override detector and fault avoidance machine are evaluated
    /// before the limiters finalise their outputs, since both can force
    /// suppression of the final request.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        let model = match self.model.as_ref() {
            Some(m) => m,
            None => return Err(SteerCtrlError::NotInitialised)
        };

        let vehicle = &input_data.vehicle;
        let demand = &input_data.demand;

        let angle_gap_deg = (self.apply_angle_last_deg - vehicle.steering_angle_deg).abs();
        let override_active = self.override_det.update(
            vehicle.steering_torque,
            angle_gap_deg,
            vehicle.standstill,
            demand.lat_active,
            &self.params.override_det
        );

        let fault_condition =
            vehicle.steering_angle_deg.abs() >= self.params.fault.fault_angle_threshold_deg;
        let steer_req = self.fault_avoid.update(
            fault_condition,
            demand.lat_active,
            &self.params.fault
        );

        self.report.override_active = override_active;
        self.report.fault_state = self.fault_avoid.state();

        // Override suspends actuation without disengaging the mode: the
        // angle command tracks the wheel as if lateral control were off
        let steering_active = demand.lat_active && !override_active;

        let mut output = SteerCommand::default();
        output.steer_req = steer_req;

        match self.params.command_kind {
            CommandKind::Angle | CommandKind::Curvature => {
                let desired_angle_deg = match self.params.command_kind {
                    CommandKind::Curvature => model.angle_from_curvature(
                        demand.curvature_inv_m,
                        vehicle.v_ego_raw_ms,
                        0.0
                    ),
                    _ => demand.angle_deg,
                };

                self.apply_angle_last_deg = Self::apply_angle_limits(
                    &self.params,
                    model,
                    self.cycle_period_s,
                    self.apply_angle_last_deg,
                    desired_angle_deg,
                    vehicle.v_ego_raw_ms,
                    vehicle.steering_angle_deg,
                    steering_active,
                    &mut self.report
                );

                output.angle_deg = self.apply_angle_last_deg;
            }
            CommandKind::Torque => {
                let max_torque = self.params.torque.max_torque;
                let desired_torque =
                    util::maths::clamp(&demand.torque_norm, &-1.0, &1.0) * max_torque;

                let mut apply_torque = Self::apply_torque_limits(
                    &self.params.torque,
                    desired_torque,
                    self.apply_torque_last,
                    vehicle.steering_torque,
                    &mut self.report
                );

                // Disengagement is an immediate same-frame zero, never a
                // decay: a stale command must not reach the actuator
                if !demand.lat_active {
                    apply_torque = 0.0;
                }

                self.apply_torque_last = apply_torque;
                output.torque_norm = apply_torque / max_torque;
            }
        }

        self.output = output;

        Ok((output, self.report))
    }
}

impl SteerCtrl {
    /// Install a validated parameter/geometry snapshot.
    ///
    /// Used by `init` after loading the files, and directly by hosts that
    /// build their configuration in memory (replay harnesses, benches).
    pub fn set_params(
        &mut self,
        params: Params,
        geom: VehicleGeometry,
        cycle_period_s: f64
    ) -> Result<(), InitError> {
        if !(cycle_period_s > 0.0) {
            return Err(InitError::InvalidCyclePeriod(cycle_period_s));
        }
        params.validate()?;

        self.model = Some(VehicleModel::new(geom)?);
        self.params = params;
        self.cycle_period_s = cycle_period_s;

        Ok(())
    }

    /// Force the module into a safe output state.
    ///
    /// The request bit is cut and the torque path zeroed; the angle command
    /// is left at its last value so a later re-engage starts from a
    /// consistent state.
    pub fn make_safe(&mut self) {
        warn!("SteerCtrl made safe");
        self.output.steer_req = false;
        self.output.torque_norm = 0.0;
        self.apply_torque_last = 0.0;
    }
}

impl Archived for SteerCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;
        self.arch_output.serialise(self.output)?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::veh_model::test::test_geometry;
    use veh_if::LongControlState;

    const DT: f64 = 0.01;

    fn active_input(desired_angle: f64, speed: f64, measured: f64) -> InputData {
        InputData {
            vehicle: VehicleState {
                v_ego_raw_ms: speed,
                steering_angle_deg: measured,
                steering_torque: 0.0,
                a_ego_ms2: 0.0,
                standstill: false,
            },
            demand: ActuationDemand {
                angle_deg: desired_angle,
                torque_norm: 0.0,
                curvature_inv_m: 0.0,
                accel_ms2: 0.0,
                lat_active: true,
                long_active: false,
                long_state: LongControlState::Off,
                lead_visible: Some(false),
            },
        }
    }

    fn test_ctrl() -> SteerCtrl {
        let mut ctrl = SteerCtrl::default();
        ctrl.set_params(super::super::params::test_params(), test_geometry(), DT)
            .unwrap();
        ctrl
    }

    #[test]
    fn test_proc_before_init_is_an_error() {
        let mut ctrl = SteerCtrl::default();
        assert!(matches!(
            ctrl.proc(&InputData::default()),
            Err(SteerCtrlError::NotInitialised)
        ));
    }

    #[test]
    fn test_disengage_freezes_to_measured_angle() {
        let mut ctrl = test_ctrl();

        for _ in 0..100 {
            ctrl.proc(&active_input(20.0, 15.0, 18.0)).unwrap();
        }

        let mut input = active_input(20.0, 15.0, 12.3);
        input.demand.lat_active = false;

        let (output, _) = ctrl.proc(&input).unwrap();
        assert_eq!(output.angle_deg, 12.3);
    }

    #[test]
    fn test_override_suspends_actuation() {
        let mut ctrl = test_ctrl();

        for _ in 0..200 {
            ctrl.proc(&active_input(5.0, 15.0, 5.0)).unwrap();
        }

        // Driver grabs the wheel and drags it away from the command
        let mut input = active_input(5.0, 15.0, 30.0);
        input.vehicle.steering_torque = 200.0;

        let (output, report) = ctrl.proc(&input).unwrap();
        assert!(report.override_active);
        assert_eq!(output.angle_deg, 30.0);

        // Torque released but the wheel still held off the command: the
        // override must persist and the angle keep tracking the wheel
        let mut input = active_input(5.0, 15.0, 25.0);
        input.vehicle.steering_torque = 0.0;

        let (output, report) = ctrl.proc(&input).unwrap();
        assert!(report.override_active);
        assert_eq!(output.angle_deg, 25.0);
    }

    #[test]
    fn test_fault_pulse_cuts_request_bit() {
        let mut ctrl = test_ctrl();
        let input = active_input(30.0, 10.0, 86.0);

        for _ in 0..89 {
            let (output, _) = ctrl.proc(&input).unwrap();
            assert!(output.steer_req);
        }

        for _ in 0..2 {
            let (output, report) = ctrl.proc(&input).unwrap();
            assert!(!output.steer_req);
            assert_eq!(report.fault_state, FaultAvoidState::Suppressing);
        }

        let (output, _) = ctrl.proc(&input).unwrap();
        assert!(output.steer_req);
    }

    #[test]
    fn test_curvature_command_kind() {
        let mut params = super::super::params::test_params();
        params.command_kind = CommandKind::Curvature;

        let mut ctrl = SteerCtrl::default();
        ctrl.set_params(params, test_geometry(), DT).unwrap();

        let mut input = active_input(0.0, 20.0, 0.0);
        input.demand.curvature_inv_m = 0.002;

        let mut angle = 0.0;
        for _ in 0..1000 {
            let (output, _) = ctrl.proc(&input).unwrap();
            angle = output.angle_deg;
        }

        // Converged to the model's angle for the demanded curvature
        let expected = ctrl
            .model
            .as_ref()
            .unwrap()
            .angle_from_curvature(0.002, 20.0, 0.0);
        assert!((angle - expected).abs() < 1e-6);
    }

    #[test]
    fn test_torque_command_kind_disengage_zeroes() {
        let mut params = super::super::params::test_params();
        params.command_kind = CommandKind::Torque;

        let mut ctrl = SteerCtrl::default();
        ctrl.set_params(params, test_geometry(), DT).unwrap();

        let mut input = active_input(0.0, 15.0, 0.0);
        input.demand.torque_norm = 0.5;

        for _ in 0..200 {
            ctrl.proc(&input).unwrap();
        }
        let (output, _) = ctrl.proc(&input).unwrap();
        assert!((output.torque_norm - 0.5).abs() < 1e-9);

        input.demand.lat_active = false;
        let (output, _) = ctrl.proc(&input).unwrap();
        assert_eq!(output.torque_norm, 0.0);
    }

    #[test]
    fn test_invalid_params_rejected_at_init() {
        let mut params = super::super::params::test_params();
        params.lat.smoothing_alpha_v = vec![0.2];

        let mut ctrl = SteerCtrl::default();
        assert!(matches!(
            ctrl.set_params(params, test_geometry(), DT),
            Err(InitError::InvalidTable(_))
        ));

        let mut params = super::super::params::test_params();
        params.lat.max_angle_rate_deg_s = 0.0;

        assert!(matches!(
            ctrl.set_params(params, test_geometry(), DT),
            Err(InitError::InvalidParam(_))
        ));

        assert!(matches!(
            ctrl.set_params(super::super::params::test_params(), test_geometry(), 0.0),
            Err(InitError::InvalidCyclePeriod(_))
        ));
    }
}
