//! Implementations for the LongCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::Serialize;

// Internal
use super::*;
use util::{
    archive::{Archived, Archiver},
    maths::clamp,
    module::State,
    params,
    session::Session,
};
use veh_if::{ActuationDemand, LongCommand, VehicleState};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Longitudinal control module state
#[derive(Default)]
pub struct LongCtrl {
    pub(crate) params: Params,

    /// Control cycle period, set at init.
    ///
    /// Units: seconds
    pub(crate) cycle_period_s: f64,

    /// Whether a validated parameter snapshot has been installed.
    initialised: bool,

    stop_ctrl: StopCtrl,

    /// Dwell target for the stop machine, derived from params at init.
    ///
    /// Units: frames
    dwell_target_frames: u32,

    /// Upper jerk bound in force.
    ///
    /// Units: meters/second^3
    pub(crate) jerk_upper_ms3: f64,

    /// Lower jerk bound in force.
    ///
    /// Units: meters/second^3
    pub(crate) jerk_lower_ms3: f64,

    /// Acceleration applied on the previous frame.
    ///
    /// Units: meters/second^2
    pub(crate) accel_last_ms2: f64,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    pub(crate) output: LongCommand,
    arch_output: Archiver,
}

/// Input data to longitudinal control.
#[derive(Clone, Copy, Default)]
pub struct InputData {
    /// Measured vehicle state for this frame.
    pub vehicle: VehicleState,

    /// Planner demand for this frame.
    pub demand: ActuationDemand,
}

/// Status report for LongCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Phase of the stop state machine.
    pub stop_phase: StopPhase,

    /// The acceleration target was cut by a jerk bound this frame.
    pub accel_jerk_limited: bool,

    /// The radar/lead context was unavailable and the fallback lower jerk
    /// bound is in force.
    pub lead_context_missing: bool,
}

/// Data required to initialise LongCtrl.
#[derive(Clone, Copy)]
pub struct InitData {
    /// Path to the module's parameter file, relative to the params dir.
    pub params_file: &'static str,

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

impl State for LongCtrl {
    type InitData = InitData;
    type InitError = InitError;

    type InputData = InputData;
    type OutputData = LongCommand;
    type StatusReport = StatusReport;
    type ProcError = LongCtrlError;

    /// Initialise the LongCtrl module.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        let loaded_params: Params = params::load(init_data.params_file)?;

        self.set_params(loaded_params, init_data.cycle_period_s)?;

        // Create the arch folder for long_ctrl
        let mut arch_path = session.arch_root.clone();
        arch_path.push("long_ctrl");
        std::fs::create_dir_all(arch_path)
            .map_err(|e| InitError::ArchiveError(e.to_string()))?;

        // Initialise the archivers
        self.arch_report = Archiver::from_path(session, "long_ctrl/status_report.csv")
            .map_err(|e| InitError::ArchiveError(e.to_string()))?;
        self.arch_output = Archiver::from_path(session, "long_ctrl/output.csv")
            .map_err(|e| InitError::ArchiveError(e.to_string()))?;

        Ok(())
    }

    /// Perform cyclic processing of longitudinal control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        if !self.initialised {
            return Err(LongCtrlError::NotInitialised);
        }

        let vehicle = &input_data.vehicle;
        let demand = &input_data.demand;

        // Disengagement is an immediate same-frame reset, never a decay: a
        // stale non-zero command must not reach the actuator
        if !demand.long_active {
            self.reset();
            self.output = LongCommand::default();
            return Ok((self.output, self.report));
        }

        let stopping = self.stop_ctrl.update(demand.long_state, self.dwell_target_frames);

        let accel_cmd_ms2 = clamp(
            &demand.accel_ms2,
            &self.params.accel_min_ms2,
            &self.params.accel_max_ms2
        );

        self.calc_jerk_bounds(
            accel_cmd_ms2,
            vehicle.v_ego_raw_ms,
            demand.lead_visible,
            demand.long_state
        );

        // While committed to the stop the target is forced to zero
        // regardless of the raw command
        let target_accel_ms2 = if stopping { 0.0 } else { accel_cmd_ms2 };

        let new_accel_ms2 = jerk_limited_integrator(
            target_accel_ms2,
            self.accel_last_ms2,
            self.jerk_upper_ms3,
            self.jerk_lower_ms3,
            self.cycle_period_s
        );

        self.report.stop_phase = self.stop_ctrl.phase();
        self.report.accel_jerk_limited = new_accel_ms2 != target_accel_ms2;
        self.report.lead_context_missing = demand.lead_visible.is_none();

        self.accel_last_ms2 = new_accel_ms2;

        self.output = LongCommand {
            accel_ms2: new_accel_ms2,
            jerk_upper: self.jerk_upper_ms3,
            jerk_lower: self.jerk_lower_ms3,
            stopping,
        };

        Ok((self.output, self.report))
    }
}

impl LongCtrl {
    /// Install a validated parameter snapshot.
    ///
    /// Used by `init` after loading the file, and directly by hosts that
    /// build their configuration in memory (replay harnesses, benches).
    pub fn set_params(&mut self, params: Params, cycle_period_s: f64) -> Result<(), InitError> {
        if !(cycle_period_s > 0.0) {
            return Err(InitError::InvalidCyclePeriod(cycle_period_s));
        }
        params.validate()?;

        self.dwell_target_frames = (params.stopping_dwell_s / cycle_period_s).round() as u32;
        self.jerk_upper_ms3 = params.min_jerk_ms3;
        self.jerk_lower_ms3 = params.min_jerk_ms3;
        self.params = params;
        self.cycle_period_s = cycle_period_s;
        self.initialised = true;

        Ok(())
    }

    /// Acceleration applied on the previous frame.
    ///
    /// Units: meters/second^2
    pub fn accel_last_ms2(&self) -> f64 {
        self.accel_last_ms2
    }

    /// Reset the per-session mutable state to zero actuation.
    fn reset(&mut self) {
        self.accel_last_ms2 = 0.0;
        self.jerk_upper_ms3 = self.params.min_jerk_ms3;
        self.jerk_lower_ms3 = self.params.min_jerk_ms3;
        self.stop_ctrl.reset();
    }

    /// Force the module into a safe output state.
    pub fn make_safe(&mut self) {
        warn!("LongCtrl made safe");
        self.reset();
        self.output = LongCommand::default();
    }
}

impl Archived for LongCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;
        self.arch_output.serialise(self.output)?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use veh_if::LongControlState;

    const DT: f64 = 0.01;

    fn active_input(accel: f64, speed: f64, long_state: LongControlState) -> InputData {
        InputData {
            vehicle: VehicleState {
                v_ego_raw_ms: speed,
                steering_angle_deg: 0.0,
                steering_torque: 0.0,
                a_ego_ms2: 0.0,
                standstill: false,
            },
            demand: ActuationDemand {
                angle_deg: 0.0,
                torque_norm: 0.0,
                curvature_inv_m: 0.0,
                accel_ms2: accel,
                lat_active: false,
                long_active: true,
                long_state,
                lead_visible: Some(true),
            },
        }
    }

    fn test_ctrl() -> LongCtrl {
        let mut ctrl = LongCtrl::default();
        ctrl.set_params(super::super::params::test_params(), DT).unwrap();
        ctrl
    }

    #[test]
    fn test_proc_before_init_is_an_error() {
        let mut ctrl = LongCtrl::default();
        assert!(matches!(
            ctrl.proc(&InputData::default()),
            Err(LongCtrlError::NotInitialised)
        ));
    }

    #[test]
    fn test_accel_is_jerk_limited_and_converges() {
        let mut ctrl = test_ctrl();
        let input = active_input(2.0, 10.0, LongControlState::Pid);

        let mut prev = 0.0;
        let mut last_output = 0.0;
        for _ in 0..2000 {
            let (output, _) = ctrl.proc(&input).unwrap();

            // Per-frame change bounded by the jerk bound in force
            let step = (output.accel_ms2 - prev).abs();
            assert!(step <= output.jerk_upper.max(output.jerk_lower) * DT + 1e-9);

            prev = output.accel_ms2;
            last_output = output.accel_ms2;
        }

        assert!((last_output - 2.0).abs() < 1e-9);

        // Idempotent once converged
        let (output, _) = ctrl.proc(&input).unwrap();
        assert_eq!(output.accel_ms2, 2.0);
    }

    #[test]
    fn test_demand_clamped_to_accel_range() {
        let mut ctrl = test_ctrl();

        for _ in 0..5000 {
            ctrl.proc(&active_input(9.0, 10.0, LongControlState::Pid)).unwrap();
        }
        assert_eq!(ctrl.accel_last_ms2(), 2.0);

        for _ in 0..5000 {
            ctrl.proc(&active_input(-9.0, 10.0, LongControlState::Pid)).unwrap();
        }
        assert_eq!(ctrl.accel_last_ms2(), -3.5);
    }

    #[test]
    fn test_stop_forces_zero_target() {
        let mut ctrl = test_ctrl();

        // Reach a negative accel while braking towards the stop
        for _ in 0..300 {
            ctrl.proc(&active_input(-1.5, 3.0, LongControlState::Pid)).unwrap();
        }
        assert!(ctrl.accel_last_ms2() < -1.0);

        // Demand stopping: after the dwell the target is forced to zero and
        // the accel ramps back towards it
        let mut stopping_seen = false;
        for _ in 0..1000 {
            let (output, _) = ctrl.proc(&active_input(-1.5, 0.5, LongControlState::Stopping)).unwrap();
            stopping_seen |= output.stopping;
        }

        assert!(stopping_seen);
        assert_eq!(ctrl.accel_last_ms2(), 0.0);
    }

    #[test]
    fn test_disengage_resets_same_frame() {
        let mut ctrl = test_ctrl();

        for _ in 0..500 {
            ctrl.proc(&active_input(1.5, 10.0, LongControlState::Pid)).unwrap();
        }
        assert!(ctrl.accel_last_ms2() > 1.0);

        let mut input = active_input(1.5, 10.0, LongControlState::Pid);
        input.demand.long_active = false;

        let (output, report) = ctrl.proc(&input).unwrap();
        assert_eq!(output.accel_ms2, 0.0);
        assert_eq!(ctrl.accel_last_ms2(), 0.0);
        assert!(!output.stopping);
        assert_eq!(report.stop_phase, StopPhase::Driving);
    }

    #[test]
    fn test_missing_lead_context_reported() {
        let mut ctrl = test_ctrl();

        let mut input = active_input(0.0, 10.0, LongControlState::Pid);
        input.demand.lead_visible = None;

        let mut report = StatusReport::default();
        for _ in 0..100 {
            let (_, r) = ctrl.proc(&input).unwrap();
            report = r;
        }

        assert!(report.lead_context_missing);
        assert_eq!(ctrl.jerk_lower_ms3, 5.0);
    }
}
