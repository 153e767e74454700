//! Main actuation-control executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop (fixed rate):
//!         - Frame input acquisition (drive cycle replay)
//!         - Steering control processing (override detection and fault
//!           avoidance ahead of the limiters)
//!         - Longitudinal control processing
//!         - Output archiving
//!
//! # Modules
//!
//! All modules (e.g. `steer_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State`
//!        trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use act_lib::{
    data_store::{DataStore, SafeModeCause},
    long_ctrl,
    params::ActExecParams,
    replay::DriveCycle,
    steer_ctrl,
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn};
use serde::Serialize;
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Parameter file for the executable itself.
const EXEC_PARAMS_FILE: &str = "act_exec.toml";

/// Parameter files for the cyclic modules.
const STEER_CTRL_PARAMS_FILE: &str = "steer_ctrl.toml";
const VEH_MODEL_PARAMS_FILE: &str = "veh_model.toml";
const LONG_CTRL_PARAMS_FILE: &str = "long_ctrl.toml";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Summary of a replay run, saved into the session at exit.
#[derive(Serialize)]
struct ReplaySummary {
    num_frames: usize,
    num_cycle_overruns: u64,
    made_safe: bool,
    final_angle_deg: f64,
    final_accel_ms2: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "act_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Actuation Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ActExecParams = util::params::load(
        EXEC_PARAMS_FILE
    ).wrap_err("Could not load exec params")?;

    if !(exec_params.cycle_period_s > 0.0) {
        return Err(eyre!(
            "Expected a positive cycle period, got {}",
            exec_params.cycle_period_s
        ));
    }

    let cycle_frequency_hz = 1.0 / exec_params.cycle_period_s;

    info!("Exec parameters loaded");
    info!("    Cycle period: {} s ({} Hz)", exec_params.cycle_period_s, cycle_frequency_hz);

    // ---- LOAD DRIVE CYCLE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        return Err(eyre!(
            "Expected exactly one argument (the drive cycle CSV), found {}",
            args.len() - 1
        ));
    }

    info!("Loading drive cycle from \"{}\"", &args[1]);

    let drive_cycle = DriveCycle::from_csv(&args[1])
        .wrap_err("Failed to load the drive cycle")?;

    if drive_cycle.is_empty() {
        return Err(eyre!("The drive cycle contains no frames"));
    }

    info!(
        "Loaded drive cycle lasts {:.02} s and contains {} frames\n",
        drive_cycle.len() as f64 * exec_params.cycle_period_s,
        drive_cycle.len()
    );

    // ---- MODULE INITIALISATION ----

    let mut ds = DataStore::default();

    ds.steer_ctrl.init(
        steer_ctrl::InitData {
            params_file: STEER_CTRL_PARAMS_FILE,
            geometry_file: VEH_MODEL_PARAMS_FILE,
            cycle_period_s: exec_params.cycle_period_s,
        },
        &session
    ).wrap_err("Failed to initialise SteerCtrl")?;

    info!("SteerCtrl init complete");

    ds.long_ctrl.init(
        long_ctrl::InitData {
            params_file: LONG_CTRL_PARAMS_FILE,
            cycle_period_s: exec_params.cycle_period_s,
        },
        &session
    ).wrap_err("Failed to initialise LongCtrl")?;

    info!("LongCtrl init complete");

    // ---- MAIN LOOP ----

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);
    let mut num_cycle_overruns = 0u64;

    for (vehicle, demand) in drive_cycle.iter() {
        let cycle_start_instant = Instant::now();

        ds.cycle_start(cycle_frequency_hz);

        if let Err(e) = ds.exec_frame(*vehicle, *demand) {
            // The store has already gone safe; log and stop feeding frames
            warn!("Frame processing failed: {}", e);
            break;
        }

        // Archive module outputs
        ds.steer_ctrl.write().map_err(|e| eyre!("SteerCtrl archive failed: {}", e))?;
        ds.long_ctrl.write().map_err(|e| eyre!("LongCtrl archive failed: {}", e))?;

        if ds.is_1_hz_cycle {
            info!(
                "[{:7}] angle: {:7.2} deg (req: {:5}), accel: {:5.2} m/s^2 (stopping: {:5})",
                ds.num_cycles,
                ds.steer_ctrl_output.angle_deg,
                ds.steer_ctrl_output.steer_req,
                ds.long_ctrl_output.accel_ms2,
                ds.long_ctrl_output.stopping
            );
        }

        // Cycle timing
        let elapsed = cycle_start_instant.elapsed();
        if elapsed > cycle_period {
            num_cycle_overruns += 1;
            ds.num_consec_cycle_overruns += 1;
            warn!(
                "Cycle overran: {:.3} ms (limit {:.3} ms)",
                elapsed.as_secs_f64() * 1e3,
                cycle_period.as_secs_f64() * 1e3
            );

            if ds.num_consec_cycle_overruns >= exec_params.max_consec_cycle_overruns {
                ds.make_safe(SafeModeCause::CycleOverrunLimit);
                break;
            }
        }
        else {
            ds.num_consec_cycle_overruns = 0;

            if exec_params.realtime {
                thread::sleep(cycle_period - elapsed);
            }
        }
    }

    // ---- SHUTDOWN ----

    let summary = ReplaySummary {
        num_frames: drive_cycle.len(),
        num_cycle_overruns,
        made_safe: ds.safe,
        final_angle_deg: ds.steer_ctrl_output.angle_deg,
        final_accel_ms2: ds.long_ctrl_output.accel_ms2,
    };

    info!(
        "Replay complete: {} frames, {} overruns, safe: {}",
        summary.num_frames, summary.num_cycle_overruns, summary.made_safe
    );

    session.save("replay_summary.json", summary);
    session.exit();

    Ok(())
}
