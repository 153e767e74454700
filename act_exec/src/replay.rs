//! # Drive cycle replay
//!
//! Loads a recorded or hand-written drive cycle (one CSV row per control
//! frame) and converts it into the engine's frame inputs. Replaying the
//! same cycle through the same parameter snapshot reproduces the engine's
//! outputs frame for frame, which is how limiter changes are reviewed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

// Internal
use veh_if::{demand::ParseLongControlStateError, ActuationDemand, VehicleState};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One CSV row of a drive cycle.
#[derive(Debug, Deserialize)]
pub struct FrameRecord {
    /// Frame timestamp, informational only (the exec drives the rate).
    ///
    /// Units: seconds
    pub time_s: f64,

    pub v_ego_raw_ms: f64,
    pub steering_angle_deg: f64,
    pub steering_torque: f64,
    pub a_ego_ms2: f64,
    pub standstill: bool,

    pub angle_deg: f64,
    pub torque_norm: f64,
    pub curvature_inv_m: f64,
    pub accel_ms2: f64,
    pub lat_active: bool,
    pub long_active: bool,

    /// Longitudinal control state: `off`, `pid` or `stopping`.
    pub long_state: String,

    /// Empty when the radar/lead context was unavailable on this frame.
    pub lead_visible: Option<bool>,
}

/// A loaded drive cycle.
pub struct DriveCycle {
    frames: Vec<(VehicleState, ActuationDemand)>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that occur while loading a drive cycle.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Cannot read the drive cycle: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Row {0}: {1}")]
    InvalidLongState(usize, ParseLongControlStateError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FrameRecord {
    /// Convert the row into the engine's frame input types.
    pub fn to_frame(&self) -> Result<(VehicleState, ActuationDemand), ParseLongControlStateError> {
        let vehicle = VehicleState {
            v_ego_raw_ms: self.v_ego_raw_ms,
            steering_angle_deg: self.steering_angle_deg,
            steering_torque: self.steering_torque,
            a_ego_ms2: self.a_ego_ms2,
            standstill: self.standstill,
        };

        let demand = ActuationDemand {
            angle_deg: self.angle_deg,
            torque_norm: self.torque_norm,
            curvature_inv_m: self.curvature_inv_m,
            accel_ms2: self.accel_ms2,
            lat_active: self.lat_active,
            long_active: self.long_active,
            long_state: self.long_state.parse()?,
            lead_visible: self.lead_visible,
        };

        Ok((vehicle, demand))
    }
}

impl DriveCycle {
    /// Load a drive cycle from a CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        Self::from_reader(csv::Reader::from_path(path)?)
    }

    /// Load a drive cycle from an open CSV reader.
    pub fn from_reader<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, ReplayError> {
        let mut frames = Vec::new();

        for (i, result) in reader.deserialize::<FrameRecord>().enumerate() {
            let record = result?;
            let frame = record
                .to_frame()
                .map_err(|e| ReplayError::InvalidLongState(i, e))?;
            frames.push(frame);
        }

        Ok(Self { frames })
    }

    /// Number of frames in the cycle.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if the cycle contains no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate over the frames in order.
    pub fn iter(&self) -> impl Iterator<Item = &(VehicleState, ActuationDemand)> {
        self.frames.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use veh_if::LongControlState;

    const CYCLE: &str = "\
time_s,v_ego_raw_ms,steering_angle_deg,steering_torque,a_ego_ms2,standstill,angle_deg,torque_norm,curvature_inv_m,accel_ms2,lat_active,long_active,long_state,lead_visible
0.00,20.0,0.5,0.0,0.0,false,2.0,0.0,0.0,0.5,true,true,pid,true
0.01,20.0,0.6,0.0,0.0,false,2.0,0.0,0.0,0.5,true,true,pid,
0.02,19.9,0.7,0.0,-0.1,false,2.0,0.0,0.0,-0.5,true,true,stopping,false
";

    #[test]
    fn test_load_cycle() {
        let reader = csv::Reader::from_reader(CYCLE.as_bytes());
        let cycle = DriveCycle::from_reader(reader).unwrap();

        assert_eq!(cycle.len(), 3);

        let frames: Vec<_> = cycle.iter().collect();
        assert_eq!(frames[0].1.long_state, LongControlState::Pid);
        assert_eq!(frames[0].1.lead_visible, Some(true));

        // Empty lead column means the context was unavailable
        assert_eq!(frames[1].1.lead_visible, None);

        assert_eq!(frames[2].1.long_state, LongControlState::Stopping);
        assert!((frames[2].0.v_ego_raw_ms - 19.9).abs() < 1e-12);
    }

    #[test]
    fn test_bad_long_state_is_an_error() {
        let bad = CYCLE.replace("stopping", "halting");
        let reader = csv::Reader::from_reader(bad.as_bytes());

        assert!(matches!(
            DriveCycle::from_reader(reader),
            Err(ReplayError::InvalidLongState(2, _))
        ));
    }
}
