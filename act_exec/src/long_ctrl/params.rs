//! Parameters structure for LongCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::InitError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for longitudinal control.
///
/// A typed per-platform snapshot, loaded and validated once at session
/// start. Never mutated mid-session.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// Strongest commanded deceleration.
    ///
    /// Units: meters/second^2
    pub accel_min_ms2: f64,

    /// Strongest commanded acceleration.
    ///
    /// Units: meters/second^2
    pub accel_max_ms2: f64,

    /// Speed breakpoints for the upper (acceleration) jerk ceiling.
    ///
    /// Units: meters/second
    pub jerk_upper_bp_ms: Vec<f64>,

    /// Upper jerk ceiling at each speed breakpoint.
    ///
    /// Units: meters/second^3
    pub jerk_upper_v: Vec<f64>,

    /// Speed breakpoints for the lower (deceleration) jerk ceiling.
    ///
    /// Units: meters/second
    pub jerk_lower_bp_ms: Vec<f64>,

    /// Lower jerk ceiling at each speed breakpoint. Shrinks as speed grows,
    /// following the ISO 15622 deceleration-jerk schedule.
    ///
    /// Units: meters/second^3
    pub jerk_lower_v: Vec<f64>,

    /// Floor for both jerk bounds, and the idle bound used when nothing is
    /// demanding a ramp.
    ///
    /// Units: meters/second^3
    pub min_jerk_ms3: f64,

    /// Upper jerk ceiling outside closed-loop acceleration tracking.
    ///
    /// Units: meters/second^3
    pub non_pid_jerk_upper_ms3: f64,

    /// Speed breakpoints for the lookahead window.
    ///
    /// Units: meters/second
    pub lookahead_bp_ms: Vec<f64>,

    /// Lookahead window at each speed breakpoint. The bounds ramp towards
    /// `|accel error| / lookahead` so the integrator is ready before the
    /// error grows.
    ///
    /// Units: seconds
    pub lookahead_v_s: Vec<f64>,

    /// Acceleration error below which, with no lead vehicle, the bounds
    /// rest at the idle value.
    ///
    /// Units: meters/second^2
    pub accel_error_band_ms2: f64,

    /// Lower jerk bound used when the radar/lead context is unavailable.
    /// Generous by design: without lead data the controller favours strong,
    /// safe deceleration capability over tuned comfort.
    ///
    /// Units: meters/second^3
    pub no_lead_jerk_lower_ms3: f64,

    /// Largest per-frame movement of either jerk bound.
    ///
    /// Units: meters/second^3 per frame
    pub jerk_ramp_step: f64,

    /// Bound error below which the ramp snaps to its target.
    ///
    /// Units: meters/second^3
    pub jerk_ramp_threshold: f64,

    /// Dwell the stop state machine holds in `EnteringStop` before
    /// committing to `Stopped`.
    ///
    /// Units: seconds
    pub stopping_dwell_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Validate the parameter snapshot.
    ///
    /// Configuration programming errors are not recoverable per-frame, so
    /// any failure here must abort the session before the first cycle.
    pub fn validate(&self) -> Result<(), InitError> {
        use InitError::InvalidParam;

        if self.accel_min_ms2 >= 0.0 {
            return Err(InvalidParam("accel_min_ms2 must be negative"));
        }
        if self.accel_max_ms2 <= 0.0 {
            return Err(InvalidParam("accel_max_ms2 must be positive"));
        }
        if self.min_jerk_ms3 <= 0.0 {
            return Err(InvalidParam("min_jerk_ms3 must be positive"));
        }
        if self.non_pid_jerk_upper_ms3 < self.min_jerk_ms3 {
            return Err(InvalidParam(
                "non_pid_jerk_upper_ms3 must not be below min_jerk_ms3"
            ));
        }
        if self.no_lead_jerk_lower_ms3 < self.min_jerk_ms3 {
            return Err(InvalidParam(
                "no_lead_jerk_lower_ms3 must not be below min_jerk_ms3"
            ));
        }
        if self.jerk_ramp_step <= 0.0 {
            return Err(InvalidParam("jerk_ramp_step must be positive"));
        }
        if self.jerk_ramp_threshold < 0.0 {
            return Err(InvalidParam("jerk_ramp_threshold must not be negative"));
        }
        if self.accel_error_band_ms2 < 0.0 {
            return Err(InvalidParam("accel_error_band_ms2 must not be negative"));
        }
        if self.stopping_dwell_s < 0.0 {
            return Err(InvalidParam("stopping_dwell_s must not be negative"));
        }

        util::params::validate_table(
            &self.jerk_upper_bp_ms,
            &self.jerk_upper_v,
            "jerk_upper"
        )?;
        util::params::validate_table(
            &self.jerk_lower_bp_ms,
            &self.jerk_lower_v,
            "jerk_lower"
        )?;
        util::params::validate_table(
            &self.lookahead_bp_ms,
            &self.lookahead_v_s,
            "lookahead"
        )?;

        if self.jerk_upper_v.iter().any(|j| *j < self.min_jerk_ms3)
            || self.jerk_lower_v.iter().any(|j| *j < self.min_jerk_ms3)
        {
            return Err(InvalidParam(
                "jerk table entries must not be below min_jerk_ms3"
            ));
        }
        if self.lookahead_v_s.iter().any(|t| *t <= 0.0) {
            return Err(InvalidParam("lookahead_v_s entries must be positive"));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_params() -> Params {
    Params {
        accel_min_ms2: -3.5,
        accel_max_ms2: 2.0,
        jerk_upper_bp_ms: vec![0.0, 5.0, 20.0],
        jerk_upper_v: vec![2.0, 3.0, 2.0],
        jerk_lower_bp_ms: vec![0.0, 5.0, 20.0],
        jerk_lower_v: vec![5.0, 3.5, 2.5],
        min_jerk_ms3: 0.5,
        non_pid_jerk_upper_ms3: 1.0,
        lookahead_bp_ms: vec![2.0, 5.0],
        lookahead_v_s: vec![0.25, 0.5],
        accel_error_band_ms2: 0.5,
        no_lead_jerk_lower_ms3: 5.0,
        jerk_ramp_step: 0.1,
        jerk_ramp_threshold: 0.1,
        stopping_dwell_s: 1.0,
    }
}
