//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error describing an invalid breakpoint lookup table.
#[derive(Debug, Error)]
#[error("Invalid lookup table {name}: {reason}")]
pub struct TableError {
    pub name: &'static str,
    pub reason: &'static str,
}

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (ACT_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parameter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the "act_sw/params" directory
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    // Get the params dir
    let mut path = crate::host::get_act_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    // Load the file into a string
    let params_str = match read_to_string(path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(e))
    };

    // Parse the string into the parameter struct
    match toml::from_str(params_str.as_str()) {
        Ok(p) => Ok(p),
        Err(e) => Err(LoadError::DeserialiseError(e))
    }
}

/// Check that a breakpoint table is non-empty, of matching lengths, and has
/// strictly ascending breakpoints.
///
/// Malformed tables are configuration programming errors and must fail the
/// session at init, never per-frame.
pub fn validate_table(
    bp: &[f64],
    values: &[f64],
    name: &'static str
) -> Result<(), TableError> {
    if bp.is_empty() || values.is_empty() {
        return Err(TableError { name, reason: "table must not be empty" });
    }
    if bp.len() != values.len() {
        return Err(TableError {
            name,
            reason: "breakpoint and value lengths must match"
        });
    }
    if bp.windows(2).any(|w| w[0] >= w[1]) {
        return Err(TableError {
            name,
            reason: "breakpoints must be strictly ascending"
        });
    }

    Ok(())
}
