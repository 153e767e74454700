//! Host platform utility functions

use std::path::PathBuf;

/// Name of the environment variable pointing at the software root.
pub const SW_ROOT_ENV_VAR: &str = "ACT_SW_ROOT";

/// Get the root directory of the software installation.
///
/// The root is read from the `ACT_SW_ROOT` environment variable, and is the
/// directory containing `params` and `sessions`.
pub fn get_act_sw_root() -> Result<PathBuf, std::env::VarError> {
    let root = std::env::var(SW_ROOT_ENV_VAR)?;
    Ok(PathBuf::from(root))
}
