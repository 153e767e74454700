//! # Vehicle interface crate.
//!
//! Provides the per-frame data types exchanged between the actuation control
//! engine and its external collaborators (state estimation upstream, the
//! brand-specific CAN codec layer downstream). The engine never touches wire
//! bytes; these structs are its whole surface.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Measured vehicle state consumed by the engine each frame
pub mod state;

/// Desired actuation demands from the upstream planner
pub mod demand;

/// Commands produced by the engine for the CAN codec layer
pub mod command;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use command::{LongCommand, SteerCommand};
pub use demand::{ActuationDemand, LongControlState};
pub use state::VehicleState;
