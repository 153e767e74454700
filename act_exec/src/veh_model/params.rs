//! Parameters structure for the vehicle model

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per-platform vehicle geometry.
///
/// Immutable for the whole session; consumed only by the vehicle model.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct VehicleGeometry {
    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    /// Ratio between steering wheel angle and road wheel angle.
    pub steer_ratio: f64,

    /// Position of the centre of mass along the wheelbase, as a fraction of
    /// the wheelbase measured from the front axle. Must be in (0, 1).
    pub center_to_front_ratio: f64,

    /// Total vehicle mass.
    ///
    /// Units: kilograms
    pub mass_kg: f64,

    /// Front axle cornering stiffness.
    ///
    /// Units: newtons/radian
    pub tire_stiffness_front: f64,

    /// Rear axle cornering stiffness.
    ///
    /// Units: newtons/radian
    pub tire_stiffness_rear: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VehicleGeometry {
    /// Distance from the centre of mass to the front axle.
    ///
    /// Units: meters
    pub fn center_to_front_m(&self) -> f64 {
        self.wheelbase_m * self.center_to_front_ratio
    }

    /// Distance from the centre of mass to the rear axle.
    ///
    /// Units: meters
    pub fn center_to_rear_m(&self) -> f64 {
        self.wheelbase_m - self.center_to_front_m()
    }

    /// Validate the geometry, returning an error describing the first
    /// problem found.
    ///
    /// Geometry errors are startup-fatal: a session must never be started
    /// with a model that could produce non-finite angles.
    pub fn validate(&self) -> Result<(), super::GeometryError> {
        use super::GeometryError::*;

        if self.wheelbase_m <= 0.0 {
            return Err(NonPositive("wheelbase_m"));
        }
        if self.steer_ratio <= 0.0 {
            return Err(NonPositive("steer_ratio"));
        }
        if self.mass_kg <= 0.0 {
            return Err(NonPositive("mass_kg"));
        }
        if self.tire_stiffness_front <= 0.0 {
            return Err(NonPositive("tire_stiffness_front"));
        }
        if self.tire_stiffness_rear <= 0.0 {
            return Err(NonPositive("tire_stiffness_rear"));
        }
        if self.center_to_front_ratio <= 0.0 || self.center_to_front_ratio >= 1.0 {
            return Err(CentreOfMassOutsideWheelbase(self.center_to_front_ratio));
        }

        // An oversteering geometry (positive slip factor) has a critical
        // speed above which the curvature factor diverges
        if super::slip_factor(self) > 0.0 {
            return Err(OversteeringGeometry);
        }

        Ok(())
    }
}
