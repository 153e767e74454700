//! Vehicle model module
//!
//! Converts between path curvature and steering wheel angle using a linear
//! bicycle model with an understeer correction derived from the platform's
//! mass and geometry. The model is stateless: it is built once per session
//! from the validated geometry and then only read.
//!
//! Callers must floor the speed to [`MIN_SPEED_MS`] before converting, as
//! curvature bounds are of the form `accel / speed^2`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Acceleration due to gravity.
///
/// Units: meters/second^2
pub const ACCEL_DUE_TO_GRAVITY_MS2: f64 = 9.81;

/// Minimum speed used in curvature conversions.
///
/// Units: meters/second
pub const MIN_SPEED_MS: f64 = 1.0;

/// Below this slip factor magnitude the platform is treated as neutral
/// steering and roll compensation is disabled.
const SLIP_FACTOR_NEUTRAL_LIMIT: f64 = 1e-6;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised by vehicle geometry validation.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("Geometry value {0} must be positive")]
    NonPositive(&'static str),

    #[error(
        "center_to_front_ratio is {0}, the centre of mass must lie strictly \
         within the wheelbase"
    )]
    CentreOfMassOutsideWheelbase(f64),

    #[error(
        "The geometry is oversteering (positive slip factor), the curvature \
         factor would diverge at the critical speed"
    )]
    OversteeringGeometry,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Stateless curvature/steering-angle converter for one platform.
pub struct VehicleModel {
    geom: VehicleGeometry,

    /// Cached slip factor for the geometry.
    ///
    /// Units: seconds^2/meters^2
    slip_factor: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VehicleModel {
    /// Build the model from a validated geometry.
    pub fn new(geom: VehicleGeometry) -> Result<Self, GeometryError> {
        geom.validate()?;

        Ok(Self {
            slip_factor: slip_factor(&geom),
            geom,
        })
    }

    /// Convert a path curvature into a steering wheel angle.
    ///
    /// # Inputs
    /// - `curvature_inv_m`: desired path curvature, 1/meters
    /// - `speed_ms`: vehicle speed, floored to [`MIN_SPEED_MS`], meters/second
    /// - `roll_rad`: road roll angle, radians
    ///
    /// # Outputs
    /// - Steering wheel angle in degrees. Finite for any input given the
    ///   validated (non-oversteering) geometry and floored speed.
    pub fn angle_from_curvature(&self, curvature_inv_m: f64, speed_ms: f64, roll_rad: f64) -> f64 {
        let u = speed_ms.max(MIN_SPEED_MS);

        let road_wheel_angle_rad = (curvature_inv_m - self.roll_compensation(roll_rad, u))
            / self.curvature_factor(u);

        (road_wheel_angle_rad * self.geom.steer_ratio).to_degrees()
    }

    /// Convert a steering wheel angle into a path curvature.
    ///
    /// Inverse of [`VehicleModel::angle_from_curvature`].
    pub fn curvature_from_angle(&self, angle_deg: f64, speed_ms: f64, roll_rad: f64) -> f64 {
        let u = speed_ms.max(MIN_SPEED_MS);

        let road_wheel_angle_rad = angle_deg.to_radians() / self.geom.steer_ratio;

        road_wheel_angle_rad * self.curvature_factor(u) + self.roll_compensation(roll_rad, u)
    }

    /// Curvature produced per radian of road wheel angle at the given speed.
    ///
    /// The understeer correction: curvature response drops with the square
    /// of speed for a negative (understeering) slip factor.
    fn curvature_factor(&self, speed_ms: f64) -> f64 {
        1.0 / (1.0 - self.slip_factor * speed_ms.powi(2)) / self.geom.wheelbase_m
    }

    /// Curvature contribution of the road roll angle.
    fn roll_compensation(&self, roll_rad: f64, speed_ms: f64) -> f64 {
        if self.slip_factor.abs() < SLIP_FACTOR_NEUTRAL_LIMIT {
            0.0
        }
        else {
            (ACCEL_DUE_TO_GRAVITY_MS2 * roll_rad)
                / ((1.0 / self.slip_factor) - speed_ms.powi(2))
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Slip factor of a geometry.
///
/// A measure of how curvature response changes with speed: negative for an
/// understeering platform (the usual case), positive for oversteering.
pub fn slip_factor(geom: &VehicleGeometry) -> f64 {
    let a_f = geom.center_to_front_m();
    let a_r = geom.center_to_rear_m();
    let c_f = geom.tire_stiffness_front;
    let c_r = geom.tire_stiffness_rear;

    geom.mass_kg * (c_f * a_f - c_r * a_r)
        / (geom.wheelbase_m.powi(2) * c_f * c_r)
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    pub(crate) fn test_geometry() -> VehicleGeometry {
        VehicleGeometry {
            wheelbase_m: 3.0,
            steer_ratio: 14.26,
            center_to_front_ratio: 0.44,
            mass_kg: 2270.0,
            tire_stiffness_front: 192000.0,
            tire_stiffness_rear: 202500.0,
        }
    }

    #[test]
    fn test_straight_is_zero() {
        let vm = VehicleModel::new(test_geometry()).unwrap();
        assert_eq!(vm.angle_from_curvature(0.0, 20.0, 0.0), 0.0);
        assert_eq!(vm.curvature_from_angle(0.0, 20.0, 0.0), 0.0);
    }

    #[test]
    fn test_round_trip() {
        let vm = VehicleModel::new(test_geometry()).unwrap();

        for &speed in &[1.0, 5.0, 15.0, 35.0] {
            for &curv in &[-0.02, -0.001, 0.004, 0.03] {
                let angle = vm.angle_from_curvature(curv, speed, 0.0);
                let back = vm.curvature_from_angle(angle, speed, 0.0);
                assert!((back - curv).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_understeer_grows_with_speed() {
        // For the same curvature an understeering platform needs more angle
        // at higher speed
        let vm = VehicleModel::new(test_geometry()).unwrap();

        let low = vm.angle_from_curvature(0.01, 5.0, 0.0);
        let high = vm.angle_from_curvature(0.01, 30.0, 0.0);
        assert!(high > low);
    }

    #[test]
    fn test_roll_compensation() {
        let vm = VehicleModel::new(test_geometry()).unwrap();

        // Road roll shifts the angle needed for the same curvature, and the
        // inverse must account for it identically
        let flat = vm.angle_from_curvature(0.01, 20.0, 0.0);
        let banked = vm.angle_from_curvature(0.01, 20.0, 0.06);
        assert!(banked != flat);

        let back = vm.curvature_from_angle(banked, 20.0, 0.06);
        assert!((back - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_speed_floor_keeps_angle_finite() {
        let vm = VehicleModel::new(test_geometry()).unwrap();

        let angle = vm.angle_from_curvature(3.6, 0.0, 0.0);
        assert!(angle.is_finite());
    }

    #[test]
    fn test_oversteering_geometry_rejected() {
        let mut geom = test_geometry();
        geom.tire_stiffness_rear = 1000.0;

        assert!(matches!(
            VehicleModel::new(geom),
            Err(GeometryError::OversteeringGeometry)
        ));
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let mut geom = test_geometry();
        geom.wheelbase_m = 0.0;
        assert!(VehicleModel::new(geom).is_err());

        let mut geom = test_geometry();
        geom.center_to_front_ratio = 1.2;
        assert!(VehicleModel::new(geom).is_err());
    }
}
