//! Aerodynamic drag
//!
//! Rotor-induced linear drag: the body-frame velocity is scaled by the sum
//! of rotor speeds and a diagonal coefficient matrix, then rotated back to
//! the world frame.
//!
//! f_a = R · (Σωⱼ · K · Rᵀv)

use nalgebra::{Matrix3, UnitQuaternion, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// Drag model selected when a vehicle is built
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum DragModel {
    /// No aerodynamic drag
    #[default]
    Disabled,
    /// Drag proportional to the summed rotor speed
    RotorSpeed {
        /// Diagonal of K [N·s²/(m·rad)]
        coefficients: Vector3<f64>,
    },
}

impl DragModel {
    /// Identified coefficients for a Crazyflie-class vehicle
    pub fn rotor_speed() -> Self {
        Self::RotorSpeed {
            coefficients: Vector3::new(-9.1785e-7, -9.1785e-7, -10.311e-7),
        }
    }

    /// Whether rotor speeds are needed to evaluate this model
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Drag force in the world frame [N]
    ///
    /// # Arguments
    /// * `rotor_speeds` - Rotor angular speeds [rad/s]
    /// * `orientation` - Vehicle attitude (body to world)
    /// * `velocity` - Vehicle velocity in the world frame [m/s]
    pub fn force(
        &self,
        rotor_speeds: &Vector4<f64>,
        orientation: &UnitQuaternion<f64>,
        velocity: &Vector3<f64>,
    ) -> Vector3<f64> {
        match self {
            Self::Disabled => Vector3::zeros(),
            Self::RotorSpeed { coefficients } => {
                let k = Matrix3::from_diagonal(coefficients);
                let body_velocity = orientation.inverse_transform_vector(velocity);
                orientation.transform_vector(&(k * body_velocity * rotor_speeds.sum()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_disabled_has_no_force() {
        let f = DragModel::Disabled.force(
            &Vector4::repeat(2000.0),
            &UnitQuaternion::identity(),
            &Vector3::new(1.0, 2.0, 3.0),
        );
        assert_eq!(f, Vector3::zeros());
    }

    #[test]
    fn test_drag_opposes_motion() {
        let model = DragModel::rotor_speed();
        let velocity = Vector3::new(1.0, -0.5, 0.2);
        let f = model.force(&Vector4::repeat(2000.0), &UnitQuaternion::identity(), &velocity);

        assert!(f.dot(&velocity) < 0.0);
        assert_relative_eq!(f.x, -9.1785e-7 * 8000.0, epsilon = 1e-12);
    }

    #[test]
    fn test_drag_is_rotated_to_world() {
        // Yawed 90°: world x motion is body -y motion, still opposed in world x
        let model = DragModel::rotor_speed();
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let f = model.force(&Vector4::repeat(1000.0), &q, &Vector3::new(1.0, 0.0, 0.0));

        assert_relative_eq!(f, Vector3::new(-9.1785e-7 * 4000.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_velocity_has_no_drag() {
        let f = DragModel::rotor_speed().force(
            &Vector4::repeat(2000.0),
            &UnitQuaternion::identity(),
            &Vector3::zeros(),
        );
        assert_relative_eq!(f, Vector3::zeros(), epsilon = 1e-15);
    }
}
