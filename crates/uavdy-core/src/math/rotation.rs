//! SO(3) rotation utilities
//!
//! Provides the skew operator and the rotation matrix helpers used when
//! assembling the generalized dynamics.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

/// Skew-symmetric matrix from vector (hat operator)
///
/// For v = [x, y, z]^T:
/// ```text
/// [v]× = [ 0  -z   y]
///        [ z   0  -x]
///        [-y   x   0]
/// ```
///
/// Satisfies `skew(a) * b == a.cross(&b)`.
#[rustfmt::skip]
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0, -v.z, v.y,
        v.z, 0.0, -v.x,
        -v.y, v.x, 0.0,
    )
}

/// Rotation matrix from quaternion
///
/// Extracts R(q) ∈ SO(3), mapping body-frame vectors into the world frame
pub fn rotation_matrix(q: &UnitQuaternion<f64>) -> Matrix3<f64> {
    *q.to_rotation_matrix().matrix()
}

/// Body z-axis in world frame (thrust direction for quadrotor)
///
/// z_body = R(q) * [0, 0, 1]^T
pub fn body_z_axis(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    q.transform_vector(&Vector3::z())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_skew_matches_cross_product() {
        let a = Vector3::new(0.3, -1.2, 2.5);
        let b = Vector3::new(-0.7, 0.4, 1.1);

        assert_relative_eq!(skew(&a) * b, a.cross(&b), epsilon = 1e-12);
    }

    #[test]
    fn test_skew_is_antisymmetric() {
        let s = skew(&Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(s + s.transpose(), Matrix3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_skew_squared() {
        // [v]×² = v vᵀ - |v|² I
        let v = Vector3::new(0.2, -0.1, 0.4);
        let expected = v * v.transpose() - Matrix3::identity() * v.norm_squared();
        assert_relative_eq!(skew(&v) * skew(&v), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_body_z_axis_rotated() {
        // 90° about y: body z becomes world x
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);
        assert_relative_eq!(body_z_axis(&q), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(
            rotation_matrix(&q) * Vector3::z(),
            Vector3::new(1.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }
}
