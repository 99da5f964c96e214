//! Unit sphere S² operations
//!
//! Cable directions qᵢ ∈ S² point from a quadrotor towards the payload.
//! They evolve as q̇ᵢ = ωᵢ × qᵢ and are advanced with a first-order update,
//! which keeps ‖qᵢ‖ = 1 only to first order in dt.

use nalgebra::Vector3;

use super::quaternion_from_euler_degrees;

/// Normalize a vector to unit length
///
/// Returns None if the vector is too small to normalize safely.
pub fn normalize(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let norm = v.norm();
    if norm < 1e-10 {
        None
    } else {
        Some(v / norm)
    }
}

/// Cable direction derivative from angular velocity
///
/// q̇ = ω × q
pub fn direction_derivative(q: &Vector3<f64>, omega: &Vector3<f64>) -> Vector3<f64> {
    omega.cross(q)
}

/// First-order cable direction update
///
/// q⁺ = q + dt·(ω × q), not projected back onto the sphere
pub fn integrate_direction(q: &Vector3<f64>, omega: &Vector3<f64>, dt: f64) -> Vector3<f64> {
    q + direction_derivative(q, omega) * dt
}

/// Cable direction obtained by tilting the downward vertical
///
/// q = R(roll, pitch, yaw)·[0, 0, -1]ᵀ with angles in degrees
pub fn cable_direction_from_euler_degrees(roll: f64, pitch: f64, yaw: f64) -> Vector3<f64> {
    quaternion_from_euler_degrees(roll, pitch, yaw) * Vector3::new(0.0, 0.0, -1.0)
}

/// Check if a vector is a valid unit vector
pub fn is_unit_vector(v: &Vector3<f64>, tolerance: f64) -> bool {
    (v.norm() - 1.0).abs() < tolerance
}
