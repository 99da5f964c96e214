//! Quaternion operations for attitude representation
//!
//! Attitudes are advanced with the exponential map
//! q⁺ = q ⊗ exp([0; ω·dt/2]), which keeps the quaternion on the unit sphere
//! without renormalization. Flat state vectors store quaternions
//! scalar-first: [w, x, y, z].

use nalgebra::{Quaternion, UnitQuaternion, Vector3, Vector4};

/// Advance an attitude by one step of body angular velocity
///
/// # Arguments
/// * `q` - Current orientation (body to world)
/// * `omega` - Angular velocity in body frame [rad/s]
/// * `dt` - Time step [s]
pub fn integrate_exp_map(
    q: &UnitQuaternion<f64>,
    omega: &Vector3<f64>,
    dt: f64,
) -> UnitQuaternion<f64> {
    let delta = Quaternion::from_imag(omega * (0.5 * dt)).exp();
    UnitQuaternion::new_unchecked(q.quaternion() * delta)
}

/// Attitude from roll, pitch and yaw given in degrees
///
/// Extrinsic x-y-z rotation, i.e. R = Rz(yaw) Ry(pitch) Rx(roll).
pub fn quaternion_from_euler_degrees(roll: f64, pitch: f64, yaw: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(roll.to_radians(), pitch.to_radians(), yaw.to_radians())
}

/// Quaternion as scalar-first components [w, x, y, z]
pub fn to_scalar_first(q: &UnitQuaternion<f64>) -> Vector4<f64> {
    Vector4::new(q.w, q.i, q.j, q.k)
}

/// Quaternion from scalar-first components [w, x, y, z]
///
/// The components are normalized.
pub fn from_scalar_first(wxyz: &[f64]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(wxyz[0], wxyz[1], wxyz[2], wxyz[3]))
}
