//! Numerical integration
//!
//! Every model in the crate uses explicit fixed-step updates; stability is
//! governed by the caller's choice of dt.

use nalgebra::Vector3;

/// Semi-implicit Euler for second-order systems
///
/// Updates velocity first then uses the new velocity to update position.
///
/// # Returns
/// (new_position, new_velocity)
pub fn semi_implicit_euler(
    pos: &Vector3<f64>,
    vel: &Vector3<f64>,
    acc: &Vector3<f64>,
    dt: f64,
) -> (Vector3<f64>, Vector3<f64>) {
    let new_vel = vel + acc * dt;
    let new_pos = pos + new_vel * dt;
    (new_pos, new_vel)
}
