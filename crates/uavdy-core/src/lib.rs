//! # uavdy Core
//!
//! Rigid-body dynamics for quadrotors, alone or cooperatively carrying a
//! payload suspended on rigid cables.
//!
//! The crate advances physical state one fixed timestep at a time given
//! externally computed control commands. Controllers, trajectory generation
//! and visualization live outside of it.
//!
//! ## Modules
//!
//! - [`math`]: Mathematical utilities (skew operator, quaternions, S², integrators)
//! - [`dynamics`]: Dynamic models (motors, quadrotor, tethered payload, shared payload)
//! - [`simulation`]: Configuration and trajectory history
//! - [`error`]: Error type shared by every model

pub mod math;
pub mod dynamics;
pub mod simulation;
pub mod error;

pub use error::DynamicsError;

use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// Gravity constant [m/s²]
pub const GRAVITY: f64 = 9.81;

/// Gravity vector in ENU convention: z-up
pub fn gravity_enu() -> Vec3 {
    Vec3::new(0.0, 0.0, -GRAVITY)
}
