//! Mathematical utilities for uavdy
//!
//! Implements the skew operator, quaternion attitude integration,
//! unit sphere (S²) kinematics for cable directions, the semi-implicit
//! integrator and polynomial root extraction.

pub mod rotation;
pub mod quaternion;
pub mod sphere;
pub mod integrator;
pub mod polynomial;

pub use rotation::*;
pub use quaternion::*;
pub use sphere::*;
pub use integrator::*;
pub use polynomial::*;
