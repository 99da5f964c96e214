//! Dynamic models
//!
//! - Motor allocation and calibration
//! - Rotor drag and actuator noise
//! - Single quadrotor
//! - Quadrotor towing a point-mass payload on one cable
//! - Payload shared by several quadrotors on rigid cables

pub mod motor;
pub mod drag;
pub mod noise;
pub mod quadrotor;
pub mod tethered;
pub mod shared;

pub use motor::*;
pub use drag::*;
pub use noise::*;
pub use quadrotor::*;
pub use tethered::*;
pub use shared::*;
