//! Motor allocation and calibration
//!
//! Maps a collective thrust and body torque onto four rotor forces for an
//! X-configuration quadrotor:
//!
//! ```text
//! f₁ = T/4 - τx/4a - τy/4a - τz/4c
//! f₂ = T/4 - τx/4a + τy/4a + τz/4c
//! f₃ = T/4 + τx/4a + τy/4a - τz/4c
//! f₄ = T/4 + τx/4a - τy/4a + τz/4c
//! ```
//!
//! where a = d·√2/2 is the effective arm and c the yaw drag coefficient.
//! Each force is clipped independently to the motor's thrust range, so the
//! achieved command may differ from the requested one.

use nalgebra::{Matrix4, Vector4};
use serde::{Deserialize, Serialize};

use super::{MotorNoise, QuadrotorInput};
use crate::error::DynamicsError;
use crate::math::polynomial::{degree, evaluate, smallest_nonnegative_root};
use crate::GRAVITY;

/// Convert a force in newtons to grams-force
pub fn newtons_to_grams(force: f64) -> f64 {
    force / GRAVITY * 1000.0
}

/// Convert grams-force to newtons
pub fn grams_to_newtons(grams: f64) -> f64 {
    grams * GRAVITY / 1000.0
}

/// Linear map between body commands and rotor forces
#[derive(Debug, Clone)]
pub struct MotorMixer {
    /// [T, τx, τy, τz] → [f₁..f₄]
    allocation: Matrix4<f64>,
    /// [f₁..f₄] → [T, τx, τy, τz]
    mixing: Matrix4<f64>,
    /// Per-motor thrust limit [g]
    max_thrust_grams: f64,
}

impl MotorMixer {
    /// Build the mixer for an X frame
    ///
    /// # Arguments
    /// * `arm_length` - Distance from CoM to rotor [m]
    /// * `yaw_drag_coefficient` - Ratio of rotor drag torque to thrust [m]
    /// * `max_thrust_grams` - Per-motor thrust limit [g]
    pub fn new(
        arm_length: f64,
        yaw_drag_coefficient: f64,
        max_thrust_grams: f64,
    ) -> Result<Self, DynamicsError> {
        let arm = std::f64::consts::FRAC_1_SQRT_2 * arm_length;
        let r = 0.25 / arm;
        let y = 0.25 / yaw_drag_coefficient;

        #[rustfmt::skip]
        let allocation = Matrix4::new(
            0.25, -r, -r, -y,
            0.25, -r,  r,  y,
            0.25,  r,  r, -y,
            0.25,  r, -r,  y,
        );
        let mixing = allocation
            .try_inverse()
            .ok_or(DynamicsError::SingularAllocation)?;

        Ok(Self {
            allocation,
            mixing,
            max_thrust_grams,
        })
    }

    /// Allocation matrix, command → forces
    pub fn allocation_matrix(&self) -> &Matrix4<f64> {
        &self.allocation
    }

    /// Mixing matrix, forces → command
    pub fn mixing_matrix(&self) -> &Matrix4<f64> {
        &self.mixing
    }

    /// Per-motor thrust limit [N]
    pub fn max_force(&self) -> f64 {
        grams_to_newtons(self.max_thrust_grams)
    }

    /// Unclipped rotor forces for a command
    pub fn forces(&self, input: &QuadrotorInput) -> Vector4<f64> {
        self.allocation * input.to_vector()
    }

    /// Command produced by a set of rotor forces
    pub fn command(&self, forces: &Vector4<f64>) -> QuadrotorInput {
        QuadrotorInput::from_vector(&(self.mixing * forces))
    }

    /// Clip each force to [0, max] in grams-force
    pub fn clip(&self, forces: &Vector4<f64>) -> Vector4<f64> {
        forces.map(|f| grams_to_newtons(newtons_to_grams(f).clamp(0.0, self.max_thrust_grams)))
    }

    /// Allocate a command to the motors
    ///
    /// Noise, when present, is added before clipping so the clipped forces
    /// always stay within the motor range.
    pub fn allocate(
        &self,
        input: &QuadrotorInput,
        noise: Option<&mut MotorNoise>,
    ) -> MotorAllocation {
        let mut requested = self.forces(input);
        if let Some(noise) = noise {
            requested += noise.sample();
        }

        let forces = self.clip(&requested);
        let saturated = requested
            .iter()
            .zip(forces.iter())
            .any(|(r, f)| (r - f).abs() > 1e-12);
        if saturated {
            log::trace!(
                "motor saturation: requested {:?}, clipped {:?}",
                requested.as_slice(),
                forces.as_slice()
            );
        }

        MotorAllocation {
            forces,
            achieved: self.command(&forces),
            saturated,
        }
    }
}

/// Result of a motor allocation
#[derive(Debug, Clone)]
pub struct MotorAllocation {
    /// Clipped per-motor forces [N]
    pub forces: Vector4<f64>,
    /// Command actually produced by the clipped forces
    pub achieved: QuadrotorInput,
    /// Whether any motor hit a limit
    pub saturated: bool,
}

/// Motor calibration curves
///
/// The force produced by a motor is a polynomial of its PWM command,
/// f(cmd) = c₀ + c₁·cmd + c₂·cmd² (+ c₃·cmd³), and rotor speed is affine in
/// the command: ω = gain·cmd + offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorCalibration {
    /// Force polynomial coefficients, ascending order [N]
    pub force_coefficients: Vec<f64>,
    /// Rotor speed per command unit [rad/s]
    pub speed_gain: f64,
    /// Rotor speed at zero command [rad/s]
    pub speed_offset: f64,
}

impl Default for MotorCalibration {
    fn default() -> Self {
        Self {
            force_coefficients: vec![5.484560e-4, 1.032633e-6, 2.130295e-11],
            speed_gain: 0.04076521,
            speed_offset: 380.8359,
        }
    }
}

impl MotorCalibration {
    /// Check that the force polynomial can be inverted
    pub fn validate(&self) -> Result<(), DynamicsError> {
        let degree = degree(&self.force_coefficients);
        if (1..=3).contains(&degree) {
            Ok(())
        } else {
            Err(DynamicsError::InvalidCalibration { degree })
        }
    }

    /// Force produced at a given command [N]
    pub fn force(&self, command: f64) -> f64 {
        evaluate(&self.force_coefficients, command)
    }

    /// Smallest nonnegative command producing `force`
    pub fn command(&self, motor: usize, force: f64) -> Result<f64, DynamicsError> {
        smallest_nonnegative_root(&self.force_coefficients, force)
            .ok_or(DynamicsError::NoMotorCommandRoot { motor, force })
    }

    /// Rotor speed for a command [rad/s]
    pub fn speed(&self, command: f64) -> f64 {
        self.speed_gain * command + self.speed_offset
    }

    /// Rotor speeds for four motor forces [rad/s]
    pub fn speeds(&self, forces: &Vector4<f64>) -> Result<Vector4<f64>, DynamicsError> {
        let mut speeds = Vector4::zeros();
        for (motor, force) in forces.iter().enumerate() {
            speeds[motor] = self.speed(self.command(motor, *force)?);
        }
        Ok(speeds)
    }
}
