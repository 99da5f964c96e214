//! Quadrotor dynamics
//!
//! Rigid-body model of a single quadrotor:
//!
//! ṗ = v
//! m v̇ = m g + R(q)·[0, 0, T]ᵀ + f_a
//! q̇ = 1/2 q ⊗ [0; ω]
//! J ω̇ = τ - ω × Jω
//!
//! where:
//! - p, v: position and velocity (world frame, z up)
//! - q: orientation (body to world)
//! - ω: angular velocity (body frame)
//! - T, τ: collective thrust and body torque achieved by the motors
//! - f_a: optional aerodynamic drag
//!
//! Translation uses semi-implicit Euler. Attitude uses the exponential map
//! with the angular velocity at the start of the step.

use nalgebra::{Matrix3, SVector, UnitQuaternion, Vector3, Vector4};
use serde::{Deserialize, Serialize};

use super::{DragModel, MotorAllocation, MotorCalibration, MotorMixer, MotorNoise};
use crate::error::{ensure_positive, first_non_finite, DynamicsError};
use crate::math::{
    body_z_axis, from_scalar_first, integrate_exp_map, semi_implicit_euler, skew, to_scalar_first,
};
use crate::simulation::{QuadrotorConfig, QuadrotorHistory};
use crate::GRAVITY;

/// Length of the flat quadrotor state
pub const QUADROTOR_STATE_SIZE: usize = 13;

/// Quadrotor state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrotorState {
    /// Position [m] (world frame)
    pub position: Vector3<f64>,
    /// Velocity [m/s] (world frame)
    pub velocity: Vector3<f64>,
    /// Orientation (body to world)
    pub orientation: UnitQuaternion<f64>,
    /// Angular velocity [rad/s] (body frame)
    pub angular_velocity: Vector3<f64>,
}

impl Default for QuadrotorState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
        }
    }
}

impl QuadrotorState {
    /// Flat layout [x, y, z, vx, vy, vz, qw, qx, qy, qz, ωx, ωy, ωz]
    pub fn to_vector(&self) -> SVector<f64, QUADROTOR_STATE_SIZE> {
        let q = to_scalar_first(&self.orientation);
        SVector::from_iterator(
            self.position
                .iter()
                .chain(self.velocity.iter())
                .chain(q.iter())
                .chain(self.angular_velocity.iter())
                .copied(),
        )
    }

    /// Inverse of [`QuadrotorState::to_vector`]
    pub fn from_vector(x: &SVector<f64, QUADROTOR_STATE_SIZE>) -> Self {
        Self {
            position: x.fixed_rows::<3>(0).into_owned(),
            velocity: x.fixed_rows::<3>(3).into_owned(),
            orientation: from_scalar_first(&x.as_slice()[6..10]),
            angular_velocity: x.fixed_rows::<3>(10).into_owned(),
        }
    }

    /// Thrust direction in world frame (body z-axis)
    pub fn thrust_direction(&self) -> Vector3<f64> {
        body_z_axis(&self.orientation)
    }
}

/// Quadrotor physical parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadrotorParams {
    /// Mass [kg]
    pub mass: f64,
    /// Inertia tensor [kg·m²] (body frame)
    pub inertia: Matrix3<f64>,
    /// Inverse inertia tensor
    pub inertia_inv: Matrix3<f64>,
    /// Arm length [m] (distance from CoM to rotor)
    pub arm_length: f64,
    /// Yaw drag coefficient [m]
    pub yaw_drag_coefficient: f64,
    /// Maximum thrust per motor [g]
    pub max_thrust_grams: f64,
}

impl QuadrotorParams {
    /// Create parameters with diagonal inertia
    ///
    /// Fails if any scalar is non-positive or the inertia is not positive definite.
    pub fn new(
        mass: f64,
        inertia_diag: Vector3<f64>,
        arm_length: f64,
        yaw_drag_coefficient: f64,
        max_thrust_grams: f64,
    ) -> Result<Self, DynamicsError> {
        ensure_positive("mass", mass)?;
        ensure_positive("arm_length", arm_length)?;
        ensure_positive("yaw_drag_coefficient", yaw_drag_coefficient)?;
        ensure_positive("max_thrust_grams", max_thrust_grams)?;
        if !inertia_diag.iter().all(|j| j.is_finite() && *j > 0.0) {
            return Err(DynamicsError::InertiaNotPositiveDefinite {
                entity: "quadrotor".into(),
            });
        }

        Ok(Self {
            mass,
            inertia: Matrix3::from_diagonal(&inertia_diag),
            inertia_inv: Matrix3::from_diagonal(&inertia_diag.map(|j| 1.0 / j)),
            arm_length,
            yaw_drag_coefficient,
            max_thrust_grams,
        })
    }

    /// Hover thrust for this quadrotor
    pub fn hover_thrust(&self) -> f64 {
        self.mass * GRAVITY
    }
}

/// Quadrotor control input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuadrotorInput {
    /// Total thrust [N]
    pub thrust: f64,
    /// Body torque [N·m]
    pub torque: Vector3<f64>,
}

impl QuadrotorInput {
    pub fn new(thrust: f64, torque: Vector3<f64>) -> Self {
        Self { thrust, torque }
    }

    /// Thrust equal to the weight of `mass`, no torque
    pub fn hover(mass: f64) -> Self {
        Self::new(mass * GRAVITY, Vector3::zeros())
    }

    /// Flat layout [T, τx, τy, τz]
    pub fn to_vector(&self) -> Vector4<f64> {
        Vector4::new(self.thrust, self.torque.x, self.torque.y, self.torque.z)
    }

    pub fn from_vector(command: &Vector4<f64>) -> Self {
        Self::new(command[0], Vector3::new(command[1], command[2], command[3]))
    }
}

/// Single quadrotor model
///
/// Owns the vehicle state and advances it one fixed step at a time.
#[derive(Debug, Clone)]
pub struct Quadrotor {
    pub params: QuadrotorParams,
    mixer: MotorMixer,
    calibration: MotorCalibration,
    drag: DragModel,
    noise: Option<MotorNoise>,
    state: QuadrotorState,
    dt: f64,
    history: QuadrotorHistory,
}

impl Quadrotor {
    /// Build a quadrotor from configuration
    ///
    /// # Errors
    /// Returns a configuration error for non-positive parameters, a
    /// non-positive-definite inertia, an invalid calibration or noise model.
    pub fn new(config: &QuadrotorConfig, dt: f64) -> Result<Self, DynamicsError> {
        ensure_positive("dt", dt)?;
        let params = config.to_params()?;
        let mixer = MotorMixer::new(
            params.arm_length,
            params.yaw_drag_coefficient,
            params.max_thrust_grams,
        )?;
        config.calibration.validate()?;
        let noise = config.noise.as_ref().map(MotorNoise::new).transpose()?;

        log::debug!(
            "quadrotor: m = {} kg, J = {:?}, drag = {:?}",
            params.mass,
            config.inertia.as_slice(),
            config.drag
        );

        Ok(Self {
            params,
            mixer,
            calibration: config.calibration.clone(),
            drag: config.drag.clone(),
            noise,
            state: config.initial.to_state(),
            dt,
            history: QuadrotorHistory::default(),
        })
    }

    /// Current state
    pub fn state(&self) -> &QuadrotorState {
        &self.state
    }

    /// Current state as the flat 13-element vector
    pub fn state_vector(&self) -> SVector<f64, QUADROTOR_STATE_SIZE> {
        self.state.to_vector()
    }

    /// Integration time step [s]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn mixer(&self) -> &MotorMixer {
        &self.mixer
    }

    pub fn drag_model(&self) -> &DragModel {
        &self.drag
    }

    /// Recorded trajectory
    pub fn history(&self) -> &QuadrotorHistory {
        &self.history
    }

    /// Append a reference row supplied by the caller
    pub fn record_reference(&mut self, reference: &[f64]) {
        self.history.record_reference(reference);
    }

    /// Map a command to clipped motor forces and the achievable command
    pub fn compute_motors(&mut self, input: &QuadrotorInput) -> MotorAllocation {
        self.mixer.allocate(input, self.noise.as_mut())
    }

    /// Rotor speeds producing the given motor forces [rad/s]
    pub fn motor_speeds(&self, forces: &Vector4<f64>) -> Result<Vector4<f64>, DynamicsError> {
        self.calibration.speeds(forces)
    }

    /// Aerodynamic drag at the current state for the given rotor speeds [N]
    pub fn aero_drag(&self, rotor_speeds: &Vector4<f64>) -> Vector3<f64> {
        self.drag
            .force(rotor_speeds, &self.state.orientation, &self.state.velocity)
    }

    /// Angular acceleration for a body torque at the current rate
    ///
    /// ω̇ = J⁻¹(τ - ω × Jω)
    pub fn angular_acceleration(&self, torque: &Vector3<f64>) -> Vector3<f64> {
        let omega = &self.state.angular_velocity;
        self.params.inertia_inv * (torque - skew(omega) * self.params.inertia * omega)
    }

    /// Advance only attitude and angular velocity under a body torque
    ///
    /// Returns the angular acceleration that was applied.
    pub fn advance_rotation(&mut self, torque: &Vector3<f64>) -> Vector3<f64> {
        let omega_dot = self.angular_acceleration(torque);
        let omega = self.state.angular_velocity;

        self.state.angular_velocity = omega + omega_dot * self.dt;
        self.state.orientation = integrate_exp_map(&self.state.orientation, &omega, self.dt);
        omega_dot
    }

    /// Advance the full state by one step
    ///
    /// # Errors
    /// Fails if rotor speeds cannot be computed for the drag model or the
    /// resulting state is not finite.
    pub fn advance(
        &mut self,
        input: &QuadrotorInput,
    ) -> Result<SVector<f64, QUADROTOR_STATE_SIZE>, DynamicsError> {
        let allocation = self.compute_motors(input);

        let drag = if self.drag.is_enabled() {
            let speeds = self.motor_speeds(&allocation.forces)?;
            self.aero_drag(&speeds)
        } else {
            Vector3::zeros()
        };

        let thrust = self.state.thrust_direction() * allocation.achieved.thrust;
        let acceleration = Vector3::new(0.0, 0.0, -GRAVITY) + (thrust + drag) / self.params.mass;
        let (position, velocity) =
            semi_implicit_euler(&self.state.position, &self.state.velocity, &acceleration, self.dt);
        self.state.position = position;
        self.state.velocity = velocity;

        let omega_dot = self.advance_rotation(&allocation.achieved.torque);

        let state = self.state.to_vector();
        if let Some(slot) = first_non_finite(state.iter()) {
            log::warn!("quadrotor state diverged at slot {}", slot);
            return Err(DynamicsError::NonFiniteState { slot });
        }

        self.history.record(&state, &omega_dot, input, &allocation.forces);
        Ok(state)
    }
}
