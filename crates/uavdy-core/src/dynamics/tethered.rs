//! Single-cable payload
//!
//! One quadrotor carrying a point-mass payload on a rigid cable of length l.
//! The cable direction p points from the quadrotor to the payload, so the
//! quadrotor sits at x_L - l·p.
//!
//! (m_Q + m_L) v̇_L = (m_Q + m_L) g + (p·f - m_Q l ‖ṗ‖²) p
//! m_Q l ω̇_L = -p × f
//! ṗ = ω_L × p
//!
//! where f = R(q)·[0, 0, T]ᵀ is the thrust of the quadrotor in the world
//! frame. Only the quadrotor's attitude and body rate are integrated by the
//! quadrotor model itself.

use nalgebra::{DVector, SVector, Vector3};
use serde::{Deserialize, Serialize};

use super::{Quadrotor, QuadrotorInput};
use crate::error::{ensure_positive, first_non_finite, DynamicsError};
use crate::math::{
    direction_derivative, integrate_direction, normalize, semi_implicit_euler, to_scalar_first,
};
use crate::simulation::{PayloadHistory, TetheredPayloadConfig};
use crate::gravity_enu;

/// Length of the flat tethered state
pub const TETHERED_STATE_SIZE: usize = 19;

/// Payload and cable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TetheredState {
    /// Payload position [m]
    pub payload_position: Vector3<f64>,
    /// Payload velocity [m/s]
    pub payload_velocity: Vector3<f64>,
    /// Unit cable direction from quadrotor to payload
    pub cable_direction: Vector3<f64>,
    /// Cable angular velocity [rad/s] (world frame)
    pub cable_angular_velocity: Vector3<f64>,
}

/// Quadrotor with a payload hanging from a single cable
#[derive(Debug, Clone)]
pub struct TetheredPayload {
    /// Payload mass [kg]
    pub payload_mass: f64,
    /// Cable length [m]
    pub cable_length: f64,
    quadrotor: Quadrotor,
    state: TetheredState,
    dt: f64,
    history: PayloadHistory<QuadrotorInput>,
}

impl TetheredPayload {
    pub fn new(config: &TetheredPayloadConfig) -> Result<Self, DynamicsError> {
        ensure_positive("dt", config.dt)?;
        ensure_positive("payload_mass", config.payload_mass)?;
        ensure_positive("cable_length", config.cable_length)?;
        let quadrotor = Quadrotor::new(&config.quadrotor, config.dt)?;

        let initial = &config.initial;
        let cable_direction = normalize(&initial.cable_direction)
            .ok_or(DynamicsError::InvalidCableDirection { agent: 0 })?;

        Ok(Self {
            payload_mass: config.payload_mass,
            cable_length: config.cable_length,
            quadrotor,
            state: TetheredState {
                payload_position: initial.payload_position,
                payload_velocity: initial.payload_velocity,
                cable_direction,
                cable_angular_velocity: initial.cable_angular_velocity,
            },
            dt: config.dt,
            history: PayloadHistory::default(),
        })
    }

    pub fn state(&self) -> &TetheredState {
        &self.state
    }

    pub fn quadrotor(&self) -> &Quadrotor {
        &self.quadrotor
    }

    pub fn history(&self) -> &PayloadHistory<QuadrotorInput> {
        &self.history
    }

    /// Quadrotor plus payload mass [kg]
    pub fn total_mass(&self) -> f64 {
        self.quadrotor.params.mass + self.payload_mass
    }

    /// Flat layout [x_L, v_L, p, ω_L, q_Q (w first), ω_Q]
    pub fn state_vector(&self) -> SVector<f64, TETHERED_STATE_SIZE> {
        let quad = self.quadrotor.state();
        let q = to_scalar_first(&quad.orientation);
        SVector::from_iterator(
            self.state
                .payload_position
                .iter()
                .chain(self.state.payload_velocity.iter())
                .chain(self.state.cable_direction.iter())
                .chain(self.state.cable_angular_velocity.iter())
                .chain(q.iter())
                .chain(quad.angular_velocity.iter())
                .copied(),
        )
    }

    /// Quadrotor position implied by the cable [m]
    pub fn quadrotor_position(&self) -> Vector3<f64> {
        self.state.payload_position - self.cable_length * self.state.cable_direction
    }

    /// Quadrotor velocity implied by the cable [m/s]
    pub fn quadrotor_velocity(&self) -> Vector3<f64> {
        let p_dot = direction_derivative(
            &self.state.cable_direction,
            &self.state.cable_angular_velocity,
        );
        self.state.payload_velocity - self.cable_length * p_dot
    }

    /// Payload acceleration and cable angular acceleration for a world-frame thrust
    pub fn accelerations(&self, thrust: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
        let m_q = self.quadrotor.params.mass;
        let l = self.cable_length;
        let p = &self.state.cable_direction;
        let p_dot = direction_derivative(p, &self.state.cable_angular_velocity);

        let tension_term = p.dot(thrust) - m_q * l * p_dot.norm_squared();
        let payload_acceleration = gravity_enu() + p * (tension_term / self.total_mass());
        let cable_acceleration = -p.cross(thrust) / (m_q * l);

        (payload_acceleration, cable_acceleration)
    }

    /// Advance by one step under a quadrotor command
    ///
    /// The achieved (post-allocation) thrust and torque drive the dynamics.
    pub fn step(
        &mut self,
        input: &QuadrotorInput,
    ) -> Result<SVector<f64, TETHERED_STATE_SIZE>, DynamicsError> {
        let allocation = self.quadrotor.compute_motors(input);
        let thrust = self.quadrotor.state().thrust_direction() * allocation.achieved.thrust;
        let (acceleration, cable_acceleration) = self.accelerations(&thrust);

        let (position, velocity) = semi_implicit_euler(
            &self.state.payload_position,
            &self.state.payload_velocity,
            &acceleration,
            self.dt,
        );
        let omega = self.state.cable_angular_velocity;
        self.state.payload_position = position;
        self.state.payload_velocity = velocity;
        self.state.cable_direction =
            integrate_direction(&self.state.cable_direction, &omega, self.dt);
        self.state.cable_angular_velocity = omega + cable_acceleration * self.dt;

        self.quadrotor.advance_rotation(&allocation.achieved.torque);

        let state = self.state_vector();
        if let Some(slot) = first_non_finite(state.iter()) {
            log::warn!("tethered payload state diverged at slot {}", slot);
            return Err(DynamicsError::NonFiniteState { slot });
        }

        self.history.record(DVector::from_column_slice(state.as_slice()), input.clone());
        Ok(state)
    }
}
