//! Simulation configuration
//!
//! Defines configuration structures for every model. Defaults describe a
//! Crazyflie-class vehicle stepped at 1 kHz.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dynamics::{
    DragModel, MotorCalibration, MotorNoiseConfig, QuadrotorParams, QuadrotorState,
};
use crate::math::quaternion_from_euler_degrees;
use crate::DynamicsError;

/// Default integration step [s]
pub const DEFAULT_DT: f64 = 1e-3;

/// Quadrotor physical parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadrotorConfig {
    /// Mass [kg]
    pub mass: f64,
    /// Inertia diagonal [kg·m²]
    pub inertia: Vector3<f64>,
    /// Arm length [m]
    pub arm_length: f64,
    /// Yaw drag coefficient [m]
    pub yaw_drag_coefficient: f64,
    /// Maximum thrust per motor [g]
    pub max_thrust_grams: f64,
    /// Motor force and speed calibration
    pub calibration: MotorCalibration,
    /// Aerodynamic drag model
    pub drag: DragModel,
    /// Optional motor force noise
    pub noise: Option<MotorNoiseConfig>,
    /// Initial state
    pub initial: QuadrotorInitialState,
}

impl Default for QuadrotorConfig {
    fn default() -> Self {
        Self {
            mass: 0.034,
            inertia: Vector3::new(16.571710e-6, 16.655602e-6, 29.261652e-6),
            arm_length: 0.046,
            yaw_drag_coefficient: 0.006,
            max_thrust_grams: 12.0,
            calibration: MotorCalibration::default(),
            drag: DragModel::Disabled,
            noise: None,
            initial: QuadrotorInitialState::default(),
        }
    }
}

impl QuadrotorConfig {
    pub fn to_params(&self) -> Result<QuadrotorParams, DynamicsError> {
        QuadrotorParams::new(
            self.mass,
            self.inertia,
            self.arm_length,
            self.yaw_drag_coefficient,
            self.max_thrust_grams,
        )
    }
}

/// Initial quadrotor state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadrotorInitialState {
    /// Position [m]
    pub position: Vector3<f64>,
    /// Velocity [m/s]
    pub velocity: Vector3<f64>,
    /// Roll, pitch, yaw [deg]
    pub attitude_degrees: Vector3<f64>,
    /// Body angular velocity [rad/s]
    pub angular_velocity: Vector3<f64>,
}

impl Default for QuadrotorInitialState {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.7),
            velocity: Vector3::zeros(),
            attitude_degrees: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
        }
    }
}

impl QuadrotorInitialState {
    pub fn to_state(&self) -> QuadrotorState {
        let a = &self.attitude_degrees;
        QuadrotorState {
            position: self.position,
            velocity: self.velocity,
            orientation: quaternion_from_euler_degrees(a.x, a.y, a.z),
            angular_velocity: self.angular_velocity,
        }
    }
}

/// One quadrotor carrying a point-mass payload on a single cable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TetheredPayloadConfig {
    /// Simulation time step [s]
    pub dt: f64,
    /// Payload mass [kg]
    pub payload_mass: f64,
    /// Cable length [m]
    pub cable_length: f64,
    /// Carrying quadrotor
    pub quadrotor: QuadrotorConfig,
    /// Initial payload and cable state
    pub initial: TetheredInitialState,
}

impl Default for TetheredPayloadConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            payload_mass: 0.005,
            cable_length: 0.5,
            quadrotor: QuadrotorConfig::default(),
            initial: TetheredInitialState::default(),
        }
    }
}

/// Initial payload and cable state of the tethered model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TetheredInitialState {
    /// Payload position [m]
    pub payload_position: Vector3<f64>,
    /// Payload velocity [m/s]
    pub payload_velocity: Vector3<f64>,
    /// Cable direction from quadrotor to payload (normalized on load)
    pub cable_direction: Vector3<f64>,
    /// Cable angular velocity [rad/s]
    pub cable_angular_velocity: Vector3<f64>,
}

impl Default for TetheredInitialState {
    fn default() -> Self {
        Self {
            payload_position: Vector3::new(0.0, 0.0, 0.2),
            payload_velocity: Vector3::zeros(),
            cable_direction: Vector3::new(0.0, 0.0, -1.0),
            cable_angular_velocity: Vector3::zeros(),
        }
    }
}

/// Shared payload physical parameters and initial state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadConfig {
    /// Mass [kg]
    pub mass: f64,
    /// Inertia diagonal [kg·m²]; all zero for a point mass
    pub inertia: Vector3<f64>,
    /// Initial position [m]
    pub initial_position: Vector3<f64>,
    /// Initial velocity [m/s]
    pub initial_velocity: Vector3<f64>,
    /// Initial roll, pitch, yaw [deg]
    pub initial_attitude_degrees: Vector3<f64>,
    /// Initial body angular velocity [rad/s]
    pub initial_angular_velocity: Vector3<f64>,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            mass: 0.01,
            inertia: Vector3::new(3.0e-5, 3.0e-5, 5.0e-5),
            initial_position: Vector3::zeros(),
            initial_velocity: Vector3::zeros(),
            initial_attitude_degrees: Vector3::zeros(),
            initial_angular_velocity: Vector3::zeros(),
        }
    }
}

/// A quadrotor linked to the shared payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Quadrotor parameters; its mass is the link mass
    pub quadrotor: QuadrotorConfig,
    /// Cable length [m]
    pub cable_length: f64,
    /// Cable attachment point in the payload body frame [m]
    pub attachment: Vector3<f64>,
    /// Initial cable direction from quadrotor to payload (normalized on load)
    pub initial_cable_direction: Vector3<f64>,
    /// Initial cable angular velocity [rad/s]
    pub initial_cable_angular_velocity: Vector3<f64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            quadrotor: QuadrotorConfig::default(),
            cable_length: 0.5,
            attachment: Vector3::zeros(),
            initial_cable_direction: Vector3::new(0.0, 0.0, -1.0),
            initial_cable_angular_velocity: Vector3::zeros(),
        }
    }
}

/// Several quadrotors sharing one payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedPayloadConfig {
    /// Simulation time step [s]
    pub dt: f64,
    /// Payload parameters
    pub payload: PayloadConfig,
    /// Linked quadrotors
    pub agents: Vec<AgentConfig>,
    /// Project cable directions back onto the unit sphere after each step
    pub renormalize_cables: bool,
}

impl Default for SharedPayloadConfig {
    fn default() -> Self {
        Self::symmetric(3, 0.05)
    }
}

impl SharedPayloadConfig {
    /// Agents evenly spaced on a circle of `radius` in the payload xy-plane,
    /// all cables hanging vertically
    pub fn symmetric(num_agents: usize, radius: f64) -> Self {
        let agents = (0..num_agents)
            .map(|i| {
                let angle = 2.0 * std::f64::consts::PI * i as f64 / num_agents as f64;
                AgentConfig {
                    attachment: Vector3::new(radius * angle.cos(), radius * angle.sin(), 0.0),
                    ..AgentConfig::default()
                }
            })
            .collect();

        Self {
            dt: DEFAULT_DT,
            payload: PayloadConfig::default(),
            agents,
            renormalize_cables: false,
        }
    }

    /// Point-mass payload: no inertia and every cable attached at the centre
    pub fn point_mass(num_agents: usize) -> Self {
        let mut config = Self::symmetric(num_agents, 0.0);
        config.payload.inertia = Vector3::zeros();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config() {
        let config = SharedPayloadConfig::default();
        assert_eq!(config.dt, 0.001);
        assert_eq!(config.agents.len(), 3);
        assert!(!config.renormalize_cables);
    }

    #[test]
    fn test_symmetric_attachments_are_centred() {
        let config = SharedPayloadConfig::symmetric(4, 0.1);
        let sum: Vector3<f64> = config.agents.iter().map(|a| a.attachment).sum();

        assert_relative_eq!(sum, Vector3::zeros(), epsilon = 1e-12);
        assert_relative_eq!(config.agents[1].attachment.y, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_quadrotor_conversion() {
        let config = QuadrotorConfig::default();
        let params = config.to_params().unwrap();

        assert_eq!(params.mass, config.mass);
        assert_relative_eq!(params.inertia[(2, 2)], config.inertia.z);
    }

    #[test]
    fn test_initial_attitude_in_degrees() {
        let mut initial = QuadrotorInitialState::default();
        initial.attitude_degrees = Vector3::new(0.0, 0.0, 180.0);

        let state = initial.to_state();
        assert_relative_eq!(state.orientation.angle(), std::f64::consts::PI, epsilon = 1e-12);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = SharedPayloadConfig::point_mass(2);
        config.agents[0].quadrotor.drag = DragModel::rotor_speed();
        config.agents[1].quadrotor.noise = Some(MotorNoiseConfig { std_dev: 1e-3, seed: 42 });

        let json = serde_json::to_string(&config).unwrap();
        let parsed: SharedPayloadConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.agents.len(), 2);
        assert_eq!(parsed.agents[0].quadrotor.drag, DragModel::rotor_speed());
        assert_eq!(parsed.agents[1].quadrotor.noise.as_ref().unwrap().seed, 42);
        assert_eq!(parsed.payload.inertia, Vector3::zeros());
    }
}
