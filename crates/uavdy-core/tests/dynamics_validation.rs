//! Dynamics Validation Tests
//!
//! End-to-end checks of the public models:
//! 1. Attitude integration keeps quaternions on the unit sphere
//! 2. Hover inputs are exact equilibria
//! 3. Motor allocation, clipping and calibration are consistent
//! 4. Shared payload mode selection and state layout
//! 5. Shared payload hover does not drift

use approx::assert_relative_eq;
use nalgebra::{Vector3, Vector4};

use uavdy_core::dynamics::{
    AgentCommand, MotorCalibration, MotorMixer, Quadrotor, QuadrotorInput, SharedPayload,
    TetheredPayload,
};
use uavdy_core::math::{
    cable_direction_from_euler_degrees, is_unit_vector, quaternion_from_euler_degrees,
};
use uavdy_core::simulation::{QuadrotorConfig, SharedPayloadConfig, TetheredPayloadConfig};

fn hover_commands(model: &SharedPayload) -> Vec<AgentCommand> {
    model
        .hover_forces()
        .into_iter()
        .map(|force| AgentCommand::new(force, Vector3::zeros()))
        .collect()
}

mod attitude_tests {
    use super::*;

    #[test]
    fn test_quaternion_stays_unit_under_spin() {
        let mut config = QuadrotorConfig::default();
        config.initial.angular_velocity = Vector3::new(3.0, -2.0, 5.0);
        let mut quad = Quadrotor::new(&config, 1e-3).unwrap();
        let input = QuadrotorInput::new(quad.params.hover_thrust(), Vector3::new(1e-6, 0.0, -1e-6));

        for _ in 0..500 {
            quad.advance(&input).unwrap();
            assert_relative_eq!(quad.state().orientation.quaternion().norm(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_payload_quaternion_stays_unit() {
        let mut config = SharedPayloadConfig::symmetric(3, 0.05);
        config.payload.initial_angular_velocity = Vector3::new(0.0, 0.0, 1.5);
        let mut model = SharedPayload::new(&config).unwrap();
        let commands = hover_commands(&model);

        for _ in 0..200 {
            let state = model.step(&commands).unwrap();
            let q_norm = state.rows(6, 4).norm();
            assert_relative_eq!(q_norm, 1.0, epsilon = 1e-6);
        }
    }
}

mod equilibrium_tests {
    use super::*;

    #[test]
    fn test_single_quadrotor_hover() {
        let mut quad = Quadrotor::new(&QuadrotorConfig::default(), 1e-3).unwrap();
        let start = quad.state().position;

        quad.advance(&QuadrotorInput::hover(quad.params.mass)).unwrap();

        assert_relative_eq!(quad.state().position, start, epsilon = 1e-12);
        assert_relative_eq!(quad.state().velocity, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_tethered_hover() {
        let mut model = TetheredPayload::new(&TetheredPayloadConfig::default()).unwrap();
        let start = model.state().payload_position;
        let input = QuadrotorInput::new(model.total_mass() * uavdy_core::GRAVITY, Vector3::zeros());

        for _ in 0..100 {
            model.step(&input).unwrap();
        }

        assert_relative_eq!(model.state().payload_position, start, epsilon = 1e-9);
        assert_relative_eq!(
            model.state().cable_direction,
            Vector3::new(0.0, 0.0, -1.0),
            epsilon = 1e-12
        );
    }
}

mod motor_tests {
    use super::*;

    #[test]
    fn test_allocation_round_trip_without_clipping() {
        let mixer = MotorMixer::new(0.046, 0.006, 12.0).unwrap();
        let input = QuadrotorInput::new(0.35, Vector3::new(2e-4, -1e-4, 3e-5));

        let allocation = mixer.allocate(&input, None);

        assert!(!allocation.saturated);
        assert_relative_eq!(allocation.achieved.thrust, input.thrust, epsilon = 1e-12);
        assert_relative_eq!(allocation.achieved.torque, input.torque, epsilon = 1e-12);
    }

    #[test]
    fn test_forces_clamped_to_bounds() {
        let mixer = MotorMixer::new(0.046, 0.006, 12.0).unwrap();

        let over = mixer.allocate(&QuadrotorInput::new(4.0, Vector3::zeros()), None);
        assert!(over.saturated);
        for force in over.forces.iter() {
            assert_relative_eq!(*force, mixer.max_force(), epsilon = 1e-12);
        }

        let under = mixer.allocate(&QuadrotorInput::new(0.0, Vector3::new(1e-3, 0.0, 0.0)), None);
        assert!(under.saturated);
        assert_eq!(under.forces[0], 0.0);
        assert_eq!(under.forces[1], 0.0);
        assert!(under.forces[2] > 0.0);
    }

    #[test]
    fn test_calibration_recovers_force_across_range() {
        let calibration = MotorCalibration::default();
        let mixer = MotorMixer::new(0.046, 0.006, 12.0).unwrap();
        let low = calibration.force_coefficients[0];
        let high = mixer.max_force();

        for i in 0..=50 {
            let force = low + (high - low) * i as f64 / 50.0;
            let command = calibration.command(0, force).unwrap();

            assert!(command >= 0.0);
            assert_relative_eq!(
                calibration.force(command),
                force,
                epsilon = 1e-12,
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn test_rotor_speeds_for_hover() {
        let quad = Quadrotor::new(&QuadrotorConfig::default(), 1e-3).unwrap();
        let forces = Vector4::repeat(quad.params.hover_thrust() / 4.0);

        let speeds = quad.motor_speeds(&forces).unwrap();

        assert!(speeds.iter().all(|w| *w > MotorCalibration::default().speed_offset));
        assert_relative_eq!(speeds[0], speeds[3], epsilon = 1e-9);
    }
}

mod shared_payload_tests {
    use super::*;

    #[test]
    fn test_point_mass_layout_is_seven_shorter() {
        for n in 1..=4 {
            let rigid = SharedPayload::new(&SharedPayloadConfig::symmetric(n, 0.05)).unwrap();
            let point = SharedPayload::new(&SharedPayloadConfig::point_mass(n)).unwrap();

            assert!(!rigid.is_point_mass());
            assert!(point.is_point_mass());
            assert_eq!(rigid.state_vector().len(), point.state_vector().len() + 7);
            assert_eq!(rigid.sys_dim(), point.sys_dim() + 3);
        }
    }

    #[test]
    fn test_point_mass_hover_has_no_drift() {
        let mut model = SharedPayload::new(&SharedPayloadConfig::point_mass(3)).unwrap();
        let start = model.state_vector();
        let commands = hover_commands(&model);

        for _ in 0..1000 {
            model.step(&commands).unwrap();
        }

        assert_relative_eq!(model.state_vector(), start, epsilon = 1e-9);
        assert_eq!(model.history().len(), 1000);
    }

    #[test]
    fn test_rigid_hover_has_no_drift() {
        let mut model = SharedPayload::new(&SharedPayloadConfig::symmetric(4, 0.08)).unwrap();
        let start = model.state_vector();
        let commands = hover_commands(&model);

        for _ in 0..1000 {
            model.step(&commands).unwrap();
        }

        assert_relative_eq!(model.state_vector(), start, epsilon = 1e-9);
        for i in 0..model.num_agents() {
            assert_relative_eq!(
                model.agent_position(i).z - model.position().z,
                model.links()[i].cable_length,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_tilted_payload_keeps_cable_constraint() {
        let mut config = SharedPayloadConfig::symmetric(3, 0.05);
        config.payload.initial_attitude_degrees = Vector3::new(5.0, 0.0, 0.0);
        let model = SharedPayload::new(&config).unwrap();
        let orientation = quaternion_from_euler_degrees(5.0, 0.0, 0.0);

        for i in 0..model.num_agents() {
            let attach = model.position() + orientation * model.links()[i].attachment;
            assert_relative_eq!(
                (model.agent_position(i) - attach).norm(),
                model.links()[i].cable_length,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_released_payload_falls() {
        let mut model = SharedPayload::new(&SharedPayloadConfig::symmetric(3, 0.05)).unwrap();
        let commands = vec![AgentCommand::default(); 3];

        for _ in 0..100 {
            model.step(&commands).unwrap();
        }

        assert_relative_eq!(model.velocity().z, -uavdy_core::GRAVITY * 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_tilted_cable_swings_back_through_vertical() {
        let mut config = SharedPayloadConfig::point_mass(1);
        config.agents[0].initial_cable_direction =
            cable_direction_from_euler_degrees(10.0, 0.0, 0.0);
        let mut model = SharedPayload::new(&config).unwrap();
        let commands = hover_commands(&model);
        assert!(model.cables()[0].direction.y > 0.0);

        let mut min_y = f64::MAX;
        for _ in 0..1000 {
            model.step(&commands).unwrap();
            let direction = model.cables()[0].direction;
            assert!(is_unit_vector(&direction, 1e-2));
            min_y = min_y.min(direction.y);
        }

        assert!(min_y < 0.0);
    }
}
