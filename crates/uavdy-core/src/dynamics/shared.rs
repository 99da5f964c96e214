//! Shared payload dynamics
//!
//! N quadrotors carry one payload, each through a rigid cable of length lᵢ
//! attached at ρᵢ in the payload body frame. The generalized coordinates are
//! the payload position, the payload attitude (rigid mode only) and one unit
//! cable direction qᵢ per quadrotor, pointing from the quadrotor to the
//! payload. The quadrotor sits at
//!
//! xᵢ = x_L + R ρᵢ - lᵢ qᵢ
//!
//! Each step solves
//!
//! B(q) ÿ = N(q, q̇) + u
//!
//! for the generalized acceleration ÿ, where B is the generalized mass
//! matrix, N collects gravity, centrifugal and Coriolis terms and u maps the
//! per-quadrotor forces into generalized coordinates. Only the component of
//! a quadrotor force along its cable reaches the payload translation; the
//! perpendicular part swings the cable.
//!
//! The payload is treated as a point mass when its effective inertia
//! J̄ = J - Σ mᵢ [ρᵢ]×² is singular. The mode is fixed at construction.

use nalgebra::{DMatrix, DVector, Matrix3, UnitQuaternion, Vector3, Vector6};
use serde::{Deserialize, Serialize};

use super::Quadrotor;
use crate::error::{ensure_positive, first_non_finite, DynamicsError};
use crate::math::{
    integrate_direction, integrate_exp_map, normalize, quaternion_from_euler_degrees,
    rotation_matrix, semi_implicit_euler, skew, to_scalar_first,
};
use crate::simulation::{PayloadHistory, SharedPayloadConfig};
use crate::{gravity_enu, GRAVITY};

/// Relative determinant below which J̄ counts as singular
const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Geometry linking one quadrotor to the payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableLink {
    /// Quadrotor mass [kg]
    pub mass: f64,
    /// Cable length [m]
    pub cable_length: f64,
    /// Attachment point in the payload body frame [m]
    pub attachment: Vector3<f64>,
}

/// Cable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableState {
    /// Direction from quadrotor to payload, unit to first order
    pub direction: Vector3<f64>,
    /// Cable angular velocity [rad/s] (world frame)
    pub angular_velocity: Vector3<f64>,
}

/// Attitude state of a payload with rotational dynamics
#[derive(Debug, Clone, PartialEq)]
pub struct RigidPayload {
    /// Effective inertia J̄ [kg·m²]
    pub inertia_bar: Matrix3<f64>,
    /// Orientation (body to world)
    pub orientation: UnitQuaternion<f64>,
    /// Angular velocity [rad/s] (body frame)
    pub angular_velocity: Vector3<f64>,
}

/// Payload mode, chosen once from the attachment geometry
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadMode {
    /// No independent rotational degree of freedom
    PointMass,
    /// Full rigid body
    Rigid(RigidPayload),
}

impl PayloadMode {
    /// Generalized coordinates of the payload
    pub fn dof(&self) -> usize {
        match self {
            Self::PointMass => 3,
            Self::Rigid(_) => 6,
        }
    }

    /// Flat state slots used by the payload
    pub fn state_size(&self) -> usize {
        match self {
            Self::PointMass => 6,
            Self::Rigid(_) => 13,
        }
    }

    pub fn rigid(&self) -> Option<&RigidPayload> {
        match self {
            Self::PointMass => None,
            Self::Rigid(rigid) => Some(rigid),
        }
    }
}

/// Per-quadrotor command for one step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentCommand {
    /// Force applied by the quadrotor [N] (world frame)
    pub force: Vector3<f64>,
    /// Body torque for the quadrotor's own attitude [N·m]
    pub torque: Vector3<f64>,
}

impl AgentCommand {
    pub fn new(force: Vector3<f64>, torque: Vector3<f64>) -> Self {
        Self { force, torque }
    }
}

/// Payload shared by several quadrotors
#[derive(Debug, Clone)]
pub struct SharedPayload {
    /// Payload mass [kg]
    pub payload_mass: f64,
    /// Payload inertia J [kg·m²]
    pub inertia: Matrix3<f64>,
    total_mass: f64,
    links: Vec<CableLink>,
    quadrotors: Vec<Quadrotor>,
    position: Vector3<f64>,
    velocity: Vector3<f64>,
    mode: PayloadMode,
    cables: Vec<CableState>,
    acceleration: DVector<f64>,
    renormalize_cables: bool,
    dt: f64,
    history: PayloadHistory<Vec<AgentCommand>>,
}

impl SharedPayload {
    /// Build the shared model and select its payload mode
    ///
    /// # Errors
    /// Returns a configuration error for non-positive masses, cable lengths
    /// or time step, a negative payload inertia, a zero initial cable
    /// direction or an invalid quadrotor.
    pub fn new(config: &SharedPayloadConfig) -> Result<Self, DynamicsError> {
        ensure_positive("dt", config.dt)?;
        ensure_positive("payload.mass", config.payload.mass)?;
        if !config.payload.inertia.iter().all(|j| j.is_finite() && *j >= 0.0) {
            return Err(DynamicsError::InertiaNotPositiveDefinite {
                entity: "payload".into(),
            });
        }

        let mut links = Vec::with_capacity(config.agents.len());
        let mut quadrotors = Vec::with_capacity(config.agents.len());
        let mut cables = Vec::with_capacity(config.agents.len());
        for (i, agent) in config.agents.iter().enumerate() {
            let quadrotor = Quadrotor::new(&agent.quadrotor, config.dt)?;
            links.push(CableLink {
                mass: quadrotor.params.mass,
                cable_length: ensure_positive(
                    &format!("agents[{}].cable_length", i),
                    agent.cable_length,
                )?,
                attachment: agent.attachment,
            });
            cables.push(CableState {
                direction: normalize(&agent.initial_cable_direction)
                    .ok_or(DynamicsError::InvalidCableDirection { agent: i })?,
                angular_velocity: agent.initial_cable_angular_velocity,
            });
            quadrotors.push(quadrotor);
        }

        let inertia = Matrix3::from_diagonal(&config.payload.inertia);
        let inertia_bar = effective_inertia(&inertia, &links);
        let mode = if is_singular(&inertia_bar) {
            log::info!("payload effective inertia is singular, using point-mass dynamics");
            PayloadMode::PointMass
        } else {
            log::info!("payload modelled as a rigid body");
            let a = &config.payload.initial_attitude_degrees;
            PayloadMode::Rigid(RigidPayload {
                inertia_bar,
                orientation: quaternion_from_euler_degrees(a.x, a.y, a.z),
                angular_velocity: config.payload.initial_angular_velocity,
            })
        };

        let total_mass = config.payload.mass + links.iter().map(|l| l.mass).sum::<f64>();
        let sys_dim = mode.dof() + 3 * links.len();
        log::debug!(
            "shared payload: {} agents, total mass {} kg, {} generalized coordinates",
            links.len(),
            total_mass,
            sys_dim
        );

        Ok(Self {
            payload_mass: config.payload.mass,
            inertia,
            total_mass,
            links,
            quadrotors,
            position: config.payload.initial_position,
            velocity: config.payload.initial_velocity,
            mode,
            cables,
            acceleration: DVector::zeros(sys_dim),
            renormalize_cables: config.renormalize_cables,
            dt: config.dt,
            history: PayloadHistory::default(),
        })
    }

    /// Number of quadrotors
    pub fn num_agents(&self) -> usize {
        self.links.len()
    }

    pub fn mode(&self) -> &PayloadMode {
        &self.mode
    }

    pub fn is_point_mass(&self) -> bool {
        matches!(self.mode, PayloadMode::PointMass)
    }

    /// Dimension of the generalized coordinates
    pub fn sys_dim(&self) -> usize {
        self.mode.dof() + 3 * self.num_agents()
    }

    /// Length of the flat state vector
    pub fn state_size(&self) -> usize {
        self.mode.state_size() + 6 * self.num_agents()
    }

    /// Payload plus quadrotor masses [kg]
    pub fn total_mass(&self) -> f64 {
        self.total_mass
    }

    pub fn links(&self) -> &[CableLink] {
        &self.links
    }

    pub fn cables(&self) -> &[CableState] {
        &self.cables
    }

    pub fn quadrotor(&self, agent: usize) -> &Quadrotor {
        &self.quadrotors[agent]
    }

    /// Payload position [m]
    pub fn position(&self) -> &Vector3<f64> {
        &self.position
    }

    /// Payload velocity [m/s]
    pub fn velocity(&self) -> &Vector3<f64> {
        &self.velocity
    }

    /// Generalized acceleration of the last step
    pub fn last_acceleration(&self) -> &DVector<f64> {
        &self.acceleration
    }

    pub fn history(&self) -> &PayloadHistory<Vec<AgentCommand>> {
        &self.history
    }

    /// Append a payload reference [position, velocity] supplied by the caller
    pub fn record_reference(&mut self, reference: Vector6<f64>) {
        self.history.record_reference(reference);
    }

    /// Flat state
    ///
    /// Rigid: [x, v, q_L (w first), Ω, q₁..q_N, ω₁..ω_N], 13 + 6N values.
    /// Point mass: [x, v, q₁..q_N, ω₁..ω_N], 6 + 6N values.
    pub fn state_vector(&self) -> DVector<f64> {
        let mut values = Vec::with_capacity(self.state_size());
        values.extend(self.position.iter());
        values.extend(self.velocity.iter());
        if let PayloadMode::Rigid(rigid) = &self.mode {
            values.extend(to_scalar_first(&rigid.orientation).iter());
            values.extend(rigid.angular_velocity.iter());
        }
        for cable in &self.cables {
            values.extend(cable.direction.iter());
        }
        for cable in &self.cables {
            values.extend(cable.angular_velocity.iter());
        }
        DVector::from_vec(values)
    }

    /// World position of quadrotor `agent` [m]
    pub fn agent_position(&self, agent: usize) -> Vector3<f64> {
        let link = &self.links[agent];
        let attachment = match &self.mode {
            PayloadMode::PointMass => Vector3::zeros(),
            PayloadMode::Rigid(rigid) => rigid.orientation * link.attachment,
        };
        self.position + attachment - link.cable_length * self.cables[agent].direction
    }

    /// World velocity of quadrotor `agent` [m/s]
    pub fn agent_velocity(&self, agent: usize) -> Vector3<f64> {
        let link = &self.links[agent];
        let cable = &self.cables[agent];
        let attachment = match &self.mode {
            PayloadMode::PointMass => Vector3::zeros(),
            PayloadMode::Rigid(rigid) => {
                rigid.orientation * rigid.angular_velocity.cross(&link.attachment)
            }
        };
        let swing = cable.angular_velocity.cross(&cable.direction);
        self.velocity + attachment - link.cable_length * swing
    }

    /// Forces holding vertical cables in static equilibrium
    ///
    /// Each quadrotor lifts its own weight and an equal share of the
    /// payload. Exact when every cable hangs vertically and, for a rigid
    /// payload, the attachments are centred on the centre of mass.
    pub fn hover_forces(&self) -> Vec<Vector3<f64>> {
        let share = self.payload_mass / self.num_agents() as f64;
        self.links
            .iter()
            .map(|link| Vector3::new(0.0, 0.0, (link.mass + share) * GRAVITY))
            .collect()
    }

    /// Generalized mass matrix B(q)
    pub fn mass_matrix(&self) -> DMatrix<f64> {
        let dim = self.sys_dim();
        let offset = self.mode.dof();
        let mut bq = DMatrix::zeros(dim, dim);

        bq.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&(Matrix3::identity() * self.total_mass));
        if let PayloadMode::Rigid(rigid) = &self.mode {
            bq.fixed_view_mut::<3, 3>(3, 3).copy_from(&rigid.inertia_bar);
        }

        for (i, (link, cable)) in self.links.iter().zip(&self.cables).enumerate() {
            let row = offset + 3 * i;
            let m = link.mass;
            let ml = m * link.cable_length;
            let q_hat = skew(&cable.direction);

            bq.fixed_view_mut::<3, 3>(row, 0).copy_from(&(-m * q_hat));
            bq.fixed_view_mut::<3, 3>(row, row)
                .copy_from(&(Matrix3::identity() * ml));

            if let PayloadMode::Rigid(rigid) = &self.mode {
                let r = rotation_matrix(&rigid.orientation);
                let rho_hat = skew(&link.attachment);

                let mut block = bq.fixed_view_mut::<3, 3>(0, 3);
                block += -m * r * rho_hat;
                let mut block = bq.fixed_view_mut::<3, 3>(3, 0);
                block += m * rho_hat * r.transpose();

                bq.fixed_view_mut::<3, 3>(row, 3)
                    .copy_from(&(ml * q_hat * r * rho_hat));
                bq.fixed_view_mut::<3, 3>(3, row)
                    .copy_from(&(ml * rho_hat * r.transpose() * q_hat));
            }
        }

        bq
    }

    /// Bias vector N(q, q̇): gravity, centrifugal and Coriolis terms
    pub fn bias_vector(&self) -> DVector<f64> {
        let g = gravity_enu();
        let offset = self.mode.dof();
        let mut nq = DVector::zeros(self.sys_dim());

        let mut translational = self.total_mass * g;
        let mut rotational = Vector3::zeros();
        let mut gravity_moment = Vector3::zeros();

        for (i, (link, cable)) in self.links.iter().zip(&self.cables).enumerate() {
            let m = link.mass;
            let ml = m * link.cable_length;
            let q = &cable.direction;
            let w_sq = cable.angular_velocity.norm_squared();

            translational -= ml * w_sq * q;
            let mut swing = -m * q.cross(&g);

            if let PayloadMode::Rigid(rigid) = &self.mode {
                let r = rotation_matrix(&rigid.orientation);
                let rho_hat = skew(&link.attachment);
                let omega_hat = skew(&rigid.angular_velocity);
                let centripetal = r * omega_hat * omega_hat * link.attachment;

                translational += m * centripetal;
                rotational += ml * w_sq * rho_hat * r.transpose() * q;
                gravity_moment += rho_hat * r.transpose() * (m * g);
                swing += ml * q.cross(&centripetal);
            }

            nq.fixed_rows_mut::<3>(offset + 3 * i).copy_from(&swing);
        }

        nq.fixed_rows_mut::<3>(0).copy_from(&translational);
        if let PayloadMode::Rigid(rigid) = &self.mode {
            let omega = &rigid.angular_velocity;
            let gyroscopic = -omega.cross(&(rigid.inertia_bar * omega));
            nq.fixed_rows_mut::<3>(3)
                .copy_from(&(gyroscopic - rotational + gravity_moment));
        }

        nq
    }

    /// Generalized input u for the per-quadrotor forces
    ///
    /// # Panics
    /// Panics if the number of commands differs from the number of agents.
    pub fn input_vector(&self, commands: &[AgentCommand]) -> DVector<f64> {
        assert_eq!(commands.len(), self.num_agents(), "one command per quadrotor");

        let offset = self.mode.dof();
        let mut u_inp = DVector::zeros(self.sys_dim());
        let mut translational = Vector3::zeros();
        let mut rotational = Vector3::zeros();

        let agents = self.links.iter().zip(&self.cables).zip(commands);
        for (i, ((link, cable), command)) in agents.enumerate() {
            let q = &cable.direction;
            let u = &command.force;
            let parallel = q * q.dot(u);
            let perpendicular = u - parallel;

            translational += parallel;
            let mut swing = -q.cross(&perpendicular);

            if let PayloadMode::Rigid(rigid) = &self.mode {
                let r = rotation_matrix(&rigid.orientation);
                let omega_hat = skew(&rigid.angular_velocity);
                let centripetal = r * omega_hat * omega_hat * link.attachment;

                rotational += skew(&link.attachment) * r.transpose() * u;
                swing += link.mass * link.cable_length * q.cross(&centripetal);
            }

            u_inp.fixed_rows_mut::<3>(offset + 3 * i).copy_from(&swing);
        }

        u_inp.fixed_rows_mut::<3>(0).copy_from(&translational);
        if !self.is_point_mass() {
            u_inp.fixed_rows_mut::<3>(3).copy_from(&rotational);
        }

        u_inp
    }

    /// Solve B ÿ = N + u at the current state
    ///
    /// # Errors
    /// Fails if B is singular or the solution is not finite.
    pub fn generalized_acceleration(
        &self,
        commands: &[AgentCommand],
    ) -> Result<DVector<f64>, DynamicsError> {
        let bq = self.mass_matrix();
        let rhs = self.bias_vector() + self.input_vector(commands);
        let dim = bq.nrows();

        let acceleration = bq.lu().solve(&rhs).ok_or_else(|| {
            log::warn!("generalized mass matrix is singular");
            DynamicsError::SingularMassMatrix { dim }
        })?;

        if let Some(slot) = first_non_finite(acceleration.iter()) {
            log::warn!("generalized acceleration is not finite at slot {}", slot);
            return Err(DynamicsError::NonFiniteAcceleration { slot });
        }
        Ok(acceleration)
    }

    /// Advance payload, cables and quadrotor attitudes by one step
    ///
    /// # Errors
    /// Fails on a non-finite command, a singular mass matrix, or a
    /// non-finite acceleration, payload state or quadrotor state. The state
    /// is left untouched when a command is rejected or the acceleration
    /// cannot be computed.
    ///
    /// # Panics
    /// Panics if the number of commands differs from the number of agents.
    pub fn step(&mut self, commands: &[AgentCommand]) -> Result<DVector<f64>, DynamicsError> {
        if let Some(agent) = commands
            .iter()
            .position(|c| first_non_finite(c.torque.iter()).is_some())
        {
            log::warn!("torque command for agent {} is not finite", agent);
            return Err(DynamicsError::NonFiniteCommand { agent });
        }
        let acceleration = self.generalized_acceleration(commands)?;
        let dt = self.dt;
        let offset = self.mode.dof();

        let (position, velocity) = semi_implicit_euler(
            &self.position,
            &self.velocity,
            &acceleration.fixed_rows::<3>(0).into_owned(),
            dt,
        );
        self.position = position;
        self.velocity = velocity;

        if let PayloadMode::Rigid(rigid) = &mut self.mode {
            let omega = rigid.angular_velocity;
            rigid.orientation = integrate_exp_map(&rigid.orientation, &omega, dt);
            rigid.angular_velocity = omega + acceleration.fixed_rows::<3>(3) * dt;
        }

        for (i, cable) in self.cables.iter_mut().enumerate() {
            let omega = cable.angular_velocity;
            cable.angular_velocity = omega + acceleration.fixed_rows::<3>(offset + 3 * i) * dt;
            cable.direction = integrate_direction(&cable.direction, &omega, dt);
            if self.renormalize_cables {
                cable.direction = cable.direction.normalize();
            }
        }

        for (quadrotor, command) in self.quadrotors.iter_mut().zip(commands) {
            quadrotor.advance_rotation(&command.torque);
        }

        self.acceleration = acceleration;

        for (agent, quadrotor) in self.quadrotors.iter().enumerate() {
            if let Some(slot) = first_non_finite(quadrotor.state_vector().iter()) {
                log::warn!("quadrotor {} state diverged at slot {}", agent, slot);
                return Err(DynamicsError::NonFiniteAgentState { agent, slot });
            }
        }

        let state = self.state_vector();
        if let Some(slot) = first_non_finite(state.iter()) {
            log::warn!("shared payload state diverged at slot {}", slot);
            return Err(DynamicsError::NonFiniteState { slot });
        }
        self.history.record(state.clone(), commands.to_vec());
        Ok(state)
    }
}

/// J̄ = J - Σ mᵢ [ρᵢ]×²
pub fn effective_inertia(inertia: &Matrix3<f64>, links: &[CableLink]) -> Matrix3<f64> {
    links.iter().fold(*inertia, |acc, link| {
        let rho_hat = skew(&link.attachment);
        acc - link.mass * rho_hat * rho_hat
    })
}

fn is_singular(m: &Matrix3<f64>) -> bool {
    let scale = m.norm();
    scale == 0.0 || m.determinant().abs() <= SINGULARITY_TOLERANCE * scale.powi(3)
}
