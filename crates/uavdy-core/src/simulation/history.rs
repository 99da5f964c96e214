//! Trajectory history
//!
//! Append-only buffers filled once per step for external logging or
//! plotting. They start empty.

use nalgebra::{DVector, SVector, Vector3, Vector4, Vector6};

use crate::dynamics::{QuadrotorInput, QUADROTOR_STATE_SIZE};

/// History of a single quadrotor
#[derive(Debug, Clone, Default)]
pub struct QuadrotorHistory {
    /// State after each step followed by the angular acceleration applied
    pub states: Vec<SVector<f64, 16>>,
    /// Commanded [T, τx, τy, τz] followed by the four clipped motor forces
    pub commands: Vec<SVector<f64, 8>>,
    /// Reference rows supplied by the caller
    pub references: Vec<DVector<f64>>,
}

impl QuadrotorHistory {
    /// Record a simulation step
    pub fn record(
        &mut self,
        state: &SVector<f64, QUADROTOR_STATE_SIZE>,
        angular_acceleration: &Vector3<f64>,
        command: &QuadrotorInput,
        motor_forces: &Vector4<f64>,
    ) {
        self.states.push(SVector::from_iterator(
            state.iter().chain(angular_acceleration.iter()).copied(),
        ));
        self.commands.push(SVector::from_iterator(
            command.to_vector().iter().chain(motor_forces.iter()).copied(),
        ));
    }

    pub fn record_reference(&mut self, reference: &[f64]) {
        self.references.push(DVector::from_column_slice(reference));
    }

    /// Get number of recorded steps
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// History of a payload model
///
/// `C` is the per-step command record.
#[derive(Debug, Clone)]
pub struct PayloadHistory<C> {
    /// Flat state after each step
    pub states: Vec<DVector<f64>>,
    /// Commands applied at each step
    pub commands: Vec<C>,
    /// Payload references [position, velocity] supplied by the caller
    pub references: Vec<Vector6<f64>>,
}

impl<C> Default for PayloadHistory<C> {
    fn default() -> Self {
        Self {
            states: Vec::new(),
            commands: Vec::new(),
            references: Vec::new(),
        }
    }
}

impl<C> PayloadHistory<C> {
    /// Record a simulation step
    pub fn record(&mut self, state: DVector<f64>, command: C) {
        self.states.push(state);
        self.commands.push(command);
    }

    pub fn record_reference(&mut self, reference: Vector6<f64>) {
        self.references.push(reference);
    }

    /// Most recent state
    pub fn last_state(&self) -> Option<&DVector<f64>> {
        self.states.last()
    }

    /// Get number of recorded steps
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
