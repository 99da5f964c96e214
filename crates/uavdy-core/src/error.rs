//! Error type for the dynamics models
//!
//! Configuration problems are reported when a model is constructed.
//! Numerical failures are reported from the step that produced them.

use thiserror::Error;

/// Errors raised while building or stepping a model
#[derive(Debug, Error)]
pub enum DynamicsError {
    #[error("Parameter `{parameter}` must be positive and finite, got {value}")]
    InvalidParameter { parameter: String, value: f64 },

    #[error("Inertia of {entity} is not positive definite")]
    InertiaNotPositiveDefinite { entity: String },

    #[error("Initial cable direction of agent {agent} has zero length")]
    InvalidCableDirection { agent: usize },

    #[error("Motor allocation matrix is singular")]
    SingularAllocation,

    #[error("Motor calibration polynomial must have degree 1 to 3, got {degree}")]
    InvalidCalibration { degree: usize },

    #[error("No nonnegative real motor command produces {force} N on motor {motor}")]
    NoMotorCommandRoot { motor: usize, force: f64 },

    #[error("Generalized mass matrix ({dim}x{dim}) is singular")]
    SingularMassMatrix { dim: usize },

    #[error("Generalized acceleration is not finite at slot {slot}")]
    NonFiniteAcceleration { slot: usize },

    #[error("State is not finite at slot {slot}")]
    NonFiniteState { slot: usize },

    #[error("Command for agent {agent} is not finite")]
    NonFiniteCommand { agent: usize },

    #[error("State of agent {agent} is not finite at slot {slot}")]
    NonFiniteAgentState { agent: usize, slot: usize },

    #[error("Noise distribution error: {0}")]
    NoiseDistribution(#[from] rand_distr::NormalError),
}

impl DynamicsError {
    pub(crate) fn invalid(parameter: impl Into<String>, value: f64) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value,
        }
    }
}

/// Check that a scalar parameter is strictly positive and finite
pub(crate) fn ensure_positive(parameter: &str, value: f64) -> Result<f64, DynamicsError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(DynamicsError::invalid(parameter, value))
    }
}

/// Index of the first non-finite entry, if any
pub(crate) fn first_non_finite<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<usize> {
    values.into_iter().position(|v| !v.is_finite())
}
