//! Seedable motor force noise

use nalgebra::Vector4;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::DynamicsError;

/// Zero-mean Gaussian perturbation of each motor force
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorNoiseConfig {
    /// Standard deviation [N]
    pub std_dev: f64,
    /// RNG seed
    pub seed: u64,
}

/// Gaussian noise source for motor forces
#[derive(Debug, Clone)]
pub struct MotorNoise {
    distribution: Normal<f64>,
    rng: StdRng,
}

impl MotorNoise {
    pub fn new(config: &MotorNoiseConfig) -> Result<Self, DynamicsError> {
        Ok(Self {
            distribution: Normal::new(0.0, config.std_dev)?,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Draw one perturbation per motor [N]
    pub fn sample(&mut self) -> Vector4<f64> {
        Vector4::from_fn(|_, _| self.distribution.sample(&mut self.rng))
    }
}
