//! Configuration and trajectory history
//!
//! Configuration types are plain serde structs validated when a model is
//! built. History buffers are append-only and filled by the models as they
//! step.

pub mod config;
pub mod history;

pub use config::*;
pub use history::*;
