//! # Traits - The Simulator Seam
//!
//! The reaction-network simulator lives outside this crate. Anything that
//! turns a parameter vector into a trajectory, or explains why it could
//! not, can drive a sampling run.

use thiserror::Error;

use crate::trajectory::Trajectory;

/// Why a simulation produced no usable trajectory
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationFailure {
    /// Integration blew up (non-finite or runaway values)
    #[error("trajectory diverged at t = {time}")]
    Diverged { time: f64 },

    /// The integrator gave up
    #[error("integration failed: {0}")]
    Integration(String),
}

/// Simulator trait - parameters in, trajectory of one observable out
///
/// Implementations must be `Sync` so independent trials can run in
/// parallel against a shared simulator.
pub trait Simulator: Send + Sync {
    /// Number of kinetic parameters a genotype perturbs
    fn parameter_count(&self) -> usize;

    /// Wildtype (unperturbed) parameter values
    fn base_parameters(&self) -> Vec<f64>;

    /// Simulate with the given parameter values
    fn simulate(&self, parameters: &[f64]) -> Result<Trajectory, SimulationFailure>;

    /// Name of this simulator (for logging)
    fn name(&self) -> &'static str;
}
