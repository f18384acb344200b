//! 2D incompressible channel flow around static obstacles.
//!
//! [`solver::FlowSolver`] owns every field of one simulation and advances it
//! with semi-Lagrangian advection followed by a pressure projection.

pub mod config;
pub mod error;
pub mod physics;
pub mod solver;
pub mod state;

pub use error::{PipeflowError, Result};
pub use solver::{FlowSolver, ObstacleSet, SolverParams, StepReport};
