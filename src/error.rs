//! Error types for pipeflow.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipeflowError {
    #[error("invalid grid resolution {x_res}x{y_res}: both axes need at least 3 cells")]
    InvalidResolution { x_res: usize, y_res: usize },

    #[error("invalid time step {0}: must be finite and positive")]
    InvalidTimeStep(f64),

    #[error("pressure solver needs at least one iteration")]
    InvalidIterations,

    #[error("invalid solver accuracy {0}: must be finite and non-negative")]
    InvalidAccuracy(f64),

    #[error("obstacle block side length must be at least 1")]
    InvalidBlockSize,

    #[error("obstacle cell ({x}, {y}) lies outside the {x_res}x{y_res} grid")]
    ObstacleOutOfRange {
        x: usize,
        y: usize,
        x_res: usize,
        y_res: usize,
    },

    #[error("config parse error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipeflowError>;
