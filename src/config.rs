use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::Result;
use crate::solver::{ObstacleSet, SolverParams};
use crate::state::Grid;

/// Config file read when no path is given on the command line.
pub const DEFAULT_PATH: &str = "pipeflow.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub solver: SolverParams,
    pub run: RunConfig,
    pub obstacles: ObstacleConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub steps: u64,
    /// Log diagnostics every this many steps; 0 disables periodic reports.
    pub report_interval: u64,
    pub enforce_boundaries: bool,
    pub scale_flow: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 100,
            report_interval: 10,
            enforce_boundaries: true,
            scale_flow: true,
        }
    }
}

/// Obstacle layout: raw cell indices and/or `[x, y]` anchors.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub cells: Vec<usize>,
    pub blocks: Vec<[usize; 2]>,
}

impl ObstacleConfig {
    pub fn build(&self, grid: Grid, block_side_length: usize) -> Result<ObstacleSet> {
        let mut set = ObstacleSet::from_indices(grid, block_side_length, &self.cells)?;
        for &[x, y] in &self.blocks {
            set.block(x, y)?;
        }
        Ok(set)
    }
}

pub fn parse(contents: &str) -> Result<Config> {
    Ok(serde_yaml::from_str(contents)?)
}

/// Load `path`, falling back to defaults when it is missing or invalid.
pub fn load(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => match parse(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse config; using defaults");
                Config::default()
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read config; using defaults");
            Config::default()
        }
    }
}
