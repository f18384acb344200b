use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pipeflow::config;
use pipeflow::physics;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_PATH));
    let cfg = config::load(&path);
    info!(
        path = %path.display(),
        x_res = cfg.solver.x_res,
        y_res = cfg.solver.y_res,
        steps = cfg.run.steps,
        "starting run"
    );

    let (_, summary) = physics::run(&cfg).context("failed to set up the flow solver")?;

    info!(
        steps = summary.steps,
        unconverged_steps = summary.unconverged_steps,
        kinetic_energy = summary.kinetic_energy,
        max_divergence = summary.max_divergence,
        "run complete"
    );
    Ok(())
}
