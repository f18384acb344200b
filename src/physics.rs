use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::solver::{diagnostics, FlowSolver, StepReport};

/// Outcome of a headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub steps: u64,
    /// Steps whose pressure solve hit the iteration budget.
    pub unconverged_steps: u64,
    pub last: Option<StepReport>,
    pub kinetic_energy: f64,
    pub max_divergence: f64,
}

/// Build a solver from `cfg`, reset it and run `cfg.run.steps` steps,
/// logging diagnostics every `report_interval` steps.
pub fn run(cfg: &Config) -> Result<(FlowSolver, RunSummary)> {
    let mut solver = FlowSolver::new(cfg.solver.clone())?;
    let obstacles = cfg.obstacles.build(solver.grid(), cfg.solver.block_side_length)?;
    solver.reset(&obstacles);

    let grid = solver.grid();
    let mut unconverged_steps = 0;
    let mut last = None;
    for _ in 0..cfg.run.steps {
        let report = solver.step(&obstacles, cfg.run.enforce_boundaries, cfg.run.scale_flow);
        if !report.pressure.converged {
            unconverged_steps += 1;
        }
        last = Some(report);

        let interval = cfg.run.report_interval;
        if interval > 0 && report.step % interval == 0 {
            let ke = diagnostics::kinetic_energy(solver.x_velocity(), solver.y_velocity(), grid, obstacles.mask());
            let div = diagnostics::max_abs_divergence(solver.x_velocity(), solver.y_velocity(), grid, obstacles.mask());
            info!(
                step = report.step,
                iterations = report.pressure.iterations,
                residual = report.pressure.residual,
                converged = report.pressure.converged,
                kinetic_energy = ke,
                max_divergence = div,
                "progress"
            );
        }
    }

    let summary = RunSummary {
        steps: solver.total_steps(),
        unconverged_steps,
        last,
        kinetic_energy: diagnostics::kinetic_energy(solver.x_velocity(), solver.y_velocity(), grid, obstacles.mask()),
        max_divergence: diagnostics::max_abs_divergence(solver.x_velocity(), solver.y_velocity(), grid, obstacles.mask()),
    };
    Ok((solver, summary))
}
