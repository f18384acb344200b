mod boundary;
mod core;
pub mod diagnostics;
mod flow;
mod obstacles;
mod params;
mod vorticity;

// Re-export public API
pub use boundary::{
    apply_edges, set_bnd, BoundaryConfig, EdgePolicy, EdgeSet, FieldType, OutletPressure, WallCondition,
};
pub use self::core::{
    advect, cell_divergence, compute_divergence, correct_velocities, solve_pressure, AdvectionScaling,
    CorrectionExtent, PressureMethod, SolveReport,
};
pub use flow::{column_flow, normalize_flow, ZERO_FLOW_EPS};
pub use obstacles::{apply_mask, clear_masked, reachable_cells, ObstacleSet};
pub use params::SolverParams;
pub use vorticity::vorticity_confinement;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::state::{idx, FlowState, Grid};

/// Lifecycle of a [`FlowSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverPhase {
    /// Constructed, fields not yet seeded.
    Uninitialized,
    Ready,
    /// Inside `step`.
    Stepping,
}

/// Summary of one completed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Step counter after this step.
    pub step: u64,
    pub pressure: SolveReport,
    /// Columns the flow normalizer skipped for carrying no flow.
    pub skipped_columns: usize,
}

/// Incompressible channel-flow solver owning every field of one simulation.
pub struct FlowSolver {
    params: SolverParams,
    grid: Grid,
    state: FlowState,
    obstacles: ObstacleSet,
    reachable: Vec<bool>,
    phase: SolverPhase,
}

impl FlowSolver {
    pub fn new(params: SolverParams) -> Result<Self> {
        params.validate()?;
        let grid = params.grid()?;
        let obstacles = ObstacleSet::empty(grid);
        let reachable = reachable_cells(&obstacles);
        Ok(Self {
            params,
            grid,
            state: FlowState::new(grid),
            obstacles,
            reachable,
            phase: SolverPhase::Uninitialized,
        })
    }

    /// Reinitialize every field: inflow speed in reachable interior cells,
    /// reference pressure everywhere, boundaries applied, obstacles zeroed.
    pub fn reset(&mut self, obstacles: &ObstacleSet) {
        self.sync_obstacles(obstacles);
        let grid = self.grid;
        let xr = grid.x_res();
        let bc = self.params.boundary();
        let solid = self.obstacles.mask();
        let s = &mut self.state;

        s.clear();
        s.pressure.fill(self.params.reference_pressure);
        for j in 1..(grid.y_res() - 1) {
            for i in 1..(xr - 1) {
                let c = idx(i, j, xr);
                if self.reachable[c] {
                    s.vx[c] = self.params.inflow_speed;
                }
            }
        }
        set_bnd(FieldType::Vx, &mut s.vx, &bc, grid);
        set_bnd(FieldType::Vy, &mut s.vy, &bc, grid);
        set_bnd(FieldType::Pressure, &mut s.pressure, &bc, grid);
        set_bnd(FieldType::Density, &mut s.density, &bc, grid);
        apply_mask(&mut s.vx, &mut s.vy, solid);
        clear_masked(&mut s.density, solid);

        self.phase = SolverPhase::Ready;
        info!(
            x_res = grid.x_res(),
            y_res = grid.y_res(),
            obstacles = self.obstacles.len(),
            "flow solver reset"
        );
    }

    /// Advance one tick: advect, pin boundaries, mask obstacles, project,
    /// then optionally normalize the flow. Resets first if never initialized.
    pub fn step(&mut self, obstacles: &ObstacleSet, enforce_boundaries: bool, scale_flow: bool) -> StepReport {
        if self.phase == SolverPhase::Uninitialized {
            self.reset(obstacles);
        }
        self.phase = SolverPhase::Stepping;
        self.sync_obstacles(obstacles);

        let grid = self.grid;
        let p = &self.params;
        let bc = p.boundary();
        let solid = self.obstacles.mask();
        let s = &mut self.state;

        // Advect velocity and tracer with the old velocity
        advect(&mut s.vx_temp, &s.vx, &s.vx, &s.vy, p.dt, p.advection_scaling, grid);
        advect(&mut s.vy_temp, &s.vy, &s.vx, &s.vy, p.dt, p.advection_scaling, grid);
        advect(&mut s.density_temp, &s.density, &s.vx, &s.vy, p.dt, p.advection_scaling, grid);
        std::mem::swap(&mut s.vx, &mut s.vx_temp);
        std::mem::swap(&mut s.vy, &mut s.vy_temp);
        std::mem::swap(&mut s.density, &mut s.density_temp);

        if enforce_boundaries {
            set_bnd(FieldType::Vx, &mut s.vx, &bc, grid);
            set_bnd(FieldType::Vy, &mut s.vy, &bc, grid);
            set_bnd(FieldType::Density, &mut s.density, &bc, grid);
        }

        apply_mask(&mut s.vx, &mut s.vy, solid);
        clear_masked(&mut s.density, solid);

        if p.add_vorticity && p.vorticity_confinement > 0.0 {
            vorticity_confinement(
                &mut s.vx,
                &mut s.vy,
                &mut s.curl,
                &mut s.curl_abs,
                solid,
                p.vorticity_confinement,
                p.dt,
                grid,
            );
        }

        // Project
        compute_divergence(&mut s.divergence, &s.vx, &s.vy, p.dt, grid, solid);
        let pressure = solve_pressure(
            &mut s.pressure,
            &mut s.pressure_prev,
            &s.divergence,
            grid,
            solid,
            &bc.edges(FieldType::Pressure),
            p.correction_extent,
            p.pressure_method,
            p.iterations,
            p.accuracy,
        );
        correct_velocities(&mut s.vx, &mut s.vy, &s.pressure, p.dt, grid, solid, p.correction_extent);

        let skipped_columns = if scale_flow { normalize_flow(&mut s.vx, grid, p.target_flow()) } else { 0 };

        s.total_steps += 1;
        self.phase = SolverPhase::Ready;

        debug!(
            step = s.total_steps,
            iterations = pressure.iterations,
            residual = pressure.residual,
            converged = pressure.converged,
            skipped_columns,
            "step complete"
        );
        StepReport { step: s.total_steps, pressure, skipped_columns }
    }

    /// Adopt `obstacles` if they differ from the current set, recomputing reachability.
    fn sync_obstacles(&mut self, obstacles: &ObstacleSet) {
        if obstacles.grid() != self.grid {
            if !self.obstacles.is_empty() {
                self.obstacles = ObstacleSet::empty(self.grid);
                self.reachable = reachable_cells(&self.obstacles);
            }
            warn!(
                expected_x = self.grid.x_res(),
                expected_y = self.grid.y_res(),
                got_x = obstacles.grid().x_res(),
                got_y = obstacles.grid().y_res(),
                "obstacle set built for a different grid, ignoring it"
            );
            return;
        }
        if *obstacles != self.obstacles {
            self.obstacles = obstacles.clone();
            self.reachable = reachable_cells(&self.obstacles);
        }
    }

    /// Switch the top/bottom walls between no-slip and free-slip.
    pub fn toggle_wall_condition(&mut self) -> WallCondition {
        self.params.walls = self.params.walls.toggled();
        info!(walls = ?self.params.walls, "wall condition toggled");
        self.params.walls
    }

    /// Turn vorticity confinement on or off.
    pub fn toggle_vorticity(&mut self) -> bool {
        self.params.add_vorticity = !self.params.add_vorticity;
        info!(enabled = self.params.add_vorticity, "vorticity confinement toggled");
        self.params.add_vorticity
    }

    pub fn x_velocity(&self) -> &[f64] {
        &self.state.vx
    }

    pub fn y_velocity(&self) -> &[f64] {
        &self.state.vy
    }

    pub fn pressure(&self) -> &[f64] {
        &self.state.pressure
    }

    /// Right-hand side of the last pressure solve, `-(div u) / dt`.
    pub fn divergence(&self) -> &[f64] {
        &self.state.divergence
    }

    pub fn density(&self) -> &[f64] {
        &self.state.density
    }

    pub fn reachable(&self) -> &[bool] {
        &self.reachable
    }

    pub fn obstacles(&self) -> &ObstacleSet {
        &self.obstacles
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn phase(&self) -> SolverPhase {
        self.phase
    }

    pub fn total_steps(&self) -> u64 {
        self.state.total_steps
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipeflowError;

    fn small_params() -> SolverParams {
        SolverParams { x_res: 12, y_res: 10, iterations: 200, ..SolverParams::default() }
    }

    #[test]
    fn test_new_rejects_invalid_params() {
        let params = SolverParams { dt: 0.0, ..SolverParams::default() };
        assert!(matches!(FlowSolver::new(params), Err(PipeflowError::InvalidTimeStep(_))));
    }

    #[test]
    fn test_phase_transitions() {
        let mut solver = FlowSolver::new(small_params()).unwrap();
        let obstacles = ObstacleSet::empty(solver.grid());
        assert_eq!(solver.phase(), SolverPhase::Uninitialized);
        solver.reset(&obstacles);
        assert_eq!(solver.phase(), SolverPhase::Ready);
        solver.step(&obstacles, true, true);
        assert_eq!(solver.phase(), SolverPhase::Ready);
    }

    #[test]
    fn test_step_without_reset_initializes() {
        let mut solver = FlowSolver::new(small_params()).unwrap();
        let obstacles = ObstacleSet::empty(solver.grid());
        let report = solver.step(&obstacles, true, true);
        assert_eq!(report.step, 1);
        assert_eq!(solver.total_steps(), 1);
        assert!(solver.x_velocity().iter().all(|v| v.is_finite()));
        let g = solver.grid();
        assert!(solver.x_velocity()[g.idx(5, 5)] > 1.0, "Implicit reset should seed inflow");
    }

    #[test]
    fn test_reset_seeds_reachable_cells_only() {
        let mut solver = FlowSolver::new(small_params()).unwrap();
        let g = solver.grid();
        let mut obstacles = ObstacleSet::empty(g);
        for y in 1..(g.y_res() - 1) {
            obstacles.block(6, y).unwrap();
        }
        solver.reset(&obstacles);

        assert_eq!(solver.x_velocity()[g.idx(3, 4)], 0.0, "Dead region left of the wall stays at rest");
        assert_eq!(solver.x_velocity()[g.idx(6, 4)], 0.0, "Obstacle cell stays at rest");
        assert_eq!(solver.x_velocity()[g.idx(8, 4)], 2.0);
        assert_eq!(solver.x_velocity()[g.idx(0, 4)], 2.0, "Inlet is pinned regardless of reachability");
        assert!(solver.pressure().iter().all(|&p| p == 1.0));
        assert_eq!(solver.total_steps(), 0);
    }

    #[test]
    fn test_step_counter_increments() {
        let mut solver = FlowSolver::new(small_params()).unwrap();
        let obstacles = ObstacleSet::empty(solver.grid());
        solver.reset(&obstacles);
        for expected in 1..=3 {
            let report = solver.step(&obstacles, true, false);
            assert_eq!(report.step, expected);
        }
        solver.reset(&obstacles);
        assert_eq!(solver.total_steps(), 0, "Reset should clear the counter");
    }

    #[test]
    fn test_obstacle_change_updates_reachability() {
        let mut solver = FlowSolver::new(small_params()).unwrap();
        let g = solver.grid();
        let mut obstacles = ObstacleSet::empty(g);
        solver.reset(&obstacles);
        assert!(solver.reachable()[g.idx(2, 4)]);

        for y in 1..(g.y_res() - 1) {
            obstacles.block(5, y).unwrap();
        }
        solver.step(&obstacles, true, true);
        assert!(!solver.reachable()[g.idx(2, 4)], "Wall added between steps should cut off the inlet side");
        assert_eq!(solver.obstacles(), &obstacles);
    }

    #[test]
    fn test_mismatched_obstacle_grid_is_ignored() {
        let mut solver = FlowSolver::new(small_params()).unwrap();
        let other = Grid::new(5, 5).unwrap();
        let mut obstacles = ObstacleSet::empty(other);
        obstacles.block(2, 2).unwrap();

        solver.reset(&obstacles);
        solver.step(&obstacles, true, true);

        assert!(solver.obstacles().is_empty());
        assert_eq!(solver.obstacles().grid(), solver.grid());
    }

    #[test]
    fn test_toggle_wall_condition() {
        let mut solver = FlowSolver::new(small_params()).unwrap();
        assert_eq!(solver.toggle_wall_condition(), WallCondition::FreeSlip);
        assert_eq!(solver.params().walls, WallCondition::FreeSlip);
        assert_eq!(solver.toggle_wall_condition(), WallCondition::NoSlip);
    }

    #[test]
    fn test_free_slip_walls_copy_interior() {
        let mut solver = FlowSolver::new(small_params()).unwrap();
        solver.toggle_wall_condition();
        let g = solver.grid();
        let obstacles = ObstacleSet::empty(g);
        solver.reset(&obstacles);
        assert_eq!(solver.x_velocity()[g.idx(4, 0)], 2.0, "Free-slip wall mirrors the seeded interior");
    }

    #[test]
    fn test_toggle_vorticity() {
        let mut solver = FlowSolver::new(small_params()).unwrap();
        assert!(solver.toggle_vorticity());
        let g = solver.grid();
        let mut obstacles = ObstacleSet::empty(g);
        obstacles.block(5, 4).unwrap();
        for _ in 0..5 {
            solver.step(&obstacles, true, true);
        }
        assert_eq!(solver.x_velocity()[g.idx(5, 4)], 0.0, "Confinement must not leak into obstacles");
        assert!(solver.x_velocity().iter().chain(solver.y_velocity()).all(|v| v.is_finite()));
        assert!(!solver.toggle_vorticity());
    }

    #[test]
    fn test_density_enters_from_inlet() {
        let mut solver = FlowSolver::new(small_params()).unwrap();
        let g = solver.grid();
        let obstacles = ObstacleSet::empty(g);
        solver.reset(&obstacles);
        assert_eq!(solver.density()[g.idx(1, 4)], 0.0);
        for _ in 0..3 {
            solver.step(&obstacles, true, true);
        }
        assert!(solver.density()[g.idx(1, 4)] > 0.0, "Tracer should be carried in from the inlet");
        assert_eq!(solver.density()[g.idx(0, 4)], 1.0);
    }
}
