use std::ops::{Deref, DerefMut};

use crate::error::{PipeflowError, Result};

/// Convert 2D cell coordinates to a row-major index.
/// `y` grows upward, `x` grows toward the outlet.
#[inline(always)]
pub const fn idx(x: usize, y: usize, x_res: usize) -> usize {
    y * x_res + x
}

/// Fixed cell grid of the channel. Rows `0` and `y_res - 1` are walls,
/// column `0` is the inlet and column `x_res - 1` the outlet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    x_res: usize,
    y_res: usize,
}

impl Grid {
    /// Both axes need an interior, so anything below 3 cells is rejected.
    pub fn new(x_res: usize, y_res: usize) -> Result<Self> {
        if x_res < 3 || y_res < 3 {
            return Err(PipeflowError::InvalidResolution { x_res, y_res });
        }
        Ok(Self { x_res, y_res })
    }

    pub fn x_res(&self) -> usize {
        self.x_res
    }

    pub fn y_res(&self) -> usize {
        self.y_res
    }

    pub fn cells(&self) -> usize {
        self.x_res * self.y_res
    }

    /// Grid spacing `h = 1 / x_res`, shared by both axes.
    pub fn spacing(&self) -> f64 {
        1.0 / self.x_res as f64
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.x_res && y < self.y_res);
        idx(x, y, self.x_res)
    }

    #[inline]
    pub fn coords(&self, c: usize) -> (usize, usize) {
        (c % self.x_res, c / self.x_res)
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.x_res && y < self.y_res
    }

    /// Whether `(x, y)` lies on the outermost ring of cells.
    pub fn is_edge(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x == self.x_res - 1 || y == self.y_res - 1
    }
}

/// Dense scalar field with exactly one value per grid cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    x_res: usize,
    data: Vec<f64>,
}

impl Field {
    pub fn new(grid: Grid, fill: f64) -> Self {
        Self {
            x_res: grid.x_res(),
            data: vec![fill; grid.cells()],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[idx(x, y, self.x_res)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        self.data[idx(x, y, self.x_res)] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

impl Deref for Field {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.data
    }
}

impl DerefMut for Field {
    fn deref_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// Every field owned by one flow solver.
pub struct FlowState {
    pub grid: Grid,
    pub vx: Field,
    pub vy: Field,
    /// Advection targets for `vx`/`vy`; swapped into place after each advect.
    pub vx_temp: Field,
    pub vy_temp: Field,
    pub pressure: Field,
    /// Right-hand side of the pressure solve: `-(div u) / dt`.
    pub divergence: Field,
    /// Passive tracer carried along with the flow.
    pub density: Field,
    pub density_temp: Field,
    /// Previous-sweep buffer for the Jacobi pressure variant.
    pub pressure_prev: Field,
    /// Scratch buffer for vorticity values (omega = dvy/dx - dvx/dy).
    pub curl: Field,
    /// Scratch buffer for absolute vorticity (|omega|) used in confinement.
    pub curl_abs: Field,
    pub total_steps: u64,
}

impl FlowState {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            vx: Field::new(grid, 0.0),
            vy: Field::new(grid, 0.0),
            vx_temp: Field::new(grid, 0.0),
            vy_temp: Field::new(grid, 0.0),
            pressure: Field::new(grid, 0.0),
            divergence: Field::new(grid, 0.0),
            density: Field::new(grid, 0.0),
            density_temp: Field::new(grid, 0.0),
            pressure_prev: Field::new(grid, 0.0),
            curl: Field::new(grid, 0.0),
            curl_abs: Field::new(grid, 0.0),
            total_steps: 0,
        }
    }

    /// Zero every field and the step counter.
    pub fn clear(&mut self) {
        for field in [
            &mut self.vx,
            &mut self.vy,
            &mut self.vx_temp,
            &mut self.vy_temp,
            &mut self.pressure,
            &mut self.divergence,
            &mut self.density,
            &mut self.density_temp,
            &mut self.pressure_prev,
            &mut self.curl,
            &mut self.curl_abs,
        ] {
            field.fill(0.0);
        }
        self.total_steps = 0;
    }
}
