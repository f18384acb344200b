use crate::error::{PipeflowError, Result};
use crate::state::{idx, Grid};

/// Blocked cells of the channel.
///
/// Every cell added through [`ObstacleSet::block`] or [`ObstacleSet::from_indices`]
/// expands to a `side x side` footprint growing toward `+x`/`+y`, clipped to the grid.
/// The originating cells are kept as seeds so the set can be compared and listed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObstacleSet {
    grid: Grid,
    side: usize,
    seeds: Vec<usize>,
    solid: Vec<bool>,
}

impl ObstacleSet {
    pub fn empty(grid: Grid) -> Self {
        Self {
            grid,
            side: 1,
            seeds: Vec::new(),
            solid: vec![false; grid.cells()],
        }
    }

    pub fn with_block_size(grid: Grid, side: usize) -> Result<Self> {
        if side == 0 {
            return Err(PipeflowError::InvalidBlockSize);
        }
        Ok(Self { side, ..Self::empty(grid) })
    }

    /// Build a set from raw row-major cell indices.
    pub fn from_indices(grid: Grid, side: usize, indices: &[usize]) -> Result<Self> {
        let mut set = Self::with_block_size(grid, side)?;
        for &c in indices {
            let (x, y) = grid.coords(c);
            set.block(x, y)?;
        }
        Ok(set)
    }

    /// Add a footprint anchored at `(x, y)`. Re-blocking a seed is a no-op.
    pub fn block(&mut self, x: usize, y: usize) -> Result<()> {
        let grid = self.grid;
        if !grid.contains(x, y) {
            return Err(PipeflowError::ObstacleOutOfRange {
                x,
                y,
                x_res: grid.x_res(),
                y_res: grid.y_res(),
            });
        }
        let seed = grid.idx(x, y);
        if self.seeds.contains(&seed) {
            return Ok(());
        }
        self.seeds.push(seed);

        let x_end = (x + self.side).min(grid.x_res());
        let y_end = (y + self.side).min(grid.y_res());
        for j in y..y_end {
            for i in x..x_end {
                self.solid[idx(i, j, grid.x_res())] = true;
            }
        }
        Ok(())
    }

    /// Add a footprint at a raw cell index.
    pub fn block_index(&mut self, c: usize) -> Result<()> {
        let (x, y) = self.grid.coords(c);
        self.block(x, y)
    }

    pub fn is_blocked(&self, x: usize, y: usize) -> bool {
        self.grid.contains(x, y) && self.solid[self.grid.idx(x, y)]
    }

    /// Number of blocked cells, footprints included.
    pub fn len(&self) -> usize {
        self.solid.iter().filter(|&&s| s).count()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Cell indices the set was built from, in insertion order.
    pub fn seeds(&self) -> &[usize] {
        &self.seeds
    }

    /// Every blocked cell index in ascending order.
    pub fn cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.solid.iter().enumerate().filter(|(_, &s)| s).map(|(c, _)| c)
    }

    /// Per-cell blocked flag, `x_res * y_res` long.
    pub fn mask(&self) -> &[bool] {
        &self.solid
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn block_side_length(&self) -> usize {
        self.side
    }
}

/// Zero both velocity components inside obstacles.
pub fn apply_mask(vx: &mut [f64], vy: &mut [f64], solid: &[bool]) {
    for (c, _) in solid.iter().enumerate().filter(|(_, &s)| s) {
        vx[c] = 0.0;
        vy[c] = 0.0;
    }
}

/// Zero a scalar field inside obstacles.
pub fn clear_masked(field: &mut [f64], solid: &[bool]) {
    for (value, _) in field.iter_mut().zip(solid).filter(|(_, &s)| s) {
        *value = 0.0;
    }
}

/// Cells from which flow can still reach the outlet.
///
/// Open interior cells of the outlet column seed the fill; sweeping leftward,
/// an open interior cell is reachable when one of `(x+1, y-1)`, `(x+1, y)`,
/// `(x+1, y+1)` is. Wall rows are never reachable.
pub fn reachable_cells(obstacles: &ObstacleSet) -> Vec<bool> {
    let grid = obstacles.grid();
    let (xr, yr) = (grid.x_res(), grid.y_res());
    let solid = obstacles.mask();
    let mut reachable = vec![false; grid.cells()];

    for j in 1..(yr - 1) {
        let c = idx(xr - 1, j, xr);
        reachable[c] = !solid[c];
    }

    for i in (0..(xr - 1)).rev() {
        for j in 1..(yr - 1) {
            let c = idx(i, j, xr);
            if solid[c] {
                continue;
            }
            let lo = j.saturating_sub(1).max(1);
            let hi = (j + 1).min(yr - 2);
            reachable[c] = (lo..=hi).any(|nj| reachable[idx(i + 1, nj, xr)]);
        }
    }
    reachable
}
