use serde::Deserialize;

use crate::state::{idx, Grid};

/// Field type for boundary condition dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Vx,
    Vy,
    Pressure,
    Density,
}

/// Condition held by one edge of the domain for one quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgePolicy {
    /// Dirichlet: the edge cell holds this value.
    Fixed(f64),
    /// Zero gradient: the edge cell copies its interior neighbour.
    Mirror,
    /// Dirichlet zero.
    Zero,
}

impl EdgePolicy {
    /// Value of an edge cell whose interior neighbour holds `inner`.
    #[inline]
    pub fn resolve(self, inner: f64) -> f64 {
        match self {
            EdgePolicy::Fixed(value) => value,
            EdgePolicy::Mirror => inner,
            EdgePolicy::Zero => 0.0,
        }
    }

    /// Whether the edge follows its neighbour instead of holding a value.
    pub fn is_mirror(self) -> bool {
        matches!(self, EdgePolicy::Mirror)
    }
}

/// Policies for the four sides of the channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSet {
    pub left: EdgePolicy,
    pub right: EdgePolicy,
    pub bottom: EdgePolicy,
    pub top: EdgePolicy,
}

/// Top/bottom wall treatment for the tangential velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallCondition {
    NoSlip,
    FreeSlip,
}

impl WallCondition {
    pub fn toggled(self) -> Self {
        match self {
            WallCondition::NoSlip => WallCondition::FreeSlip,
            WallCondition::FreeSlip => WallCondition::NoSlip,
        }
    }
}

/// Outlet pressure treatment: pinned to the reference or zero-gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutletPressure {
    Fixed,
    Mirror,
}

/// Boundary configuration of the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryConfig {
    pub inflow_speed: f64,
    pub reference_pressure: f64,
    pub inlet_density: f64,
    pub walls: WallCondition,
    pub outlet_pressure: OutletPressure,
}

impl BoundaryConfig {
    /// Edge policies for `field_type`.
    ///   - `Vx`: inflow speed at inlet and outlet; walls zero (no-slip) or mirrored (free-slip)
    ///   - `Vy`: zero on every edge (no penetration, no cross-flow at the ends)
    ///   - `Pressure`: reference at inlet, reference or mirrored at outlet, mirrored at walls
    ///   - `Density`: inlet value at inlet, mirrored elsewhere
    pub fn edges(&self, field_type: FieldType) -> EdgeSet {
        match field_type {
            FieldType::Vx => {
                let wall = match self.walls {
                    WallCondition::NoSlip => EdgePolicy::Zero,
                    WallCondition::FreeSlip => EdgePolicy::Mirror,
                };
                EdgeSet {
                    left: EdgePolicy::Fixed(self.inflow_speed),
                    right: EdgePolicy::Fixed(self.inflow_speed),
                    bottom: wall,
                    top: wall,
                }
            }
            FieldType::Vy => EdgeSet {
                left: EdgePolicy::Zero,
                right: EdgePolicy::Zero,
                bottom: EdgePolicy::Zero,
                top: EdgePolicy::Zero,
            },
            FieldType::Pressure => EdgeSet {
                left: EdgePolicy::Fixed(self.reference_pressure),
                right: match self.outlet_pressure {
                    OutletPressure::Fixed => EdgePolicy::Fixed(self.reference_pressure),
                    OutletPressure::Mirror => EdgePolicy::Mirror,
                },
                bottom: EdgePolicy::Mirror,
                top: EdgePolicy::Mirror,
            },
            FieldType::Density => EdgeSet {
                left: EdgePolicy::Fixed(self.inlet_density),
                right: EdgePolicy::Mirror,
                bottom: EdgePolicy::Mirror,
                top: EdgePolicy::Mirror,
            },
        }
    }
}

/// Boundary condition handler.
/// Writes the edge cells of `x` (corners excluded) from the policies of `field_type`.
pub fn set_bnd(field_type: FieldType, x: &mut [f64], bc: &BoundaryConfig, grid: Grid) {
    apply_edges(x, &bc.edges(field_type), grid);
}

/// Writes edge cells (corners excluded) from an explicit policy set.
/// Left/right run after top/bottom; with corners excluded the order does not matter.
pub fn apply_edges(x: &mut [f64], edges: &EdgeSet, grid: Grid) {
    let (xr, yr) = (grid.x_res(), grid.y_res());

    // Pass 1: top/bottom walls
    for i in 1..(xr - 1) {
        x[idx(i, 0, xr)] = edges.bottom.resolve(x[idx(i, 1, xr)]);
        x[idx(i, yr - 1, xr)] = edges.top.resolve(x[idx(i, yr - 2, xr)]);
    }

    // Pass 2: inlet/outlet
    for j in 1..(yr - 1) {
        x[idx(0, j, xr)] = edges.left.resolve(x[idx(1, j, xr)]);
        x[idx(xr - 1, j, xr)] = edges.right.resolve(x[idx(xr - 2, j, xr)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_bc() -> BoundaryConfig {
        BoundaryConfig {
            inflow_speed: 2.0,
            reference_pressure: 1.0,
            inlet_density: 1.0,
            walls: WallCondition::NoSlip,
            outlet_pressure: OutletPressure::Fixed,
        }
    }

    fn grid() -> Grid {
        Grid::new(12, 8).unwrap()
    }

    #[test]
    fn test_resolve_policies() {
        assert_eq!(EdgePolicy::Fixed(3.0).resolve(7.0), 3.0);
        assert_eq!(EdgePolicy::Mirror.resolve(7.0), 7.0);
        assert_eq!(EdgePolicy::Zero.resolve(7.0), 0.0);
    }

    #[test]
    fn test_vx_inflow_and_outflow_pinned() {
        let g = grid();
        let bc = channel_bc();
        let mut field = vec![0.5; g.cells()];
        set_bnd(FieldType::Vx, &mut field, &bc, g);
        for j in 1..(g.y_res() - 1) {
            assert_eq!(field[g.idx(0, j)], 2.0, "inlet vx should be inflow speed at y={}", j);
            assert_eq!(field[g.idx(g.x_res() - 1, j)], 2.0, "outlet vx should be inflow speed at y={}", j);
        }
    }

    #[test]
    fn test_vx_noslip_walls_zero() {
        let g = grid();
        let bc = channel_bc();
        let mut field = vec![0.5; g.cells()];
        set_bnd(FieldType::Vx, &mut field, &bc, g);
        for i in 1..(g.x_res() - 1) {
            assert_eq!(field[g.idx(i, 0)], 0.0, "bottom wall should be no-slip");
            assert_eq!(field[g.idx(i, g.y_res() - 1)], 0.0, "top wall should be no-slip");
        }
    }

    #[test]
    fn test_vx_freeslip_walls_copy_neighbor() {
        let g = grid();
        let mut bc = channel_bc();
        bc.walls = WallCondition::FreeSlip;
        let mut field = vec![0.0; g.cells()];
        for i in 0..g.x_res() {
            field[g.idx(i, 1)] = 3.0;
            field[g.idx(i, g.y_res() - 2)] = 5.0;
        }
        set_bnd(FieldType::Vx, &mut field, &bc, g);
        assert_eq!(field[g.idx(4, 0)], 3.0);
        assert_eq!(field[g.idx(4, g.y_res() - 1)], 5.0);
    }

    #[test]
    fn test_vy_zero_on_all_edges() {
        let g = grid();
        let bc = channel_bc();
        let mut field = vec![0.5; g.cells()];
        set_bnd(FieldType::Vy, &mut field, &bc, g);
        for c in 0..g.cells() {
            let (x, y) = g.coords(c);
            let corner = (x == 0 || x == g.x_res() - 1) && (y == 0 || y == g.y_res() - 1);
            if g.is_edge(x, y) && !corner {
                assert_eq!(field[c], 0.0, "vy should be zero at edge ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_pressure_reference_and_neumann_walls() {
        let g = grid();
        let bc = channel_bc();
        let mut field = vec![0.0; g.cells()];
        for i in 0..g.x_res() {
            field[g.idx(i, 1)] = 4.0;
        }
        set_bnd(FieldType::Pressure, &mut field, &bc, g);
        assert_eq!(field[g.idx(0, 3)], 1.0);
        assert_eq!(field[g.idx(g.x_res() - 1, 3)], 1.0);
        assert_eq!(field[g.idx(5, 0)], 4.0, "bottom wall pressure should copy its neighbor");
    }

    #[test]
    fn test_outlet_pressure_mirror() {
        let g = grid();
        let mut bc = channel_bc();
        bc.outlet_pressure = OutletPressure::Mirror;
        let mut field = vec![0.0; g.cells()];
        for j in 0..g.y_res() {
            field[g.idx(g.x_res() - 2, j)] = 0.42;
        }
        set_bnd(FieldType::Pressure, &mut field, &bc, g);
        for j in 1..(g.y_res() - 1) {
            assert_eq!(field[g.idx(g.x_res() - 1, j)], 0.42, "outlet should be zero-gradient at y={}", j);
        }
    }

    #[test]
    fn test_corners_untouched() {
        let g = grid();
        let bc = channel_bc();
        let mut field = vec![9.0; g.cells()];
        set_bnd(FieldType::Vx, &mut field, &bc, g);
        assert_eq!(field[g.idx(0, 0)], 9.0);
        assert_eq!(field[g.idx(g.x_res() - 1, g.y_res() - 1)], 9.0);
    }

    #[test]
    fn test_density_inlet() {
        let g = grid();
        let bc = channel_bc();
        let mut field = vec![0.0; g.cells()];
        set_bnd(FieldType::Density, &mut field, &bc, g);
        for j in 1..(g.y_res() - 1) {
            assert_eq!(field[g.idx(0, j)], 1.0);
        }
    }

    #[test]
    fn test_wall_condition_toggle() {
        assert_eq!(WallCondition::NoSlip.toggled(), WallCondition::FreeSlip);
        assert_eq!(WallCondition::FreeSlip.toggled(), WallCondition::NoSlip);
    }
}
