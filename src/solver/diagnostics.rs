use super::core::cell_divergence;
use crate::state::{idx, Grid};

pub use super::flow::column_flow;

/// Volume-averaged kinetic energy over interior fluid cells: KE = 0.5 * <vx^2 + vy^2>.
pub fn kinetic_energy(vx: &[f64], vy: &[f64], grid: Grid, solid: &[bool]) -> f64 {
    let xr = grid.x_res();
    let mut sum = 0.0;
    let mut count = 0usize;
    for j in 1..(grid.y_res() - 1) {
        for i in 1..(xr - 1) {
            let c = idx(i, j, xr);
            if solid[c] {
                continue;
            }
            sum += vx[c] * vx[c] + vy[c] * vy[c];
            count += 1;
        }
    }
    if count > 0 { 0.5 * sum / count as f64 } else { 0.0 }
}

/// Largest `|div u|` over interior fluid cells.
pub fn max_abs_divergence(vx: &[f64], vy: &[f64], grid: Grid, solid: &[bool]) -> f64 {
    let xr = grid.x_res();
    let mut max = 0.0_f64;
    for j in 1..(grid.y_res() - 1) {
        for i in 1..(xr - 1) {
            if solid[idx(i, j, xr)] {
                continue;
            }
            max = max.max(cell_divergence(vx, vy, grid, i, j).abs());
        }
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(8, 8).unwrap()
    }

    #[test]
    fn test_kinetic_energy_uniform() {
        let g = grid();
        let vx = vec![2.0; g.cells()];
        let vy = vec![0.0; g.cells()];
        let solid = vec![false; g.cells()];
        let ke = kinetic_energy(&vx, &vy, g, &solid);
        assert!((ke - 2.0).abs() < 1e-12, "KE of uniform vx=2 should be 2, got {}", ke);
    }

    #[test]
    fn test_kinetic_energy_skips_obstacles() {
        let g = grid();
        let mut vx = vec![1.0; g.cells()];
        let vy = vec![0.0; g.cells()];
        let mut solid = vec![false; g.cells()];
        solid[g.idx(3, 3)] = true;
        vx[g.idx(3, 3)] = 100.0;
        let ke = kinetic_energy(&vx, &vy, g, &solid);
        assert!((ke - 0.5).abs() < 1e-12, "Obstacle velocity should not count, got {}", ke);
    }

    #[test]
    fn test_kinetic_energy_all_solid() {
        let g = grid();
        let v = vec![1.0; g.cells()];
        let solid = vec![true; g.cells()];
        assert_eq!(kinetic_energy(&v, &v, g, &solid), 0.0);
    }

    #[test]
    fn test_max_divergence() {
        let g = grid();
        let solid = vec![false; g.cells()];
        let mut vx = vec![1.0; g.cells()];
        let vy = vec![0.0; g.cells()];
        assert_eq!(max_abs_divergence(&vx, &vy, g, &solid), 0.0);

        vx[g.idx(4, 4)] = 1.5;
        let expected = 0.5 / g.spacing();
        let got = max_abs_divergence(&vx, &vy, g, &solid);
        assert!((got - expected).abs() < 1e-9, "Expected {}, got {}", expected, got);
    }
}
