use crate::state::{idx, Grid};

/// Columns whose net flow is smaller than this are treated as fully blocked.
pub const ZERO_FLOW_EPS: f64 = 1e-12;

/// Volumetric flow through column `x`: sum of `vx` over the interior rows.
pub fn column_flow(vx: &[f64], grid: Grid, x: usize) -> f64 {
    let xr = grid.x_res();
    (1..(grid.y_res() - 1)).map(|j| vx[idx(x, j, xr)]).sum()
}

/// Rescale `vx` in every interior column so its flow equals `target_flow`.
///
/// Zero-flow columns are left as they are. A column carrying net backflow gets
/// a negative factor and is flipped to forward flow.
/// Returns the number of columns that were skipped.
pub fn normalize_flow(vx: &mut [f64], grid: Grid, target_flow: f64) -> usize {
    let (xr, yr) = (grid.x_res(), grid.y_res());
    let mut skipped = 0;
    for i in 1..(xr - 1) {
        let flow = column_flow(vx, grid, i);
        if flow.abs() < ZERO_FLOW_EPS {
            skipped += 1;
            continue;
        }
        let factor = target_flow / flow;
        for j in 1..(yr - 1) {
            vx[idx(i, j, xr)] *= factor;
        }
    }
    skipped
}
