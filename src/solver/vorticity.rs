use crate::state::Grid;

/// Guards the normalization of a vanishing `|omega|` gradient.
const GRADIENT_EPS: f64 = 1e-10;

/// Derivative of `f` at cell `c` along the axis through `minus` and `plus`.
///
/// Central where both neighbours are fluid, one-sided where one of them is an
/// obstacle, zero when the cell is boxed in on that axis. Values stored in
/// obstacle cells are never read.
#[inline]
fn fluid_derivative(f: &[f64], solid: &[bool], c: usize, minus: usize, plus: usize) -> f64 {
    match (solid[minus], solid[plus]) {
        (false, false) => 0.5 * (f[plus] - f[minus]),
        (true, false) => f[plus] - f[c],
        (false, true) => f[c] - f[minus],
        (true, true) => 0.0,
    }
}

/// Vorticity confinement (Fedkiw et al. 2001) restricted to fluid cells.
///
/// Fills `curl` with `omega = dvy/dx - dvx/dy` and `curl_abs` with `|omega|`
/// on interior fluid cells, zero elsewhere. Then pushes fluid cells at least
/// two cells inside the grid along `N x omega`, where `N` is the normalized
/// gradient of `|omega|`. Derivatives next to an obstacle are one-sided, so no
/// obstacle velocity enters the curl and no obstacle `|omega|` enters `N`.
/// Obstacle velocities are left untouched.
#[allow(clippy::too_many_arguments)]
pub fn vorticity_confinement(
    vx: &mut [f64],
    vy: &mut [f64],
    curl: &mut [f64],
    curl_abs: &mut [f64],
    solid: &[bool],
    epsilon: f64,
    dt: f64,
    grid: Grid,
) {
    let (xr, yr) = (grid.x_res(), grid.y_res());
    curl.fill(0.0);
    curl_abs.fill(0.0);

    for y in 1..(yr - 1) {
        for x in 1..(xr - 1) {
            let c = grid.idx(x, y);
            if solid[c] {
                continue;
            }
            let omega = fluid_derivative(vy, solid, c, c - 1, c + 1) - fluid_derivative(vx, solid, c, c - xr, c + xr);
            curl[c] = omega;
            curl_abs[c] = omega.abs();
        }
    }

    let strength = dt * epsilon;
    for y in 2..yr.saturating_sub(2) {
        for x in 2..xr.saturating_sub(2) {
            let c = grid.idx(x, y);
            if solid[c] || curl[c] == 0.0 {
                continue;
            }
            let gx = fluid_derivative(curl_abs, solid, c, c - 1, c + 1);
            let gy = fluid_derivative(curl_abs, solid, c, c - xr, c + xr);
            let len = gx.hypot(gy) + GRADIENT_EPS;
            vx[c] += strength * curl[c] * gy / len;
            vy[c] -= strength * curl[c] * gx / len;
        }
    }
}
