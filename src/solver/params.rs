use serde::Deserialize;

use super::boundary::{BoundaryConfig, OutletPressure, WallCondition};
use super::core::{AdvectionScaling, CorrectionExtent, PressureMethod};
use crate::error::{PipeflowError, Result};
use crate::state::Grid;

/// Solver parameters for the channel flow.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    pub x_res: usize,
    pub y_res: usize,
    pub dt: f64,
    pub inflow_speed: f64,
    pub reference_pressure: f64,
    /// Pressure solver iteration budget.
    pub iterations: usize,
    /// Residual norm below which the pressure solve stops early.
    pub accuracy: f64,
    pub pressure_method: PressureMethod,
    pub advection_scaling: AdvectionScaling,
    pub correction_extent: CorrectionExtent,
    pub walls: WallCondition,
    pub outlet_pressure: OutletPressure,
    /// Side length of the square footprint each obstacle cell expands to.
    pub block_side_length: usize,
    pub add_vorticity: bool,
    pub vorticity_confinement: f64,
    pub inlet_density: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            x_res: 20,
            y_res: 20,
            dt: 0.1,
            inflow_speed: 2.0,
            reference_pressure: 1.0,
            iterations: 1000,
            accuracy: 1e-5,
            pressure_method: PressureMethod::GaussSeidel,
            advection_scaling: AdvectionScaling::ResolutionScaled,
            correction_extent: CorrectionExtent::Interior,
            walls: WallCondition::NoSlip,
            outlet_pressure: OutletPressure::Fixed,
            block_side_length: 1,
            add_vorticity: false,
            vorticity_confinement: 0.3,
            inlet_density: 1.0,
        }
    }
}

impl SolverParams {
    /// Reject configurations the solver cannot run with.
    pub fn validate(&self) -> Result<()> {
        Grid::new(self.x_res, self.y_res)?;
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(PipeflowError::InvalidTimeStep(self.dt));
        }
        if self.iterations == 0 {
            return Err(PipeflowError::InvalidIterations);
        }
        if !(self.accuracy.is_finite() && self.accuracy >= 0.0) {
            return Err(PipeflowError::InvalidAccuracy(self.accuracy));
        }
        if self.block_side_length == 0 {
            return Err(PipeflowError::InvalidBlockSize);
        }
        Ok(())
    }

    pub fn grid(&self) -> Result<Grid> {
        Grid::new(self.x_res, self.y_res)
    }

    pub fn boundary(&self) -> BoundaryConfig {
        BoundaryConfig {
            inflow_speed: self.inflow_speed,
            reference_pressure: self.reference_pressure,
            inlet_density: self.inlet_density,
            walls: self.walls,
            outlet_pressure: self.outlet_pressure,
        }
    }

    /// Volumetric flow through an unobstructed cross-section.
    pub fn target_flow(&self) -> f64 {
        (self.y_res.saturating_sub(2)) as f64 * self.inflow_speed
    }
}
