//! Agent × destination cost matrices.
//!
//! Rows are agents and columns are destinations, both by position in the
//! snapshot. Identifiers never index the matrix.

use rayon::ThreadPool;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cancel::CancelToken;
use crate::error::{PlanError, SolverError};
use crate::haversine;
use crate::model::{Agent, Coordinate, Destination};
use crate::traits::RoutingService;

/// Default number of routing attempts per cell (one retry).
pub const DEFAULT_MAX_ATTEMPTS: usize = 2;

/// Where a cell's cost came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellSource {
    /// Road distance from the routing service.
    Routed,
    /// Great-circle estimate after the routing service failed.
    Degraded,
}

/// Rectangular matrix of trip costs in kilometers, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    costs: Vec<f64>,
    sources: Vec<CellSource>,
}

impl CostMatrix {
    /// Builds a fully routed matrix from nested rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, SolverError> {
        let cols = rows.first().map_or(0, |row| row.len());
        if let Some(row) = rows.iter().position(|row| row.len() != cols) {
            return Err(SolverError::InvalidMatrix(format!(
                "row {row} has {} cells, expected {cols}",
                rows[row].len()
            )));
        }

        let row_count = rows.len();
        let costs: Vec<f64> = rows.into_iter().flatten().collect();
        check_cells(&costs, cols.max(1))?;

        Ok(Self {
            rows: row_count,
            cols,
            sources: vec![CellSource::Routed; costs.len()],
            costs,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.costs[row * self.cols + col]
    }

    pub fn source(&self, row: usize, col: usize) -> CellSource {
        self.sources[row * self.cols + col]
    }

    /// Positions of cells priced by the great-circle fallback.
    pub fn degraded_cells(&self) -> Vec<(usize, usize)> {
        self.sources
            .iter()
            .enumerate()
            .filter(|(_, source)| **source == CellSource::Degraded)
            .map(|(index, _)| (index / self.cols, index % self.cols))
            .collect()
    }

    /// Pads to a square matrix for the solver.
    ///
    /// Cells pairing a real entity with padding hold a sentinel larger than
    /// the sum of all real costs; padding × padding cells are zero.
    pub fn pad(&self) -> PaddedCostMatrix {
        let size = self.rows.max(self.cols);
        let sentinel = self.costs.iter().sum::<f64>() + 1.0;

        let mut values = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                let value = match (row < self.rows, col < self.cols) {
                    (true, true) => self.get(row, col),
                    (false, false) => 0.0,
                    _ => sentinel,
                };
                values.push(value);
            }
        }

        PaddedCostMatrix {
            size,
            values,
            real_rows: self.rows,
            real_cols: self.cols,
            sentinel,
        }
    }
}

/// Square, non-negative, finite cost matrix ready for [`crate::solver::solve`].
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedCostMatrix {
    size: usize,
    values: Vec<f64>,
    real_rows: usize,
    real_cols: usize,
    sentinel: f64,
}

impl PaddedCostMatrix {
    /// Wraps an already square matrix; every row and column is real.
    pub fn from_square(rows: Vec<Vec<f64>>) -> Result<Self, SolverError> {
        let size = rows.len();
        if let Some(row) = rows.iter().position(|row| row.len() != size) {
            return Err(SolverError::InvalidMatrix(format!(
                "matrix is not square: row {row} has {} cells, expected {size}",
                rows[row].len()
            )));
        }

        let values: Vec<f64> = rows.into_iter().flatten().collect();
        check_cells(&values, size.max(1))?;
        let sentinel = values.iter().sum::<f64>() + 1.0;

        Ok(Self {
            size,
            values,
            real_rows: size,
            real_cols: size,
            sentinel,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.size + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.size..(row + 1) * self.size]
    }

    pub fn real_rows(&self) -> usize {
        self.real_rows
    }

    pub fn real_cols(&self) -> usize {
        self.real_cols
    }

    pub fn sentinel(&self) -> f64 {
        self.sentinel
    }

    pub fn is_real(&self, row: usize, col: usize) -> bool {
        row < self.real_rows && col < self.real_cols
    }

    pub(crate) fn validate(&self) -> Result<(), SolverError> {
        if self.values.len() != self.size * self.size {
            return Err(SolverError::InvalidMatrix(format!(
                "expected {} cells for a {}x{} matrix, found {}",
                self.size * self.size,
                self.size,
                self.size,
                self.values.len()
            )));
        }
        check_cells(&self.values, self.size.max(1))
    }
}

fn check_cells(values: &[f64], cols: usize) -> Result<(), SolverError> {
    match values
        .iter()
        .position(|value| !value.is_finite() || *value < 0.0)
    {
        Some(index) => Err(SolverError::InvalidMatrix(format!(
            "cell ({}, {}) is {}; costs must be finite and non-negative",
            index / cols,
            index % cols,
            values[index]
        ))),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    cost: f64,
    source: CellSource,
}

/// Prices every agent → depot → destination trip.
///
/// Cells are resolved on the given pool, so its thread count bounds the
/// number of requests in flight. `build` returns only once every cell has a
/// value.
pub struct MatrixBuilder<'a, R: ?Sized> {
    routing: &'a R,
    pool: &'a ThreadPool,
    max_attempts: usize,
    cancel: CancelToken,
}

impl<'a, R> MatrixBuilder<'a, R>
where
    R: RoutingService + ?Sized,
{
    pub fn new(routing: &'a R, pool: &'a ThreadPool) -> Self {
        Self {
            routing,
            pool,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cancel: CancelToken::default(),
        }
    }

    /// Routing attempts per cell before falling back to the estimate.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[instrument(skip_all, fields(agents = agents.len(), destinations = destinations.len()))]
    pub fn build(
        &self,
        depot: Coordinate,
        agents: &[Agent],
        destinations: &[Destination],
    ) -> Result<CostMatrix, PlanError> {
        let cols = destinations.len();
        let total = agents.len() * cols;

        let cells: Vec<Cell> = self.pool.install(|| {
            (0..total)
                .into_par_iter()
                .map(|index| {
                    let agent = &agents[index / cols];
                    let destination = &destinations[index % cols];
                    self.resolve_cell(agent, depot, destination)
                })
                .collect::<Result<Vec<_>, PlanError>>()
        })?;

        let (costs, sources) = cells.into_iter().map(|cell| (cell.cost, cell.source)).unzip();
        let matrix = CostMatrix {
            rows: agents.len(),
            cols,
            costs,
            sources,
        };

        debug!(
            cells = total,
            degraded = matrix.degraded_cells().len(),
            "cost matrix complete"
        );
        Ok(matrix)
    }

    fn resolve_cell(
        &self,
        agent: &Agent,
        depot: Coordinate,
        destination: &Destination,
    ) -> Result<Cell, PlanError> {
        let waypoints = [agent.location, depot, destination.location];

        for attempt in 1..=self.max_attempts {
            if self.cancel.is_cancelled() {
                return Err(PlanError::Cancelled);
            }

            match self.routing.route(&waypoints) {
                Ok(details) if details.distance_m.is_finite() && details.distance_m >= 0.0 => {
                    return Ok(Cell {
                        cost: details.distance_m / 1000.0,
                        source: CellSource::Routed,
                    });
                }
                Ok(details) => debug!(
                    attempt,
                    distance_m = details.distance_m,
                    "routing service returned an unusable distance"
                ),
                Err(err) => debug!(attempt, error = %err, "routing attempt failed"),
            }
        }

        if self.cancel.is_cancelled() {
            return Err(PlanError::Cancelled);
        }

        let cost = haversine::via_depot_km(agent.location, depot, destination.location);
        warn!(
            agent = %agent.id,
            destination = %destination.id,
            cost_km = cost,
            "routing failed, using great-circle estimate"
        );

        Ok(Cell {
            cost,
            source: CellSource::Degraded,
        })
    }
}
