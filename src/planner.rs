//! Dispatch planner: cost matrix, assignment, then route geometry.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cancel::CancelToken;
use crate::error::PlanError;
use crate::matrix::{CellSource, DEFAULT_MAX_ATTEMPTS, MatrixBuilder};
use crate::model::{Agent, Coordinate, Destination, Snapshot};
use crate::polyline::{self, Polyline};
use crate::solver;
use crate::traits::{EntitySource, ResultSink, RoutingService};

#[derive(Debug, Clone)]
pub struct PlannerOptions {
    /// Maximum routing requests in flight at once.
    pub max_in_flight: usize,
    /// Routing attempts per matrix cell before the great-circle fallback.
    pub max_attempts: usize,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            max_in_flight: 4,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// One agent sent to one destination through the depot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub agent_id: String,
    pub destination_id: String,
    /// Trip cost in kilometers as used by the solver.
    pub cost_km: f64,
    pub cost_source: CellSource,
    /// Empty when the geometry could not be fetched or decoded.
    pub geometry: Polyline,
}

/// Everything a run produces, published as one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Results in agent order.
    pub results: Vec<DispatchResult>,
    pub total_cost_km: f64,
    /// `(agent, destination)` positions priced by the great-circle fallback.
    pub degraded_cells: Vec<(usize, usize)>,
    pub unassigned_agents: Vec<String>,
    pub unassigned_destinations: Vec<String>,
}

impl DispatchReport {
    /// True when any matrix cell fell back to the great-circle estimate.
    pub fn is_degraded(&self) -> bool {
        !self.degraded_cells.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Planner<R> {
    routing: R,
    options: PlannerOptions,
}

impl<R> Planner<R>
where
    R: RoutingService,
{
    pub fn new(routing: R) -> Self {
        Self::with_options(routing, PlannerOptions::default())
    }

    pub fn with_options(routing: R, options: PlannerOptions) -> Self {
        Self { routing, options }
    }

    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    /// Pulls a snapshot, plans it and publishes the report.
    ///
    /// Nothing reaches `sink` if the run fails or is cancelled.
    pub fn run<S, K>(&self, source: &S, sink: &mut K, cancel: &CancelToken) -> Result<(), PlanError>
    where
        S: EntitySource + ?Sized,
        K: ResultSink + ?Sized,
    {
        let snapshot = source.snapshot();
        let report = self.plan(&snapshot, cancel)?;
        if cancel.is_cancelled() {
            return Err(PlanError::Cancelled);
        }
        sink.publish(&report);
        Ok(())
    }

    #[instrument(
        skip_all,
        fields(agents = snapshot.agents.len(), destinations = snapshot.destinations.len())
    )]
    pub fn plan(&self, snapshot: &Snapshot, cancel: &CancelToken) -> Result<DispatchReport, PlanError> {
        let depot = snapshot.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.options.max_in_flight.max(1))
            .build()?;

        let matrix = MatrixBuilder::new(&self.routing, &pool)
            .max_attempts(self.options.max_attempts)
            .cancel_token(cancel.clone())
            .build(depot, &snapshot.agents, &snapshot.destinations)?;

        let degraded_cells = matrix.degraded_cells();
        if !degraded_cells.is_empty() {
            warn!(
                degraded = degraded_cells.len(),
                cells = matrix.rows() * matrix.cols(),
                "cost matrix contains great-circle estimates"
            );
        }

        let padded = matrix.pad();
        let assignment = solver::solve(&padded)?;
        let pairs: Vec<(usize, usize)> = assignment
            .real_pairs(padded.real_rows(), padded.real_cols())
            .collect();
        debug!(pairs = pairs.len(), "assignment solved");

        if cancel.is_cancelled() {
            return Err(PlanError::Cancelled);
        }

        let geometries = self.fetch_geometries(&pool, snapshot, depot, &pairs, cancel)?;

        let results: Vec<DispatchResult> = pairs
            .iter()
            .zip(geometries)
            .map(|(&(row, col), geometry)| DispatchResult {
                agent_id: snapshot.agents[row].id.clone(),
                destination_id: snapshot.destinations[col].id.clone(),
                cost_km: matrix.get(row, col),
                cost_source: matrix.source(row, col),
                geometry,
            })
            .collect();

        let total_cost_km = results.iter().map(|result| result.cost_km).sum();
        let unassigned_agents = unmatched(&snapshot.agents, pairs.iter().map(|&(row, _)| row))
            .map(|agent: &Agent| agent.id.clone())
            .collect();
        let unassigned_destinations =
            unmatched(&snapshot.destinations, pairs.iter().map(|&(_, col)| col))
                .map(|destination: &Destination| destination.id.clone())
                .collect();

        Ok(DispatchReport {
            results,
            total_cost_km,
            degraded_cells,
            unassigned_agents,
            unassigned_destinations,
        })
    }

    fn fetch_geometries(
        &self,
        pool: &ThreadPool,
        snapshot: &Snapshot,
        depot: Coordinate,
        pairs: &[(usize, usize)],
        cancel: &CancelToken,
    ) -> Result<Vec<Polyline>, PlanError> {
        pool.install(|| {
            pairs
                .par_iter()
                .map(|&(row, col)| {
                    self.fetch_geometry(
                        &snapshot.agents[row],
                        depot,
                        &snapshot.destinations[col],
                        cancel,
                    )
                })
                .collect()
        })
    }

    /// Single attempt; a failure only costs this result its geometry.
    fn fetch_geometry(
        &self,
        agent: &Agent,
        depot: Coordinate,
        destination: &Destination,
        cancel: &CancelToken,
    ) -> Result<Polyline, PlanError> {
        if cancel.is_cancelled() {
            return Err(PlanError::Cancelled);
        }

        let waypoints = [agent.location, depot, destination.location];
        let details = match self.routing.route(&waypoints) {
            Ok(details) => details,
            Err(err) => {
                warn!(
                    agent = %agent.id,
                    destination = %destination.id,
                    error = %err,
                    "route geometry unavailable"
                );
                return Ok(Polyline::empty());
            }
        };

        match polyline::decode(&details.encoded_geometry) {
            Ok(geometry) => Ok(geometry),
            Err(err) => {
                warn!(
                    agent = %agent.id,
                    destination = %destination.id,
                    error = %err,
                    "dropping malformed route geometry"
                );
                Ok(Polyline::empty())
            }
        }
    }
}

/// Entities whose position never appears in `matched`.
fn unmatched<T>(entities: &[T], matched: impl Iterator<Item = usize>) -> impl Iterator<Item = &T> {
    let mut used = vec![false; entities.len()];
    for index in matched {
        used[index] = true;
    }
    entities
        .iter()
        .zip(used)
        .filter(|(_, used)| !used)
        .map(|(entity, _)| entity)
}
