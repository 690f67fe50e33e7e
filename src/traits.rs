//! Seams to the collaborators around the assignment engine.
//!
//! The engine itself never talks HTTP or draws anything. Concrete apps plug
//! in a routing backend, a source of entities and a place to publish results.

use serde::{Deserialize, Serialize};

use crate::error::RoutingError;
use crate::model::{Coordinate, Snapshot};
use crate::planner::DispatchReport;

/// Summary of one routed path as returned by a routing backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDetails {
    /// Road distance in meters.
    pub distance_m: f64,
    /// Travel time in milliseconds.
    pub duration_ms: u64,
    /// Geometry in encoded polyline format (precision 1e5).
    pub encoded_geometry: String,
}

/// Routes an ordered list of waypoints over the road network.
///
/// Implementations are called concurrently from a bounded worker pool.
pub trait RoutingService: Send + Sync {
    fn route(&self, waypoints: &[Coordinate]) -> Result<RouteDetails, RoutingError>;
}

impl<T: RoutingService + ?Sized> RoutingService for &T {
    fn route(&self, waypoints: &[Coordinate]) -> Result<RouteDetails, RoutingError> {
        (**self).route(waypoints)
    }
}

/// Provides the depot, agents and destinations when a run starts.
pub trait EntitySource {
    fn snapshot(&self) -> Snapshot;
}

impl EntitySource for Snapshot {
    fn snapshot(&self) -> Snapshot {
        self.clone()
    }
}

/// Receives each finished run, once and as a whole.
pub trait ResultSink {
    fn publish(&mut self, report: &DispatchReport);
}

impl ResultSink for Vec<DispatchReport> {
    fn publish(&mut self, report: &DispatchReport) {
        self.push(report.clone());
    }
}
