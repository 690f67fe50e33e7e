//! dispatch-planner core
//!
//! Assigns delivery agents to destinations through a single depot: builds a
//! routed cost matrix, solves the assignment problem with the Hungarian
//! algorithm and decodes the route geometry of every chosen trip.

pub mod cancel;
pub mod config;
pub mod error;
pub mod haversine;
pub mod matrix;
pub mod model;
pub mod ors;
pub mod osrm;
pub mod planner;
pub mod polyline;
pub mod solver;
pub mod traits;

pub use cancel::CancelToken;
pub use error::{ConfigError, InputError, PlanError, PolylineError, RoutingError, SolverError};
pub use model::{Agent, Coordinate, Destination, Snapshot};
pub use planner::{DispatchReport, DispatchResult, Planner, PlannerOptions};
