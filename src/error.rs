//! Error types for the dispatch planner.
//!
//! Only [`InputError`], [`SolverError`] and cancellation abort a run.
//! Routing and polyline failures are recovered where they happen.

use thiserror::Error;

/// Snapshot problems detected before any matrix is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("no depot has been placed")]
    MissingDepot,
    #[error("at least one agent is required")]
    NoAgents,
    #[error("at least one destination is required")]
    NoDestinations,
    #[error("duplicate agent id `{0}`")]
    DuplicateAgent(String),
    #[error("duplicate destination id `{0}`")]
    DuplicateDestination(String),
    #[error("coordinate ({lat}, {lng}) is out of range or not finite")]
    InvalidCoordinate { lat: f64, lng: f64 },
}

/// Failure of a single request to the routing service.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("routing service returned `{code}`: {message}")]
    Service { code: String, message: String },
    #[error("routing service returned no route")]
    NoRoute,
    #[error("a route needs at least two waypoints, got {0}")]
    TooFewWaypoints(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("encoded polyline ends mid-value at byte {position}")]
    MalformedEncoding { position: usize },
    #[error("invalid polyline byte {byte:#04x} at {position}")]
    InvalidCharacter { position: usize, byte: u8 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("invalid cost matrix: {0}")]
    InvalidMatrix(String),
    #[error("solver exceeded its iteration bound after {iterations} rounds")]
    Divergence { iterations: usize },
}

/// Configuration errors surface at startup, never per request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` must be set")]
    MissingApiKey(&'static str),
    #[error("environment variable `{var}` has invalid value `{value}`")]
    InvalidValue { var: &'static str, value: String },
}

/// Errors that end an optimization run without a result.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("optimization run was cancelled")]
    Cancelled,
}
