//! Test fixtures for dispatch-planner.
//!
//! Provides realistic test data including:
//! - Real Pune locations for depots, agents and customers
//! - Snapshot builders
//! - A scriptable in-memory routing service

pub mod pune_locations;

pub use pune_locations::*;

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use dispatch_planner::error::RoutingError;
use dispatch_planner::haversine;
use dispatch_planner::polyline;
use dispatch_planner::traits::{RouteDetails, RoutingService};
use dispatch_planner::{Agent, Coordinate, Destination, Snapshot};

/// Road distance relative to the great-circle distance.
pub const DETOUR_FACTOR: f64 = 1.3;

pub fn coordinate(location: &Location) -> Coordinate {
    Coordinate::new(location.lat, location.lng).expect("fixture coordinate in range")
}

/// Depot at the first restaurant, `agents` agent spots and `destinations` customers.
pub fn snapshot(agents: usize, destinations: usize) -> Snapshot {
    Snapshot {
        depot: Some(coordinate(&RESTAURANTS[0])),
        agents: AGENT_SPOTS[..agents]
            .iter()
            .enumerate()
            .map(|(i, spot)| Agent::new(format!("agent-{}", i + 1), coordinate(spot)))
            .collect(),
        destinations: CUSTOMERS[..destinations]
            .iter()
            .enumerate()
            .map(|(i, customer)| Destination::new(format!("dest-{}", i + 1), coordinate(customer)))
            .collect(),
    }
}

/// Route through the waypoints at [`DETOUR_FACTOR`] times the great-circle
/// length, with the waypoints themselves as geometry.
pub fn road_route(waypoints: &[Coordinate]) -> RouteDetails {
    let km: f64 = waypoints
        .windows(2)
        .map(|leg| haversine::distance_km(leg[0], leg[1]))
        .sum::<f64>()
        * DETOUR_FACTOR;

    RouteDetails {
        distance_m: km * 1000.0,
        // 30 km/h
        duration_ms: (km / 30.0 * 3_600_000.0).round() as u64,
        encoded_geometry: polyline::encode(waypoints),
    }
}

pub fn service_error(message: &str) -> RoutingError {
    RoutingError::Service {
        code: "TestFailure".to_string(),
        message: message.to_string(),
    }
}

type Behaviour = dyn Fn(&[Coordinate], usize) -> Result<RouteDetails, RoutingError> + Send + Sync;

/// In-memory routing service.
///
/// The behaviour closure receives the waypoints and the 1-based number of
/// times this exact path has been requested, so tests can fail the first
/// attempt, only the geometry request, and so on.
pub struct FakeRoads {
    behaviour: Box<Behaviour>,
    delay: Duration,
    calls: Mutex<HashMap<String, usize>>,
    total_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRoads {
    pub fn new() -> Self {
        Self::with_behaviour(|waypoints, _| Ok(road_route(waypoints)))
    }

    pub fn with_behaviour<F>(behaviour: F) -> Self
    where
        F: Fn(&[Coordinate], usize) -> Result<RouteDetails, RoutingError> + Send + Sync + 'static,
    {
        Self {
            behaviour: Box::new(behaviour),
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            total_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Simulated latency per request.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, waypoints: &[Coordinate]) -> usize {
        let calls = self.calls.lock().unwrap();
        calls.get(&path_key(waypoints)).copied().unwrap_or(0)
    }
}

impl RoutingService for FakeRoads {
    fn route(&self, waypoints: &[Coordinate]) -> Result<RouteDetails, RoutingError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(path_key(waypoints)).or_insert(0);
            *count += 1;
            *count
        };
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        let result = (self.behaviour)(waypoints, attempt);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn path_key(waypoints: &[Coordinate]) -> String {
    waypoints
        .iter()
        .map(|point| format!("{:.6},{:.6}", point.lat(), point.lng()))
        .collect::<Vec<_>>()
        .join(";")
}

/// Exhaustive minimum over all permutations; only for tiny square matrices.
pub fn brute_force_min_cost(rows: &[Vec<f64>]) -> f64 {
    fn search(rows: &[Vec<f64>], row: usize, used: &mut Vec<bool>, acc: f64, best: &mut f64) {
        if row == rows.len() {
            *best = best.min(acc);
            return;
        }
        for col in 0..rows.len() {
            if !used[col] {
                used[col] = true;
                search(rows, row + 1, used, acc + rows[row][col], best);
                used[col] = false;
            }
        }
    }

    let mut best = f64::INFINITY;
    let mut used = vec![false; rows.len()];
    search(rows, 0, &mut used, 0.0, &mut best);
    best
}
