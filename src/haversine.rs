//! Great-circle distance (fallback when the routing service is unavailable).
//!
//! Ignores the road network, so it underestimates real travel cost. Used only
//! for matrix cells the routing service could not price.

use crate::model::Coordinate;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points in kilometers.
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    if from == to {
        return 0.0;
    }

    let lat1_rad = from.lat().to_radians();
    let lat2_rad = to.lat().to_radians();
    let delta_lat = (to.lat() - from.lat()).to_radians();
    let delta_lng = (to.lng() - from.lng()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Fallback cost of the trip `from -> depot -> to`.
pub fn via_depot_km(from: Coordinate, depot: Coordinate, to: Coordinate) -> f64 {
    distance_km(from, depot) + distance_km(depot, to)
}
