//! OSRM HTTP adapter for routed paths (self-hosted, no API key).

use serde::Deserialize;

use crate::error::RoutingError;
use crate::model::Coordinate;
use crate::traits::{RouteDetails, RoutingService};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn route_url(&self, waypoints: &[Coordinate]) -> String {
        let coords = waypoints
            .iter()
            .map(|point| format!("{:.6},{:.6}", point.lng(), point.lat()))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=polyline",
            self.config.base_url, self.config.profile, coords
        )
    }
}

impl RoutingService for OsrmClient {
    fn route(&self, waypoints: &[Coordinate]) -> Result<RouteDetails, RoutingError> {
        if waypoints.len() < 2 {
            return Err(RoutingError::TooFewWaypoints(waypoints.len()));
        }

        // OSRM reports failures as JSON with a non-"Ok" code, often alongside
        // a 4xx status, so the body is parsed regardless of status.
        let body = self
            .client
            .get(self.route_url(waypoints))
            .send()?
            .json::<OsrmRouteResponse>()?;

        body.into_details()
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    geometry: String,
}

impl OsrmRouteResponse {
    fn into_details(self) -> Result<RouteDetails, RoutingError> {
        if self.code != "Ok" {
            return Err(RoutingError::Service {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }

        let route = self.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;
        Ok(RouteDetails {
            distance_m: route.distance,
            duration_ms: (route.duration * 1000.0).round().max(0.0) as u64,
            encoded_geometry: route.geometry,
        })
    }
}
