//! OpenRouteService HTTP adapter for routed paths.
//!
//! Uses the directions endpoint with a JSON body so a route can pass through
//! the depot. Requires an API key.

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

use crate::error::RoutingError;
use crate::model::Coordinate;
use crate::traits::{RouteDetails, RoutingService};

#[derive(Debug, Clone)]
pub struct OrsConfig {
    pub base_url: String,
    pub profile: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl OrsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.openrouteservice.org".to_string(),
            profile: "driving-car".to_string(),
            api_key: api_key.into(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrsClient {
    config: OrsConfig,
    client: reqwest::blocking::Client,
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn directions_url(&self) -> String {
        format!(
            "{}/v2/directions/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile
        )
    }
}

impl RoutingService for OrsClient {
    fn route(&self, waypoints: &[Coordinate]) -> Result<RouteDetails, RoutingError> {
        if waypoints.len() < 2 {
            return Err(RoutingError::TooFewWaypoints(waypoints.len()));
        }

        let body = self
            .client
            .post(self.directions_url())
            .header(AUTHORIZATION, self.config.api_key.as_str())
            .json(&DirectionsRequest::new(waypoints))
            .send()?
            .json::<DirectionsResponse>()?;

        body.into_details()
    }
}

#[derive(Debug, Serialize)]
struct DirectionsRequest {
    /// `[lng, lat]` pairs.
    coordinates: Vec<[f64; 2]>,
}

impl DirectionsRequest {
    fn new(waypoints: &[Coordinate]) -> Self {
        Self {
            coordinates: waypoints
                .iter()
                .map(|point| [point.lng(), point.lat()])
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    summary: RouteSummary,
    #[serde(default)]
    geometry: String,
}

/// ORS omits both fields for zero-length routes.
#[derive(Debug, Deserialize)]
struct RouteSummary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

impl DirectionsResponse {
    fn into_details(self) -> Result<RouteDetails, RoutingError> {
        if let Some(error) = self.error {
            return Err(service_error(error));
        }

        let route = self.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;
        Ok(RouteDetails {
            distance_m: route.summary.distance,
            duration_ms: (route.summary.duration * 1000.0).round().max(0.0) as u64,
            encoded_geometry: route.geometry,
        })
    }
}

/// ORS errors are either a bare string or `{ "code": 2010, "message": ".." }`.
fn service_error(error: serde_json::Value) -> RoutingError {
    match error {
        serde_json::Value::String(message) => RoutingError::Service {
            code: "error".to_string(),
            message,
        },
        other => RoutingError::Service {
            code: other
                .get("code")
                .map(|code| code.to_string())
                .unwrap_or_else(|| "error".to_string()),
            message: other
                .get("message")
                .and_then(|message| message.as_str())
                .unwrap_or_default()
                .to_string(),
        },
    }
}
