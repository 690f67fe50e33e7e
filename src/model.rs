//! Domain model: coordinates and the entities placed on the map.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// A validated WGS84 position.
///
/// Latitude is within [-90, 90], longitude within [-180, 180], both finite.
/// Values outside those ranges are rejected by [`Coordinate::new`] and by
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LatLng")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl TryFrom<LatLng> for Coordinate {
    type Error = InputError;

    fn try_from(value: LatLng) -> Result<Self, Self::Error> {
        Coordinate::new(value.lat, value.lng)
    }
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, InputError> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);

        if valid {
            Ok(Self { lat, lng })
        } else {
            Err(InputError::InvalidCoordinate { lat, lng })
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// A delivery agent. The id is opaque metadata; matrices index agents by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub location: Coordinate,
}

impl Agent {
    pub fn new(id: impl Into<String>, location: Coordinate) -> Self {
        Self {
            id: id.into(),
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: String,
    pub location: Coordinate,
}

impl Destination {
    pub fn new(id: impl Into<String>, location: Coordinate) -> Self {
        Self {
            id: id.into(),
            location,
        }
    }
}

/// The entities on the map at the moment an optimization run starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub depot: Option<Coordinate>,
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub destinations: Vec<Destination>,
}

impl Snapshot {
    /// Checks the snapshot can be planned and returns the depot.
    pub fn validate(&self) -> Result<Coordinate, InputError> {
        let depot = self.depot.ok_or(InputError::MissingDepot)?;
        if self.agents.is_empty() {
            return Err(InputError::NoAgents);
        }
        if self.destinations.is_empty() {
            return Err(InputError::NoDestinations);
        }

        let mut seen = HashSet::new();
        for agent in &self.agents {
            if !seen.insert(agent.id.as_str()) {
                return Err(InputError::DuplicateAgent(agent.id.clone()));
            }
        }

        let mut seen = HashSet::new();
        for destination in &self.destinations {
            if !seen.insert(destination.id.as_str()) {
                return Err(InputError::DuplicateDestination(destination.id.clone()));
            }
        }

        Ok(depot)
    }
}
