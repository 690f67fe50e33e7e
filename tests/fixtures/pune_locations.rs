//! Pune locations for realistic test fixtures.
//!
//! Coordinates are real, routable points around central Pune, where the map
//! tool is centered by default.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }
}

/// Restaurants used as the depot.
pub const RESTAURANTS: &[Location] = &[
    Location::new("Vaishali, FC Road", 18.5207, 73.8412),
    Location::new("Kayani Bakery, Camp", 18.5166, 73.8797),
    Location::new("Shabree, Deccan", 18.5165, 73.8415),
];

/// Where delivery agents wait for orders.
pub const AGENT_SPOTS: &[Location] = &[
    Location::new("Shivajinagar Station", 18.5314, 73.8446),
    Location::new("Swargate Bus Stand", 18.5018, 73.8636),
    Location::new("Pune Junction", 18.5289, 73.8744),
    Location::new("Kothrud Depot", 18.5074, 73.8077),
    Location::new("Koregaon Park Lane 5", 18.5362, 73.8940),
    Location::new("Aundh ITI Road", 18.5590, 73.8078),
];

/// Delivery addresses.
pub const CUSTOMERS: &[Location] = &[
    Location::new("Baner Road", 18.5590, 73.7868),
    Location::new("Viman Nagar", 18.5679, 73.9143),
    Location::new("Hadapsar", 18.5089, 73.9260),
    Location::new("Sinhagad Road", 18.4767, 73.8263),
    Location::new("Model Colony", 18.5286, 73.8375),
    Location::new("Kalyani Nagar", 18.5463, 73.9033),
    Location::new("Bibwewadi", 18.4718, 73.8640),
];
