//! Polyline representation for route geometries.
//!
//! Routing services return geometry in the encoded polyline format
//! (precision 1e5, zigzag deltas in 5-bit chunks offset by 63). [`decode`]
//! turns that into a [`Polyline`] of validated coordinates at the boundary;
//! [`encode`] is the inverse and mostly serves fixtures.

use serde::{Deserialize, Serialize};

use crate::error::PolylineError;
use crate::model::Coordinate;

const PRECISION: f64 = 1e5;
const CHAR_OFFSET: u8 = 63;
const CONTINUATION: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;

/// A route geometry as decoded coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Decodes an encoded polyline into coordinates, latitude first.
pub fn decode(encoded: &str) -> Result<Polyline, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut position = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while position < bytes.len() {
        let (delta_lat, next) = decode_value(bytes, position)?;
        if next >= bytes.len() {
            // Latitude without its longitude.
            return Err(PolylineError::MalformedEncoding { position: next });
        }
        let (delta_lng, next) = decode_value(bytes, next)?;

        lat += delta_lat;
        lng += delta_lng;
        let point = Coordinate::new(lat as f64 / PRECISION, lng as f64 / PRECISION)
            .map_err(|_| PolylineError::MalformedEncoding { position: next })?;
        points.push(point);
        position = next;
    }

    Ok(Polyline::new(points))
}

/// Reads one zigzag value starting at `start`; returns it with the next offset.
fn decode_value(bytes: &[u8], start: usize) -> Result<(i64, usize), PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0;
    let mut position = start;

    loop {
        let byte = *bytes
            .get(position)
            .ok_or(PolylineError::MalformedEncoding { position })?;
        if !(CHAR_OFFSET..=b'~').contains(&byte) {
            return Err(PolylineError::InvalidCharacter { position, byte });
        }
        // Anything past 60 bits cannot come from a real coordinate.
        if shift > 60 {
            return Err(PolylineError::MalformedEncoding { position });
        }

        let chunk = i64::from(byte - CHAR_OFFSET);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;
        position += 1;

        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    let value = if result & 1 != 0 { !(result >> 1) } else { result >> 1 };
    Ok((value, position))
}

/// Encodes coordinates, rounding each component to 1e-5 degrees.
pub fn encode(points: &[Coordinate]) -> String {
    let mut encoded = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.lat() * PRECISION).round() as i64;
        let lng = (point.lng() * PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut encoded);
        encode_value(lng - prev_lng, &mut encoded);
        prev_lat = lat;
        prev_lng = lng;
    }

    encoded
}

fn encode_value(delta: i64, out: &mut String) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= CONTINUATION {
        out.push(char::from(((CONTINUATION | (value & CHUNK_MASK)) as u8) + CHAR_OFFSET));
        value >>= 5;
    }
    out.push(char::from(value as u8 + CHAR_OFFSET));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn reference_points() -> Vec<Coordinate> {
        vec![coord(38.5, -120.2), coord(40.7, -120.95), coord(43.252, -126.453)]
    }

    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn assert_close(actual: &[Coordinate], expected: &[Coordinate]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a.lat() - e.lat()).abs() <= 1e-5, "{:?} vs {:?}", a, e);
            assert!((a.lng() - e.lng()).abs() <= 1e-5, "{:?} vs {:?}", a, e);
        }
    }

    #[test]
    fn test_decode_reference_polyline() {
        let polyline = decode(REFERENCE).unwrap();
        assert_close(polyline.points(), &reference_points());
    }

    #[test]
    fn test_encode_reference_polyline() {
        assert_eq!(encode(&reference_points()), REFERENCE);
    }

    #[test]
    fn test_round_trip_within_precision() {
        let points = vec![
            coord(18.520_43, 73.856_74),
            coord(18.520_431, 73.856_749),
            coord(-33.868_82, 151.209_29),
            coord(0.0, 0.0),
            coord(89.999_99, -179.999_99),
        ];
        let decoded = decode(&encode(&points)).unwrap();
        assert_close(decoded.points(), &points);
    }

    #[test]
    fn test_empty_string_decodes_to_empty_polyline() {
        let polyline = decode("").unwrap();
        assert!(polyline.is_empty());
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn test_truncated_chunk_is_malformed() {
        // Drop the final byte so the last longitude ends on a continuation chunk.
        let truncated = &REFERENCE[..REFERENCE.len() - 1];
        assert_eq!(
            decode(truncated),
            Err(PolylineError::MalformedEncoding {
                position: truncated.len()
            })
        );
    }

    #[test]
    fn test_missing_longitude_is_malformed() {
        // "_p~iF" is a complete latitude only.
        assert_eq!(
            decode("_p~iF"),
            Err(PolylineError::MalformedEncoding { position: 5 })
        );
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            decode("_p~iF ps|U"),
            Err(PolylineError::InvalidCharacter {
                position: 5,
                byte: b' '
            })
        );
    }

    #[test]
    fn test_out_of_range_point_is_malformed() {
        // Latitude delta of 100 degrees.
        let mut encoded = String::new();
        encode_value(10_000_000, &mut encoded);
        encode_value(0, &mut encoded);
        assert!(matches!(
            decode(&encoded),
            Err(PolylineError::MalformedEncoding { .. })
        ));
    }

    #[test]
    fn test_polyline_accessors() {
        let polyline = Polyline::new(reference_points());
        assert_eq!(polyline.len(), 3);
        assert!(!polyline.is_empty());
        assert_eq!(polyline.clone().into_points(), reference_points());
        assert!(Polyline::empty().is_empty());
    }
}
