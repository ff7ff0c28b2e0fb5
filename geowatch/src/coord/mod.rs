//! Geographic coordinate types.
//!
//! Provides the WGS84 point and polygon ring types shared by the geometry,
//! geofence and monitor modules. No range validation happens here; fixes are
//! expected to arrive already validated by the location source.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
///
/// Matches `chrono::DateTime::timestamp_millis`, which is what [`crate::clock::SystemClock`]
/// reports.
pub type TimestampMs = i64;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Create a coordinate from an `[lng, lat]` pair (GeoJSON order).
    pub fn from_lng_lat(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[1],
            lng: pair[0],
        }
    }

    /// Return this coordinate as an `(x, y)` = `(lng, lat)` pair.
    #[inline]
    pub fn to_lng_lat(&self) -> (f64, f64) {
        (self.lng, self.lat)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// A single closed polygon ring.
///
/// The last vertex implicitly connects back to the first, so the ring should
/// not repeat its first vertex (a repeated vertex is harmless: it adds a
/// zero-length edge that never crosses the test ray).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    vertices: Vec<Coordinate>,
}

impl Polygon {
    /// Minimum vertex count for a ring that can enclose anything.
    pub const MIN_VERTICES: usize = 3;

    /// Create a polygon from an ordered vertex list.
    pub fn new(vertices: Vec<Coordinate>) -> Self {
        Self { vertices }
    }

    /// Create a polygon from `[lng, lat]` pairs.
    pub fn from_lng_lat(ring: &[[f64; 2]]) -> Self {
        Self {
            vertices: ring.iter().copied().map(Coordinate::from_lng_lat).collect(),
        }
    }

    /// The ring's vertices in order.
    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True when the ring has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// True when the ring has too few vertices to enclose an area.
    ///
    /// Degenerate polygons never contain any point.
    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < Self::MIN_VERTICES
    }

    /// Return the same ring starting at vertex `n` (modulo the length).
    pub fn rotated(&self, n: usize) -> Self {
        let mut vertices = self.vertices.clone();
        if !vertices.is_empty() {
            let len = vertices.len();
            vertices.rotate_left(n % len);
        }
        Self { vertices }
    }
}

impl From<Vec<Coordinate>> for Polygon {
    fn from(vertices: Vec<Coordinate>) -> Self {
        Self::new(vertices)
    }
}

impl FromIterator<Coordinate> for Polygon {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod coordinate {
        use super::*;

        #[test]
        fn test_from_lng_lat_swaps_order() {
            let coord = Coordinate::from_lng_lat([9.99, 53.55]);
            assert_eq!(coord.lat, 53.55);
            assert_eq!(coord.lng, 9.99);
            assert_eq!(coord.to_lng_lat(), (9.99, 53.55));
        }

        #[test]
        fn test_display() {
            let coord = Coordinate::new(-33.9, -70.6);
            assert_eq!(format!("{}", coord), "(-33.900000, -70.600000)");
        }

        #[test]
        fn test_serde_field_names() {
            let json = serde_json::to_string(&Coordinate::new(1.5, 2.5)).unwrap();
            assert_eq!(json, r#"{"lat":1.5,"lng":2.5}"#);
        }
    }

    mod polygon {
        use super::*;

        fn square() -> Polygon {
            Polygon::from_lng_lat(&[[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]])
        }

        #[test]
        fn test_degenerate_below_three_vertices() {
            assert!(Polygon::default().is_degenerate());
            assert!(Polygon::from_lng_lat(&[[0.0, 0.0]]).is_degenerate());
            assert!(Polygon::from_lng_lat(&[[0.0, 0.0], [1.0, 1.0]]).is_degenerate());
            assert!(!square().is_degenerate());
        }

        #[test]
        fn test_rotated_keeps_cycle() {
            let ring = square();
            let rotated = ring.rotated(1);
            assert_eq!(rotated.len(), 4);
            assert_eq!(rotated.vertices()[0], ring.vertices()[1]);
            assert_eq!(rotated.vertices()[3], ring.vertices()[0]);
            assert_eq!(ring.rotated(4), ring);
        }

        #[test]
        fn test_rotated_empty() {
            assert!(Polygon::default().rotated(3).is_empty());
        }
    }
}
