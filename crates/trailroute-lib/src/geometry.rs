//! Geodesic helpers shared by the graph builder, the search heuristic and the
//! turn instruction generator.
//!
//! Distances and bearings go through [`geo::Haversine`] so every component sees
//! exactly the same numbers for the same pair of points.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use geo::{Bearing, Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean earth radius in metres, matching the radius used by [`geo::Haversine`].
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance in metres.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        Haversine.distance(self.to_point(), other.to_point())
    }

    /// Initial bearing towards `other` in degrees clockwise from north, in `[0, 360)`.
    pub fn bearing_to(&self, other: &Coordinate) -> f64 {
        Haversine
            .bearing(self.to_point(), other.to_point())
            .rem_euclid(360.0)
    }

    /// Earth-centred cartesian position in metres on a spherical earth.
    ///
    /// Straight-line (chord) distance between two of these positions grows
    /// monotonically with great-circle distance, which is what lets a KD-tree
    /// answer haversine nearest-neighbour queries.
    pub fn to_cartesian(&self) -> [f64; 3] {
        let lat = self.latitude.to_radians();
        let lon = self.longitude.to_radians();
        [
            EARTH_RADIUS_M * lat.cos() * lon.cos(),
            EARTH_RADIUS_M * lat.cos() * lon.sin(),
            EARTH_RADIUS_M * lat.sin(),
        ]
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Parses `"lat,lon"`.
impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = || Error::InvalidRequest {
            message: format!("expected coordinate as 'lat,lon', got '{value}'"),
        };

        let (lat, lon) = value.split_once(',').ok_or_else(invalid)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let longitude: f64 = lon.trim().parse().map_err(|_| invalid())?;
        let coordinate = Coordinate::new(latitude, longitude);
        if !coordinate.is_valid() {
            return Err(invalid());
        }
        Ok(coordinate)
    }
}

/// Sum of haversine distances along consecutive points.
pub fn path_length(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].distance_to(&pair[1]))
        .sum()
}

/// Chord length in metres for a great-circle distance in metres.
///
/// Arcs of half the circumference or more (including infinity) map to the
/// diameter, so the chord never shrinks as the arc grows.
pub(crate) fn chord_length(arc_m: f64) -> f64 {
    let arc_m = arc_m.min(PI * EARTH_RADIUS_M);
    2.0 * EARTH_RADIUS_M * (arc_m / (2.0 * EARTH_RADIUS_M)).sin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);
        assert_relative_eq!(a.distance_to(&b), 111_195.0, max_relative = 1e-3);
    }

    #[test]
    fn bearings_are_normalised_to_compass_range() {
        let origin = Coordinate::new(0.0, 0.0);
        assert_relative_eq!(
            origin.bearing_to(&Coordinate::new(1.0, 0.0)),
            0.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            origin.bearing_to(&Coordinate::new(0.0, 1.0)),
            90.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            origin.bearing_to(&Coordinate::new(0.0, -1.0)),
            270.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn parses_lat_lon_pairs() {
        let parsed: Coordinate = "46.5, 7.25".parse().expect("valid coordinate");
        assert_eq!(parsed, Coordinate::new(46.5, 7.25));
        assert!("46.5".parse::<Coordinate>().is_err());
        assert!("91.0,0.0".parse::<Coordinate>().is_err());
        assert!("abc,0.0".parse::<Coordinate>().is_err());
    }

    #[test]
    fn chord_never_exceeds_arc() {
        for arc in [0.0, 1.0, 500.0, 10_000.0, 1_000_000.0] {
            assert!(chord_length(arc) <= arc + 1e-9);
        }
    }

    #[test]
    fn chord_saturates_at_the_diameter() {
        let diameter = 2.0 * EARTH_RADIUS_M;
        for arc in [PI * EARTH_RADIUS_M, 40_000_000.0, f64::MAX, f64::INFINITY] {
            assert_relative_eq!(chord_length(arc), diameter, max_relative = 1e-12);
        }
        assert!(chord_length(25_000_000.0) < chord_length(40_000_000.0));
    }

    #[test]
    fn cartesian_chord_matches_arc_for_short_hops() {
        let a = Coordinate::new(46.0, 7.0);
        let b = Coordinate::new(46.001, 7.001);
        let [ax, ay, az] = a.to_cartesian();
        let [bx, by, bz] = b.to_cartesian();
        let chord = ((ax - bx).powi(2) + (ay - by).powi(2) + (az - bz).powi(2)).sqrt();
        assert_relative_eq!(chord, chord_length(a.distance_to(&b)), max_relative = 1e-6);
    }
}
