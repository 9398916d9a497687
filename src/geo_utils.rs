//! # Geographic Utilities
//!
//! Core geographic computation utilities for ride trace analysis.
//!
//! This module provides the spherical geometry the rest of the pipeline is built on.
//! All functions take WGS84 decimal-degree coordinates.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`initial_bearing`] | Initial compass bearing from one point towards another |
//! | [`destination_ahead`] | Whether a destination lies in front of a heading |
//!
//! ## Example
//!
//! ```rust
//! use ride_metrics::{GpsPoint, geo_utils};
//!
//! let start = GpsPoint::new(40.7128, -74.0060);
//! let end = GpsPoint::new(40.7228, -74.0060);
//!
//! let dist = geo_utils::haversine_distance(&start, &end).unwrap();
//! println!("Start to end: {:.0}m", dist);
//!
//! let heading = geo_utils::initial_bearing(&start, &end);
//! assert!(heading < 1.0); // due north
//!
//! assert!(geo_utils::destination_ahead(heading, &start, &end));
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Distances use the haversine formula on a sphere of radius [`EARTH_RADIUS_M`].
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)
//!
//! ### Half-plane Test
//!
//! [`destination_ahead`] works in raw degree space: it places two points a fixed
//! [`AHEAD_BUFFER_DEG`] to the rider's left and right and checks on which side of the
//! left-right line the destination falls.

use geo::kernels::{Kernel, Orientation, RobustKernel};
use geo::Coord;

use crate::{GpsPoint, RideError};

/// Mean Earth radius used for all distance calculations, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Offset of the left/right helper points in [`destination_ahead`], in decimal degrees.
pub const AHEAD_BUFFER_DEG: f64 = 0.01;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// Returns the distance in meters along the Earth's surface.
///
/// # Errors
///
/// Returns [`RideError::InvalidCoordinate`] if either point is out of range
/// (see [`GpsPoint::is_valid`]).
///
/// # Example
///
/// ```rust
/// use ride_metrics::{GpsPoint, geo_utils};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris).unwrap();
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> Result<f64, RideError> {
    for p in [p1, p2] {
        if !p.is_valid() {
            return Err(RideError::InvalidCoordinate {
                latitude: p.latitude,
                longitude: p.longitude,
            });
        }
    }

    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (p2.longitude - p1.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1.0 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    Ok(EARTH_RADIUS_M * c)
}

// =============================================================================
// Direction Functions
// =============================================================================

/// Calculate the initial compass bearing from `from` towards `to`.
///
/// The result is in degrees clockwise from true north, in the range `[0, 360)`.
///
/// # Example
///
/// ```rust
/// use ride_metrics::{GpsPoint, geo_utils};
///
/// let a = GpsPoint::new(0.0, 0.0);
/// let b = GpsPoint::new(0.0, 1.0);
///
/// let bearing = geo_utils::initial_bearing(&a, &b);
/// assert!((bearing - 90.0).abs() < 1e-9); // due east
/// ```
pub fn initial_bearing(from: &GpsPoint, to: &GpsPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let x = dlon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    // Adding before the remainder keeps tiny negative angles from landing on 360.0
    (x.atan2(y).to_degrees() + 360.0) % 360.0
}

/// Check whether `end` lies in the half-plane in front of a rider at `current`
/// travelling on `heading_deg`.
///
/// Two helper points are placed [`AHEAD_BUFFER_DEG`] to the left and right of
/// `current`, perpendicular to the heading. The destination is ahead when the
/// triple (left, right, end) turns counter-clockwise in lon/lat space. A
/// destination exactly on the left-right line is not ahead.
///
/// # Example
///
/// ```rust
/// use ride_metrics::{GpsPoint, geo_utils};
///
/// let here = GpsPoint::new(40.0, -73.0);
/// let north = GpsPoint::new(40.1, -73.0);
///
/// assert!(geo_utils::destination_ahead(0.0, &here, &north));
/// assert!(!geo_utils::destination_ahead(180.0, &here, &north));
/// ```
pub fn destination_ahead(heading_deg: f64, current: &GpsPoint, end: &GpsPoint) -> bool {
    let left = offset_point(current, (heading_deg - 90.0 + 360.0) % 360.0, AHEAD_BUFFER_DEG);
    let right = offset_point(current, (heading_deg + 90.0) % 360.0, AHEAD_BUFFER_DEG);
    let end = Coord { x: end.longitude, y: end.latitude };

    matches!(
        RobustKernel::orient2d(left, right, end),
        Orientation::CounterClockwise
    )
}

/// Move `origin` by `amount` degrees along a compass direction, treating lat/lon as a plane.
#[inline]
fn offset_point(origin: &GpsPoint, direction_deg: f64, amount: f64) -> Coord<f64> {
    let theta = direction_deg.to_radians();
    Coord {
        x: origin.longitude + theta.sin() * amount,
        y: origin.latitude + theta.cos() * amount,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = GpsPoint::new(51.5074, -0.1278);
        assert_eq!(haversine_distance(&p, &p).unwrap(), 0.0);
    }

    #[test]
    fn test_haversine_distance_known_value() {
        // London to Paris is approximately 344 km
        let london = GpsPoint::new(51.5074, -0.1278);
        let paris = GpsPoint::new(48.8566, 2.3522);
        let dist = haversine_distance(&london, &paris).unwrap();
        assert!(approx_eq(dist, 343_560.0, 5000.0));
    }

    #[test]
    fn test_haversine_distance_symmetric() {
        let a = GpsPoint::new(40.7128, -74.0060);
        let b = GpsPoint::new(40.7306, -73.9352);
        let ab = haversine_distance(&a, &b).unwrap();
        let ba = haversine_distance(&b, &a).unwrap();
        assert!(approx_eq(ab, ba, 1e-9));
    }

    #[test]
    fn test_haversine_distance_one_degree_of_latitude() {
        let a = GpsPoint::new(10.0, 20.0);
        let b = GpsPoint::new(11.0, 20.0);
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert!(approx_eq(haversine_distance(&a, &b).unwrap(), expected, 1e-6));
    }

    #[test]
    fn test_haversine_distance_rejects_invalid_coordinates() {
        let ok = GpsPoint::new(0.0, 0.0);
        let bad_lat = GpsPoint::new(90.5, 0.0);
        let bad_lon = GpsPoint::new(0.0, -180.5);

        match haversine_distance(&ok, &bad_lat) {
            Err(RideError::InvalidCoordinate { latitude, .. }) => assert_eq!(latitude, 90.5),
            other => panic!("expected InvalidCoordinate, got {:?}", other),
        }
        assert!(matches!(
            haversine_distance(&bad_lon, &ok),
            Err(RideError::InvalidCoordinate { .. })
        ));
        assert!(haversine_distance(&GpsPoint::new(f64::NAN, 0.0), &ok).is_err());
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GpsPoint::new(0.0, 0.0);
        assert!(approx_eq(initial_bearing(&origin, &GpsPoint::new(1.0, 0.0)), 0.0, 1e-9));
        assert!(approx_eq(initial_bearing(&origin, &GpsPoint::new(0.0, 1.0)), 90.0, 1e-9));
        assert!(approx_eq(initial_bearing(&origin, &GpsPoint::new(-1.0, 0.0)), 180.0, 1e-9));
        assert!(approx_eq(initial_bearing(&origin, &GpsPoint::new(0.0, -1.0)), 270.0, 1e-9));
    }

    #[test]
    fn test_bearing_always_in_range() {
        let origin = GpsPoint::new(45.0, 7.0);
        for i in 0..72 {
            let theta = (i as f64 * 5.0).to_radians();
            let target = GpsPoint::new(45.0 + 0.01 * theta.cos(), 7.0 + 0.01 * theta.sin());
            let bearing = initial_bearing(&origin, &target);
            assert!((0.0..360.0).contains(&bearing), "bearing {} out of range", bearing);
        }
        // Identical points degenerate to atan2(0, 0)
        let same = initial_bearing(&origin, &origin);
        assert!((0.0..360.0).contains(&same));
    }

    #[test]
    fn test_destination_ahead_and_behind() {
        let here = GpsPoint::new(40.0, -73.0);
        let north = GpsPoint::new(40.001, -73.0);
        let south = GpsPoint::new(39.999, -73.0);
        let east = GpsPoint::new(40.0, -72.999);

        assert!(destination_ahead(0.0, &here, &north));
        assert!(!destination_ahead(0.0, &here, &south));
        assert!(destination_ahead(180.0, &here, &south));
        assert!(destination_ahead(90.0, &here, &east));
        assert!(!destination_ahead(270.0, &here, &east));
    }

    #[test]
    fn test_destination_on_line_is_not_ahead() {
        // The left helper point itself sits exactly on the left-right line
        let here = GpsPoint::new(12.0, 34.0);
        let left = offset_point(&here, 270.0, AHEAD_BUFFER_DEG);
        let on_line = GpsPoint::new(left.y, left.x);
        assert!(!destination_ahead(0.0, &here, &on_line));
    }
}
