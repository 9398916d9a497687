//! Bad-lock removal.
//!
//! When a rider ends a trip without locking the bike, the device keeps logging
//! breadcrumbs from the same spot. Those trailing near-stationary samples inflate
//! the ride duration and dwell time, so they are stripped before annotation.

use log::debug;

use crate::geo_utils::haversine_distance;
use crate::{MetricsConfig, RawPoint, RideError};

/// Strip the trailing run of stationary points from a ride.
///
/// Scans backwards from the last point. A point is dropped while its distance
/// from the preceding point is below `config.stationary_threshold_m`; the scan
/// stops at the first point at or above the threshold, which is kept together
/// with everything before it. The first point is never dropped.
///
/// Returns a prefix view of `points`; the input is left untouched.
///
/// # Errors
///
/// - [`RideError::InsufficientData`] if `points` is empty
/// - [`RideError::InvalidCoordinate`] if a scanned point has an invalid coordinate
///
/// # Example
///
/// ```rust
/// use ride_metrics::{MetricsConfig, RawPoint, strip_bad_locks};
///
/// let points = vec![
///     RawPoint::new(40.000, -73.0, 0, "bike"),
///     RawPoint::new(40.001, -73.0, 1, "bike"),    // ~111m
///     RawPoint::new(40.00101, -73.0, 2, "bike"),  // ~1m, left unlocked
/// ];
///
/// let cleaned = strip_bad_locks(&points, &MetricsConfig::default()).unwrap();
/// assert_eq!(cleaned.len(), 2);
/// ```
pub fn strip_bad_locks<'a>(
    points: &'a [RawPoint],
    config: &MetricsConfig,
) -> Result<&'a [RawPoint], RideError> {
    if points.is_empty() {
        return Err(RideError::InsufficientData { points: 0 });
    }

    let mut end = points.len();
    while end > 1 {
        let displacement =
            haversine_distance(&points[end - 2].position(), &points[end - 1].position())?;
        if displacement >= config.stationary_threshold_m {
            break;
        }
        end -= 1;
    }

    if end < points.len() {
        debug!(
            "[Cleaning] Dropped {} trailing stationary points ({} kept)",
            points.len() - end,
            end
        );
    }

    Ok(&points[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::meridian_track;

    #[test]
    fn test_trailing_stationary_points_removed() {
        let points = meridian_track(&[50.0, 50.0, 10.0, 5.0]);
        let cleaned = strip_bad_locks(&points, &MetricsConfig::default()).unwrap();
        assert_eq!(cleaned.len(), 3);
        assert_eq!(cleaned, &points[..3]);
    }

    #[test]
    fn test_moving_ride_untouched() {
        let points = meridian_track(&[50.0, 40.0, 35.0]);
        let cleaned = strip_bad_locks(&points, &MetricsConfig::default()).unwrap();
        assert_eq!(cleaned.len(), points.len());
    }

    #[test]
    fn test_only_trailing_run_is_removed() {
        // Stationary samples mid-ride must survive
        let points = meridian_track(&[50.0, 5.0, 5.0, 50.0, 5.0]);
        let cleaned = strip_bad_locks(&points, &MetricsConfig::default()).unwrap();
        assert_eq!(cleaned.len(), 5);
    }

    #[test]
    fn test_threshold_point_is_kept() {
        let config = MetricsConfig::default();
        let points = meridian_track(&[50.0, 30.5, 29.5]);
        let cleaned = strip_bad_locks(&points, &config).unwrap();
        assert_eq!(cleaned.len(), 3);
    }

    #[test]
    fn test_fully_stationary_ride_keeps_first_point() {
        let points = meridian_track(&[1.0, 2.0, 0.0, 3.0]);
        let cleaned = strip_bad_locks(&points, &MetricsConfig::default()).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0], points[0]);
    }

    #[test]
    fn test_single_point_ride() {
        let points = meridian_track(&[]);
        let cleaned = strip_bad_locks(&points, &MetricsConfig::default()).unwrap();
        assert_eq!(cleaned.len(), 1);
    }

    #[test]
    fn test_empty_ride_rejected() {
        let result = strip_bad_locks(&[], &MetricsConfig::default());
        assert!(matches!(result, Err(RideError::InsufficientData { points: 0 })));
    }

    #[test]
    fn test_never_empty_and_first_point_preserved() {
        let shapes: [&[f64]; 5] = [
            &[],
            &[0.0],
            &[100.0, 0.0, 0.0],
            &[10.0, 10.0, 10.0, 10.0],
            &[-60.0, 60.0, -5.0],
        ];
        for steps in shapes {
            let points = meridian_track(steps);
            let cleaned = strip_bad_locks(&points, &MetricsConfig::default()).unwrap();
            assert!(!cleaned.is_empty());
            assert_eq!(cleaned[0], points[0]);
        }
    }

    #[test]
    fn test_invalid_coordinate_reported() {
        let mut points = meridian_track(&[5.0]);
        points[1].latitude = 123.0;
        let result = strip_bad_locks(&points, &MetricsConfig::default());
        assert!(matches!(result, Err(RideError::InvalidCoordinate { .. })));
    }
}
