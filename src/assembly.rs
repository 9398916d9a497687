//! Enrichment of trip metrics with the optimal route and derived ratios.

use crate::{EnrichedMetrics, OptimalRoute, RideError, TripMetrics};

/// Meters per second to miles per hour.
pub const MPS_TO_MPH: f64 = 2.23694;

/// Combine trip metrics with the optimal route into the final feature record.
///
/// # Errors
///
/// Returns [`RideError::DegenerateRide`] naming the first zero denominator
/// (actual distance, actual time, or in-ride time).
///
/// # Example
///
/// ```rust
/// use ride_metrics::{OptimalRoute, TripMetrics, assemble};
///
/// let trip = TripMetrics {
///     route_id: "42".to_string(),
///     actual_distance_m: 1200.0,
///     actual_time_s: 300.0,
///     dwell_time_s: 60.0,
///     toward_destination_time_s: 180.0,
///     in_ride_time_s: 240.0,
///     stop_count: 1,
/// };
///
/// let enriched = assemble(trip, OptimalRoute { duration_s: 240, distance_m: 1000 }).unwrap();
/// assert_eq!(enriched.stops_bool, 1);
/// assert!((enriched.time_ratio - 0.8).abs() < 1e-9);
/// assert!((enriched.todest_ratio - 0.75).abs() < 1e-9);
/// ```
pub fn assemble(trip: TripMetrics, route: OptimalRoute) -> Result<EnrichedMetrics, RideError> {
    check_denominators(&trip)?;
    let actual_distance = trip.actual_distance_m;
    let actual_time = trip.actual_time_s;
    let in_ride_time = trip.in_ride_time_s;

    let optimal_time_s = route.duration_s as f64;
    let optimal_distance_m = route.distance_m as f64;

    Ok(EnrichedMetrics {
        optimal_time_s,
        optimal_distance_m,
        stops_bool: u8::from(trip.stop_count > 0),
        dist_ratio: optimal_distance_m / actual_distance,
        time_ratio: optimal_time_s / actual_time,
        dwell_ratio: trip.dwell_time_s / actual_time,
        todest_ratio: trip.toward_destination_time_s / in_ride_time,
        inride_speed_mph: MPS_TO_MPH * (actual_distance / in_ride_time),
        trip,
    })
}

/// Fail if any ratio denominator of `trip` is not strictly positive.
///
/// Negative in-ride time is as unusable as zero.
pub(crate) fn check_denominators(trip: &TripMetrics) -> Result<(), RideError> {
    let denominators = [
        ("actual_distance_m", trip.actual_distance_m),
        ("actual_time_s", trip.actual_time_s),
        ("in_ride_time_s", trip.in_ride_time_s),
    ];
    match denominators.into_iter().find(|(_, value)| !(*value > 0.0)) {
        Some((quantity, _)) => Err(RideError::DegenerateRide { quantity }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn sample_trip() -> TripMetrics {
        TripMetrics {
            route_id: "7".to_string(),
            actual_distance_m: 150.0,
            actual_time_s: 60.0,
            dwell_time_s: 15.0,
            toward_destination_time_s: 30.0,
            in_ride_time_s: 45.0,
            stop_count: 0,
        }
    }

    #[test]
    fn test_derived_ratios() {
        let route = OptimalRoute { duration_s: 30, distance_m: 120 };
        let enriched = assemble(sample_trip(), route).unwrap();

        assert_eq!(enriched.stops_bool, 0);
        assert_eq!(enriched.optimal_time_s, 30.0);
        assert_eq!(enriched.optimal_distance_m, 120.0);
        assert!(approx_eq(enriched.dist_ratio, 0.8, 1e-12));
        assert!(approx_eq(enriched.time_ratio, 0.5, 1e-12));
        assert!(approx_eq(enriched.dwell_ratio, 0.25, 1e-12));
        assert!(approx_eq(enriched.todest_ratio, 30.0 / 45.0, 1e-12));
        assert!(approx_eq(enriched.inride_speed_mph, 2.23694 * 150.0 / 45.0, 1e-9));
        assert_eq!(enriched.trip, sample_trip());
    }

    #[test]
    fn test_stops_bool() {
        let route = OptimalRoute { duration_s: 30, distance_m: 120 };
        let trip = TripMetrics { stop_count: 3, ..sample_trip() };
        assert_eq!(assemble(trip, route).unwrap().stops_bool, 1);

        // An unclamped -1 still means "no stops"
        let trip = TripMetrics { stop_count: -1, ..sample_trip() };
        assert_eq!(assemble(trip, route).unwrap().stops_bool, 0);
    }

    #[test]
    fn test_zero_distance_is_degenerate() {
        let trip = TripMetrics { actual_distance_m: 0.0, ..sample_trip() };
        let result = assemble(trip, OptimalRoute { duration_s: 1, distance_m: 1 });
        assert!(matches!(
            result,
            Err(RideError::DegenerateRide { quantity: "actual_distance_m" })
        ));
    }

    #[test]
    fn test_zero_in_ride_time_is_degenerate() {
        let trip = TripMetrics {
            dwell_time_s: 60.0,
            in_ride_time_s: 0.0,
            ..sample_trip()
        };
        let result = assemble(trip, OptimalRoute { duration_s: 1, distance_m: 1 });
        assert!(matches!(
            result,
            Err(RideError::DegenerateRide { quantity: "in_ride_time_s" })
        ));
    }

    #[test]
    fn test_zero_actual_time_is_degenerate() {
        let trip = TripMetrics { actual_time_s: 0.0, ..sample_trip() };
        let result = assemble(trip, OptimalRoute { duration_s: 1, distance_m: 1 });
        assert!(matches!(
            result,
            Err(RideError::DegenerateRide { quantity: "actual_time_s" })
        ));
    }

    #[test]
    fn test_ratios_are_finite() {
        let enriched = assemble(sample_trip(), OptimalRoute { duration_s: 0, distance_m: 0 }).unwrap();
        assert!(enriched.dist_ratio.is_finite());
        assert!(enriched.time_ratio.is_finite());
        assert!(enriched.inride_speed_mph.is_finite());
    }
}
