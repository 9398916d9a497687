//! Extract the feature table for a few synthetic rides.
//!
//! Run with: cargo run --example ride_features

use ride_metrics::{
    process_rides, CachedRouteProvider, GpsPoint, MetricsConfig, OptimalRoute, RawPoint, Ride,
    RideError,
};

/// Build a ride heading north-east with the given step sizes in degrees.
fn synthetic_ride(route_id: &str, steps: &[f64]) -> Ride {
    let mut lat = 40.7128;
    let mut lng = -74.0060;
    let mut points = vec![RawPoint::new(lat, lng, 0, "bike")];
    for (i, step) in steps.iter().enumerate() {
        lat += step;
        lng += step * 0.5;
        points.push(RawPoint::new(lat, lng, i as u32 + 1, "bike"));
    }
    Ride::new(route_id, points)
}

/// Stand-in for the directions service: 4.5 m/s along the straight line.
fn straight_line_router(start: GpsPoint, end: GpsPoint) -> Result<OptimalRoute, RideError> {
    let meters = ride_metrics::geo_utils::haversine_distance(&start, &end)?;
    Ok(OptimalRoute {
        duration_s: (meters / 4.5).round() as u32,
        distance_m: meters.round() as u32,
    })
}

fn main() {
    let rides = vec![
        // Steady commute
        synthetic_ride("route-1", &[0.0008; 12]),
        // Stops at a light halfway, then leaves the bike unlocked
        synthetic_ride(
            "route-2",
            &[0.0008, 0.0008, 0.0008, 0.00001, 0.00001, 0.0008, 0.0008, 0.0008, 0.00001, 0.00001, 0.00001],
        ),
        // Never moved
        synthetic_ride("route-3", &[0.00001; 5]),
    ];

    let config = MetricsConfig::default();
    let router = CachedRouteProvider::new(straight_line_router);

    println!("Ride Feature Extraction\n");
    println!(
        "Config: stationary={}m, movement={}m, interval={}s\n",
        config.stationary_threshold_m, config.movement_threshold_m, config.sample_interval_s
    );

    let report = process_rides(&rides, &router, &config);

    for record in report.records() {
        println!("{}:", record.route_id);
        println!("   Distance: {:.0}m actual / {:.0}m optimal", record.actu_dist, record.opt_dist);
        println!("   Time: {:.0}s actual / {:.0}s optimal", record.actu_time, record.opt_time);
        println!("   Dwell: {:.0}s, in ride: {:.0}s, stops: {}", record.dwell_time, record.inride_time, record.num_stops);
        println!("   Towards destination: {:.0}%", record.todest_ratio * 100.0);
        println!("   In-ride speed: {:.1} mph\n", record.inride_mph);
    }

    for failure in &report.failures {
        println!("{} skipped: {}", failure.route_id, failure.error);
    }
}
